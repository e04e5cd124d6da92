// # Token Manager
//
// Owns the OAuth2 token of a client session.
//
// ## Lifecycle
//
// - Acquisition: password grant with the account credentials
// - Refresh: refresh grant once the access token expires (30s leeway); a
//   rejected refresh token falls back to the password grant when
//   credentials are configured
// - Transparent start: without a token, the first call runs the password
//   grant when credentials are configured
// - Rejection: a token the server refuses with HTTP 401 is renewed once
//
// ## Concurrency
//
// Renewals are single-flight. The first caller that finds the token stale
// takes `refresh_lock`; concurrent callers wait on it and then find the fresh
// token on their re-check instead of starting a second exchange.
//
// The token is stored and the updater notified only after the HTTP exchange
// has completed, with no suspension point in between. Dropping a call while
// a renewal is in flight leaves the previous token in place and the updater
// untouched.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::Duration;
use nicdns_core::traits::{ApiRequest, ApiResponse, Method, Transport};
use nicdns_core::{ClientConfig, Error, Result, Token, TokenUpdater};
use serde::Deserialize;
use tokio::sync::Mutex;

/// Seconds before expiry at which a token is considered stale
const TOKEN_EXPIRY_LEEWAY_SECS: i64 = 30;

/// Successful token endpoint response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    scope: Option<String>,
}

impl From<TokenResponse> for Token {
    fn from(response: TokenResponse) -> Self {
        let mut token = Token::new(response.access_token);
        if let Some(token_type) = response.token_type {
            token.token_type = token_type;
        }
        if let Some(expires_in) = response.expires_in {
            token = token.with_expires_in(expires_in);
        }
        token.refresh_token = response.refresh_token;
        token.scope = response.scope;
        token
    }
}

/// OAuth2 error response (RFC 6749 §5.2)
#[derive(Debug, Deserialize)]
struct OAuthErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

impl OAuthErrorResponse {
    fn into_error(self) -> Error {
        match self.error_description {
            Some(description) => Error::auth(format!("{}: {}", self.error, description)),
            None => Error::auth(self.error),
        }
    }
}

/// OAuth2 token owner for one client session
pub struct TokenManager {
    transport: Arc<dyn Transport>,
    token_url: String,
    client_id: String,
    client_secret: String,
    scope: Option<String>,
    offline_secs: u64,
    credentials: Option<(String, String)>,
    token: RwLock<Option<Token>>,
    refresh_lock: Mutex<()>,
    updater: Option<Arc<dyn TokenUpdater>>,
}

// Secrets and tokens stay out of Debug output
impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("scope", &self.scope)
            .field("offline_secs", &self.offline_secs)
            .field("has_credentials", &self.credentials.is_some())
            .field("has_token", &self.read_token().is_some())
            .field("has_updater", &self.updater.is_some())
            .finish()
    }
}

impl TokenManager {
    /// Create a manager for `config`, optionally seeded with a saved token
    pub fn new(
        config: &ClientConfig,
        transport: Arc<dyn Transport>,
        token: Option<Token>,
        updater: Option<Arc<dyn TokenUpdater>>,
    ) -> Self {
        Self {
            transport,
            token_url: config.token_url(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            scope: config.scope.clone(),
            offline_secs: config.offline_secs,
            credentials: config
                .credentials()
                .map(|(username, password)| (username.to_string(), password.to_string())),
            token: RwLock::new(token),
            refresh_lock: Mutex::new(()),
            updater,
        }
    }

    /// Snapshot of the current token
    pub fn token(&self) -> Option<Token> {
        self.read_token().clone()
    }

    /// A valid access token, renewing the stored one if needed
    pub async fn access_token(&self) -> Result<String> {
        if let Some(access_token) = self.usable_access_token() {
            return Ok(access_token);
        }

        let _guard = self.refresh_lock.lock().await;

        // Another caller may have renewed while we waited
        if let Some(access_token) = self.usable_access_token() {
            return Ok(access_token);
        }

        let token = self.renew().await?;
        Ok(token.access_token)
    }

    /// Run the password grant and store the resulting token
    pub async fn acquire_token(&self, username: &str, password: &str) -> Result<Token> {
        let _guard = self.refresh_lock.lock().await;
        self.password_grant(username, password).await
    }

    /// Renew after the server rejected `rejected_access_token`
    ///
    /// If another caller already replaced the rejected token, the replacement
    /// is returned without a new exchange.
    pub async fn renew_rejected(&self, rejected_access_token: &str) -> Result<String> {
        let _guard = self.refresh_lock.lock().await;

        if let Some(access_token) = self.usable_access_token() {
            if access_token != rejected_access_token {
                return Ok(access_token);
            }
        }

        tracing::debug!("Access token was rejected by the server, renewing");
        let token = self.renew().await?;
        Ok(token.access_token)
    }

    /// Must be called with `refresh_lock` held
    async fn renew(&self) -> Result<Token> {
        let refresh_token = self
            .read_token()
            .as_ref()
            .and_then(|token| token.refresh_token.clone());

        if let Some(refresh_token) = refresh_token {
            match self.refresh_grant(&refresh_token).await {
                Ok(token) => return Ok(token),
                // Refresh token expired (`offline` elapsed) or was revoked
                Err(Error::Authentication(reason)) if self.credentials.is_some() => {
                    tracing::warn!(
                        "Refresh token was rejected ({}), falling back to password grant",
                        reason
                    );
                }
                Err(e) => return Err(e),
            }
        }

        match &self.credentials {
            Some((username, password)) => self.password_grant(username, password).await,
            None => Err(Error::auth(
                "No valid token and no username/password configured",
            )),
        }
    }

    async fn password_grant(&self, username: &str, password: &str) -> Result<Token> {
        tracing::debug!("Requesting access token (password grant) for user {}", username);

        let mut params = vec![
            ("grant_type".to_string(), "password".to_string()),
            ("username".to_string(), username.to_string()),
            ("password".to_string(), password.to_string()),
        ];
        params.extend(self.client_params());
        if let Some(scope) = &self.scope {
            params.push(("scope".to_string(), scope.clone()));
        }

        let token = self.request_token(params).await?;
        self.store(token.clone());

        tracing::info!(
            "Acquired access token (expires in {})",
            describe_lifetime(&token)
        );
        Ok(token)
    }

    async fn refresh_grant(&self, refresh_token: &str) -> Result<Token> {
        tracing::debug!("Refreshing access token");

        let mut params = vec![
            ("grant_type".to_string(), "refresh_token".to_string()),
            ("refresh_token".to_string(), refresh_token.to_string()),
        ];
        params.extend(self.client_params());

        let mut token = self.request_token(params).await?;
        if token.refresh_token.is_none() {
            token.refresh_token = Some(refresh_token.to_string());
        }
        self.store(token.clone());

        tracing::info!(
            "Refreshed access token (expires in {})",
            describe_lifetime(&token)
        );
        Ok(token)
    }

    fn client_params(&self) -> Vec<(String, String)> {
        vec![
            ("client_id".to_string(), self.client_id.clone()),
            ("client_secret".to_string(), self.client_secret.clone()),
            ("offline".to_string(), self.offline_secs.to_string()),
        ]
    }

    async fn request_token(&self, params: Vec<(String, String)>) -> Result<Token> {
        let request = ApiRequest::new(Method::Post, &self.token_url).with_form(params);
        let response = self.transport.execute(request).await?;
        parse_token_response(response)
    }

    /// Replace the token, then notify the updater
    fn store(&self, token: Token) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token.clone());
        if let Some(updater) = &self.updater {
            updater.token_updated(&token);
        }
    }

    fn usable_access_token(&self) -> Option<String> {
        self.read_token()
            .as_ref()
            .filter(|token| !token.is_expired(Duration::seconds(TOKEN_EXPIRY_LEEWAY_SECS)))
            .map(|token| token.access_token.clone())
    }

    fn read_token(&self) -> std::sync::RwLockReadGuard<'_, Option<Token>> {
        self.token.read().unwrap_or_else(PoisonError::into_inner)
    }
}

fn parse_token_response(response: ApiResponse) -> Result<Token> {
    if let Ok(oauth_error) = serde_json::from_str::<OAuthErrorResponse>(&response.body) {
        return Err(oauth_error.into_error());
    }

    if !response.is_success() {
        return Err(Error::transport(response.status, response.body));
    }

    let parsed: TokenResponse = serde_json::from_str(&response.body)
        .map_err(|e| Error::auth(format!("Invalid token endpoint response: {e}")))?;
    Ok(parsed.into())
}

fn describe_lifetime(token: &Token) -> String {
    match token.expires_in {
        Some(seconds) => format!("{seconds}s"),
        None => "unknown time".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_token_response() {
        let token = parse_token_response(ApiResponse::new(
            200,
            r#"{"access_token":"abc","token_type":"Bearer","expires_in":14400,"refresh_token":"r"}"#,
        ))
        .unwrap();

        assert_eq!(token.access_token, "abc");
        assert_eq!(token.refresh_token.as_deref(), Some("r"));
        assert_eq!(token.expires_in, Some(14400));
        assert!(token.expires_at.is_some());
    }

    #[test]
    fn test_oauth_error_is_authentication_error() {
        let result = parse_token_response(ApiResponse::new(
            400,
            r#"{"error":"invalid_grant","error_description":"Bad credentials"}"#,
        ));
        match result {
            Err(Error::Authentication(msg)) => {
                assert_eq!(msg, "invalid_grant: Bad credentials");
            }
            other => panic!("expected Authentication error, got {other:?}"),
        }
    }

    #[test]
    fn test_non_oauth_failure_is_transport_error() {
        let result = parse_token_response(ApiResponse::new(502, "<html>Bad gateway</html>"));
        match result {
            Err(Error::Transport { status, body }) => {
                assert_eq!(status, 502);
                assert!(body.contains("Bad gateway"));
            }
            other => panic!("expected Transport error, got {other:?}"),
        }
    }

    #[test]
    fn test_huge_expires_in_is_accepted() {
        let token = parse_token_response(ApiResponse::new(
            200,
            r#"{"access_token":"abc","token_type":"Bearer","expires_in":100000000000000000}"#,
        ))
        .unwrap();

        assert_eq!(token.expires_in, Some(100_000_000_000_000_000));
        assert_eq!(token.expires_at, None);
    }

    #[test]
    fn test_garbage_success_body_is_authentication_error() {
        let result = parse_token_response(ApiResponse::new(200, "not json"));
        assert!(matches!(result, Err(Error::Authentication(_))));
    }
}
