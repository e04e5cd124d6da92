// # OAuth2 Tokens
//
// The bearer token used for every dns-master call, plus the persistence
// callback fired whenever the client obtains a new one.
//
// ## Persistence
//
// The client keeps its token in memory only. Durability is delegated to a
// [`TokenUpdater`], invoked synchronously after every acquisition and refresh
// with the complete token payload. Two ready-made updaters are provided:
//
// - [`MemoryTokenStore`]: keeps the last token, for embedding and tests
// - [`FileTokenStore`]: JSON file with atomic writes and backup recovery
//
// Any `Fn(&Token) + Send + Sync` closure is an updater as well.

pub mod file;
pub mod memory;

pub use file::FileTokenStore;
pub use memory::MemoryTokenStore;

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// An OAuth2 access token with its refresh token and expiry
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Lifetime in seconds as reported by the token endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    /// Absolute expiry computed when the token was received
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl Token {
    /// Create a bearer token without expiry
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: default_token_type(),
            refresh_token: None,
            expires_in: None,
            expires_at: None,
            scope: None,
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Set the lifetime, counted from now
    ///
    /// A lifetime too large to represent as a date leaves `expires_at` unset.
    pub fn with_expires_in(mut self, seconds: u64) -> Self {
        self.expires_in = Some(seconds);
        self.expires_at = i64::try_from(seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime));
        self
    }

    /// Set the absolute expiry
    pub fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Whether the token expires within `leeway`
    ///
    /// Tokens without a known expiry never expire locally; the server will
    /// reject them once they are stale.
    pub fn is_expired(&self, leeway: Duration) -> bool {
        self.expires_at.is_some_and(|expires_at| {
            expires_at
                .checked_sub_signed(leeway)
                .is_none_or(|deadline| deadline <= Utc::now())
        })
    }

    pub fn has_refresh_token(&self) -> bool {
        self.refresh_token.is_some()
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "<redacted>"),
            )
            .field("expires_in", &self.expires_in)
            .field("expires_at", &self.expires_at)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Callback notified with the full token after every change
///
/// Called synchronously from the request path; implementations should not
/// block for long.
pub trait TokenUpdater: Send + Sync {
    fn token_updated(&self, token: &Token);
}

impl<F> TokenUpdater for F
where
    F: Fn(&Token) + Send + Sync,
{
    fn token_updated(&self, token: &Token) {
        self(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_with_leeway() {
        let token = Token::new("abc").with_expires_in(3600);
        assert!(!token.is_expired(Duration::seconds(30)));
        assert!(token.is_expired(Duration::seconds(3600)));

        let stale = Token::new("abc").with_expires_at(Utc::now() - Duration::seconds(1));
        assert!(stale.is_expired(Duration::zero()));

        assert!(!Token::new("forever").is_expired(Duration::seconds(30)));
    }

    #[test]
    fn test_unrepresentable_lifetime_has_no_expiry() {
        for seconds in [100_000_000_000_000_000, u64::MAX, 9_000_000_000_000] {
            let token = Token::new("abc").with_expires_in(seconds);
            assert_eq!(token.expires_in, Some(seconds));
            assert_eq!(token.expires_at, None);
            assert!(!token.is_expired(Duration::seconds(30)));
        }
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let token = Token::new("secret-access").with_refresh_token("secret-refresh");
        let debug = format!("{token:?}");
        assert!(!debug.contains("secret-access"));
        assert!(!debug.contains("secret-refresh"));
        assert!(debug.contains("Bearer"));
    }

    #[test]
    fn test_deserialize_token_endpoint_shape() {
        let token: Token =
            serde_json::from_str(r#"{"access_token":"a","expires_in":14400}"#).unwrap();
        assert_eq!(token.token_type, "Bearer");
        assert_eq!(token.expires_in, Some(14400));
        assert_eq!(token.refresh_token, None);
    }

    #[test]
    fn test_closure_is_updater() {
        let seen = std::sync::Mutex::new(Vec::new());
        let updater = |token: &Token| seen.lock().unwrap().push(token.access_token.clone());

        updater.token_updated(&Token::new("one"));
        updater.token_updated(&Token::new("two"));
        assert_eq!(*seen.lock().unwrap(), vec!["one", "two"]);
    }
}
