//! Configuration types for the nic.ru DNS client
//!
//! [`ClientConfig`] carries the OAuth2 application credentials, the account
//! credentials used for the password grant, the API location and the
//! default service/zone applied when an operation does not name one.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default API location
pub const DEFAULT_BASE_URL: &str = "https://api.nic.ru";

/// Client configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// OAuth2 application id
    pub client_id: String,

    /// OAuth2 application secret
    pub client_secret: String,

    /// Account login for the password grant
    #[serde(default)]
    pub username: Option<String>,

    /// Account password for the password grant
    #[serde(default)]
    pub password: Option<String>,

    /// Requested OAuth2 scope (e.g. `.+:/dns-master/.+`)
    #[serde(default)]
    pub scope: Option<String>,

    /// API base URL, without trailing slash
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Service used when an operation names none
    #[serde(default)]
    pub default_service: Option<String>,

    /// Zone used when an operation names none
    #[serde(default)]
    pub default_zone: Option<String>,

    /// Timeout applied to every outbound request (in seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Requested refresh token lifetime (in seconds)
    #[serde(default = "default_offline_secs")]
    pub offline_secs: u64,
}

impl ClientConfig {
    /// Create a configuration with the given application credentials
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            username: None,
            password: None,
            scope: None,
            base_url: default_base_url(),
            default_service: None,
            default_zone: None,
            timeout_secs: default_timeout_secs(),
            offline_secs: default_offline_secs(),
        }
    }

    /// Set the account credentials
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_default_service(mut self, service: impl Into<String>) -> Self {
        self.default_service = Some(service.into());
        self
    }

    pub fn with_default_zone(mut self, zone: impl Into<String>) -> Self {
        self.default_zone = Some(zone.into());
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_offline_secs(mut self, offline_secs: u64) -> Self {
        self.offline_secs = offline_secs;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.client_id.is_empty() {
            return Err(crate::Error::config("OAuth client_id cannot be empty"));
        }
        if self.client_secret.is_empty() {
            return Err(crate::Error::config("OAuth client_secret cannot be empty"));
        }
        if self.username.is_some() != self.password.is_some() {
            return Err(crate::Error::config(
                "username and password must be given together",
            ));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(crate::Error::config(format!(
                "base_url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("timeout_secs must be > 0"));
        }
        Ok(())
    }

    /// Account credentials, when both are configured
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some((username.as_str(), password.as_str())),
            _ => None,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// OAuth2 token endpoint
    pub fn token_url(&self) -> String {
        format!("{}/oauth/token", self.base_url.trim_end_matches('/'))
    }

    /// dns-master endpoint for a relative path such as `/services`
    pub fn api_url(&self, rpath: &str) -> String {
        format!("{}/dns-master{rpath}", self.base_url.trim_end_matches('/'))
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("scope", &self.scope)
            .field("base_url", &self.base_url)
            .field("default_service", &self.default_service)
            .field("default_zone", &self.default_zone)
            .field("timeout_secs", &self.timeout_secs)
            .field("offline_secs", &self.offline_secs)
            .finish()
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    600
}

fn default_offline_secs() -> u64 {
    3600
}
