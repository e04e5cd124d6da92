// # HTTP Transport Trait
//
// The seam between the client logic and the HTTP stack.
//
// ## Implementations
//
// - reqwest: `ReqwestTransport` in the `nicdns-client` crate
// - Test doubles: scripted transports in the client's contract tests
//
// A transport performs exactly one exchange per call and reports the status
// code and body text as received. Non-2xx statuses are NOT errors at this
// level; callers decide what a status means. Only failures to complete the
// exchange (connect, timeout, body read) are reported as `Error::Http`.
//
// ## Usage
//
// ```rust,ignore
// use nicdns_core::traits::{ApiRequest, Method, Transport};
//
// let response = transport
//     .execute(ApiRequest::new(Method::Get, "https://api.nic.ru/dns-master/services")
//         .with_bearer_token("..."))
//     .await?;
// assert!(response.is_success());
// ```

use std::fmt;

use async_trait::async_trait;

/// HTTP methods used by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request payload
#[derive(Clone, PartialEq, Eq)]
pub enum RequestBody {
    Empty,
    /// UTF-8 XML document
    Xml(String),
    /// `application/x-www-form-urlencoded` parameters
    Form(Vec<(String, String)>),
}

// Form bodies carry passwords and client secrets.
impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestBody::Empty => f.write_str("Empty"),
            RequestBody::Xml(xml) => f.debug_tuple("Xml").field(xml).finish(),
            RequestBody::Form(params) => f
                .debug_list()
                .entries(params.iter().map(|(key, _)| key))
                .finish(),
        }
    }
}

/// A single HTTP request
#[derive(Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub bearer_token: Option<String>,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            bearer_token: None,
            body: RequestBody::Empty,
        }
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn with_xml(mut self, xml: impl Into<String>) -> Self {
        self.body = RequestBody::Xml(xml.into());
        self
    }

    pub fn with_form(mut self, params: Vec<(String, String)>) -> Self {
        self.body = RequestBody::Form(params);
        self
    }

    /// Value of a form parameter, if the body is a form
    pub fn form_param(&self, key: &str) -> Option<&str> {
        match &self.body {
            RequestBody::Form(params) => params
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }
}

impl fmt::Debug for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field(
                "bearer_token",
                &self.bearer_token.as_ref().map(|_| "<redacted>"),
            )
            .field("body", &self.body)
            .finish()
    }
}

/// Status code and body text of a completed exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// 2xx status
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for HTTP transports
///
/// # Thread Safety
///
/// Implementations are shared between concurrent API calls and must be
/// usable from several tasks at once.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one HTTP exchange
    ///
    /// # Returns
    ///
    /// - `Ok(ApiResponse)`: the exchange completed, whatever the status code
    /// - `Err(Error::Http)`: the request could not be sent or the response
    ///   could not be read
    async fn execute(&self, request: ApiRequest) -> crate::Result<ApiResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_credentials() {
        let request = ApiRequest::new(Method::Post, "https://api.nic.ru/oauth/token")
            .with_bearer_token("bearer-secret")
            .with_form(vec![
                ("username".to_string(), "user".to_string()),
                ("password".to_string(), "hunter2".to_string()),
            ]);

        let debug = format!("{request:?}");
        assert!(!debug.contains("bearer-secret"));
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("password"));
        assert_eq!(request.form_param("password"), Some("hunter2"));
    }

    #[test]
    fn test_success_range() {
        assert!(ApiResponse::new(200, "").is_success());
        assert!(ApiResponse::new(204, "").is_success());
        assert!(!ApiResponse::new(301, "").is_success());
        assert!(!ApiResponse::new(401, "").is_success());
    }
}
