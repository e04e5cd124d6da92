// # reqwest Transport
//
// Production `Transport` implementation on top of `reqwest`.
//
// - One `reqwest::Client` per transport, reused for every exchange
// - The configured timeout applies to every request
// - XML bodies are sent as `text/xml; charset=utf-8`
// - Form bodies are sent as `application/x-www-form-urlencoded`
// - Bearer tokens and form values NEVER appear in logs

use std::time::Duration;

use async_trait::async_trait;
use nicdns_core::traits::{ApiRequest, ApiResponse, Method, RequestBody, Transport};
use nicdns_core::{Error, Result};

const XML_CONTENT_TYPE: &str = "text/xml; charset=utf-8";

/// HTTP transport backed by `reqwest`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport whose requests time out after `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Wrap an existing client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
        tracing::trace!("{} {}", request.method, request.url);

        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), &request.url);

        if let Some(token) = &request.bearer_token {
            builder = builder.bearer_auth(token);
        }

        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Xml(xml) => builder
                .header(reqwest::header::CONTENT_TYPE, XML_CONTENT_TYPE)
                .body(xml),
            RequestBody::Form(params) => builder.form(&params),
        };

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::http(format!("{} {} timed out", request.method, request.url))
            } else {
                Error::http(format!("HTTP request failed: {e}"))
            }
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Error::http(format!("Failed to read response body: {e}")))?;

        tracing::trace!("{} {} -> HTTP {}", request.method, request.url, status);
        Ok(ApiResponse { status, body })
    }
}
