//! Test doubles and common utilities for client contract tests
//!
//! [`MockTransport`] plays both the token endpoint and the dns-master API.
//! It records every request and counts token exchanges so tests can assert
//! how many round trips an operation caused.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use nicdns_client::NicApi;
use nicdns_core::error::Result;
use nicdns_core::traits::{ApiRequest, ApiResponse, Method, Transport};
use nicdns_core::{ClientConfig, Token};

pub const BASE_URL: &str = "http://nic.test";
pub const SERVICE: &str = "MY-SERVICE";
pub const ZONE: &str = "example.ru";

/// Scripted transport standing in for the nic.ru servers
#[derive(Default)]
pub struct MockTransport {
    requests: Mutex<Vec<ApiRequest>>,
    routes: Mutex<HashMap<(Method, String), VecDeque<ApiResponse>>>,
    rejected_tokens: Mutex<HashSet<String>>,
    token_calls: AtomicUsize,
    token_expires_in: AtomicU64,
    token_delay: Mutex<Option<Duration>>,
    token_error: Mutex<Option<ApiResponse>>,
    refresh_error: Mutex<Option<ApiResponse>>,
    token_pending: AtomicBool,
    omit_refresh_token: AtomicBool,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        let transport = Self::default();
        transport.token_expires_in.store(3600, Ordering::SeqCst);
        Arc::new(transport)
    }

    /// Answer `method path` with `status` and `body`
    ///
    /// Several responses for the same route are served in order; the last
    /// one is repeated.
    pub fn route(&self, method: Method, path: &str, status: u16, body: impl Into<String>) {
        self.routes
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(ApiResponse::new(status, body));
    }

    /// Answer requests carrying `access_token` with HTTP 401
    pub fn reject_token(&self, access_token: &str) {
        self.rejected_tokens
            .lock()
            .unwrap()
            .insert(access_token.to_string());
    }

    /// Delay every token exchange
    pub fn set_token_delay(&self, delay: Duration) {
        *self.token_delay.lock().unwrap() = Some(delay);
    }

    /// Make every token exchange fail with `status` and `body`
    pub fn set_token_error(&self, status: u16, body: &str) {
        *self.token_error.lock().unwrap() = Some(ApiResponse::new(status, body));
    }

    /// Make refresh grants fail with `status` and `body`; password grants
    /// still succeed
    pub fn set_refresh_error(&self, status: u16, body: &str) {
        *self.refresh_error.lock().unwrap() = Some(ApiResponse::new(status, body));
    }

    /// Token exchanges never complete
    pub fn set_token_pending(&self, pending: bool) {
        self.token_pending.store(pending, Ordering::SeqCst);
    }

    /// Token responses carry no refresh token
    pub fn set_omit_refresh_token(&self, omit: bool) {
        self.omit_refresh_token.store(omit, Ordering::SeqCst);
    }

    /// Number of token endpoint exchanges started
    pub fn token_calls(&self) -> usize {
        self.token_calls.load(Ordering::SeqCst)
    }

    /// Every request seen, in order
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests sent to the token endpoint
    pub fn token_requests(&self) -> Vec<ApiRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.url.ends_with("/oauth/token"))
            .collect()
    }

    /// Requests sent to the dns-master API
    pub fn api_requests(&self) -> Vec<ApiRequest> {
        self.requests()
            .into_iter()
            .filter(|request| !request.url.ends_with("/oauth/token"))
            .collect()
    }

    fn token_response(&self, call: usize) -> ApiResponse {
        let mut body = serde_json::json!({
            "access_token": format!("access-{call}"),
            "token_type": "Bearer",
            "expires_in": self.token_expires_in.load(Ordering::SeqCst),
        });
        if !self.omit_refresh_token.load(Ordering::SeqCst) {
            body["refresh_token"] = serde_json::json!(format!("refresh-{call}"));
        }
        ApiResponse::new(200, body.to_string())
    }

    fn api_response(&self, request: &ApiRequest) -> ApiResponse {
        if let Some(token) = &request.bearer_token {
            if self.rejected_tokens.lock().unwrap().contains(token) {
                return ApiResponse::new(401, "Unauthorized");
            }
        }

        let path = request
            .url
            .strip_prefix(BASE_URL)
            .unwrap_or(&request.url)
            .to_string();
        let mut routes = self.routes.lock().unwrap();
        match routes.get_mut(&(request.method, path)) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap(),
            None => ApiResponse::new(404, "Not Found"),
        }
    }
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
        self.requests.lock().unwrap().push(request.clone());

        if !request.url.ends_with("/oauth/token") {
            return Ok(self.api_response(&request));
        }

        let call = self.token_calls.fetch_add(1, Ordering::SeqCst) + 1;

        if self.token_pending.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }

        let delay = *self.token_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if request.form_param("grant_type") == Some("refresh_token") {
            if let Some(error) = self.refresh_error.lock().unwrap().clone() {
                return Ok(error);
            }
        }

        let error = self.token_error.lock().unwrap().clone();
        Ok(error.unwrap_or_else(|| self.token_response(call)))
    }
}

/// Configuration pointing at [`BASE_URL`] with credentials and defaults
pub fn config() -> ClientConfig {
    ClientConfig::new("app-id", "app-secret")
        .with_base_url(BASE_URL)
        .with_credentials("123/NIC-D", "password")
        .with_default_service(SERVICE)
        .with_default_zone(ZONE)
}

/// Client on `transport` with [`config`]
pub fn api(transport: &Arc<MockTransport>) -> NicApi {
    NicApi::with_transport(config(), transport.clone()).unwrap()
}

/// A token that is still valid for an hour
pub fn valid_token(access_token: &str) -> Token {
    Token::new(access_token)
        .with_refresh_token("refresh-0")
        .with_expires_in(3600)
}

/// A token that expired an hour ago
pub fn expired_token() -> Token {
    Token::new("stale")
        .with_refresh_token("refresh-0")
        .with_expires_at(Utc::now() - chrono::Duration::hours(1))
}

/// Successful envelope wrapping `data`
pub fn success(data: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" ?>
<response>
    <status>success</status>
    <data>
        {data}
    </data>
</response>"#
    )
}

/// Successful envelope without `<data>`
pub fn success_without_data() -> String {
    r#"<?xml version="1.0" encoding="UTF-8" ?><response><status>success</status></response>"#
        .to_string()
}

/// Failed envelope with `(code, message)` errors
pub fn failure(errors: &[(&str, &str)]) -> String {
    let errors: String = errors
        .iter()
        .map(|(code, message)| format!(r#"<error code="{code}">{message}</error>"#))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" ?><response><status>fail</status><errors>{errors}</errors></response>"#
    )
}

/// `<zone>` element as returned by the records listing
pub fn zone_data(zone: &str, records: &str) -> String {
    format!(
        r#"<zone admin="123/NIC-REG" enable="true" has-changes="false"
            has-primary="true" id="227642" idn-name="{zone}" name="{zone}"
            payer="123/NIC-REG" service="{SERVICE}">
            {records}
        </zone>"#
    )
}

/// API path under the dns-master prefix
pub fn api_path(rpath: &str) -> String {
    format!("/dns-master{rpath}")
}

/// Records path of the default zone
pub fn records_path() -> String {
    api_path(&format!("/services/{SERVICE}/zones/{ZONE}/records"))
}

pub const RECORD_SOA: &str = r#"
        <rr id="210074">
            <name>@</name>
            <idn-name>@</idn-name>
            <type>SOA</type>
            <soa>
                <mname>
                    <name>ns3-l2.nic.ru.</name>
                    <idn-name>ns3-l2.nic.ru.</idn-name>
                </mname>
                <rname>
                    <name>dns.nic.ru.</name>
                    <idn-name>dns.nic.ru.</idn-name>
                </rname>
                <serial>2011112002</serial>
                <refresh>1440</refresh>
                <retry>3600</retry>
                <expire>2592000</expire>
                <minimum>600</minimum>
            </soa>
        </rr>"#;

pub const RECORD_A: &str = r#"
        <rr id="210075">
            <name>www</name>
            <idn-name>www</idn-name>
            <ttl>3600</ttl>
            <type>A</type>
            <a>192.0.2.10</a>
        </rr>"#;

pub const RECORD_MX: &str = r#"
        <rr id="210076">
            <name>@</name>
            <idn-name>@</idn-name>
            <type>MX</type>
            <mx>
                <preference>10</preference>
                <exchange><name>mail.example.ru.</name></exchange>
            </mx>
        </rr>"#;

pub const RECORD_TXT: &str = r#"
        <rr id="210077">
            <name>@</name>
            <idn-name>@</idn-name>
            <ttl>300</ttl>
            <type>TXT</type>
            <txt><string>v=spf1 -all</string></txt>
        </rr>"#;
