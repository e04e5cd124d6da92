// # nic.ru dns-master Client
//
// Async client for the nic.ru DNS management API.
//
// ## Request Path
//
// Every operation follows the same path:
//
// 1. Resolve service and zone (explicit argument, else the configured
//    default, else an empty path segment so the server reports the problem)
// 2. Obtain a valid bearer token from the [`TokenManager`], acquiring or
//    refreshing it when needed
// 3. Execute the request through the [`Transport`]
// 4. On HTTP 401, renew the token once and repeat the request
// 5. Parse the XML envelope; a non-success status becomes `Error::Api`
// 6. Decode `<data>` into typed results
//
// The zone file download bypasses step 5: its body is plain text.
//
// ## Security Requirements
//
// - Client secret, password and tokens NEVER appear in logs or `Debug`
// - Tokens are handed to the configured `TokenUpdater` for persistence
//
// ## API Reference
//
// - Token endpoint: POST `/oauth/token`
// - Services: GET `/dns-master/services`
// - Zones: GET `/dns-master/services/:service/zones` or `/dns-master/zones`
// - Zone file: GET `/dns-master/services/:service/zones/:zone`
// - Records: GET/PUT `/dns-master/services/:service/zones/:zone/records`
// - Delete: DELETE `/dns-master/services/:service/zones/:zone/records/:id`
// - Commit/rollback: POST `/dns-master/services/:service/zones/:zone/{commit,rollback}`

pub mod auth;
pub mod transport;

use std::sync::{Arc, OnceLock};

use nicdns_core::envelope::{self, Envelope};
use nicdns_core::traits::{ApiRequest, ApiResponse, Method, Transport};
use nicdns_core::{
    ClientConfig, DnsRecord, Element, Error, NicService, NicZone, RecordId, Result, Token,
    TokenUpdater,
};

pub use auth::TokenManager;
pub use transport::ReqwestTransport;

/// HTTP status the API answers with for a rejected access token
const STATUS_UNAUTHORIZED: u16 = 401;

/// nic.ru dns-master API client
///
/// The session (token manager) is created lazily on first use and shared by
/// all concurrent calls on the same client.
///
/// # Example
///
/// ```rust,no_run
/// use nicdns_client::NicApi;
/// use nicdns_core::{ClientConfig, DnsRecord, MemoryTokenStore};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = ClientConfig::new("app-id", "app-secret")
///         .with_credentials("123/NIC-D", "password")
///         .with_default_service("MY-SERVICE")
///         .with_default_zone("example.ru");
///
///     let api = NicApi::new(config)?.with_token_updater(MemoryTokenStore::new());
///
///     for record in api.records(None, None).await? {
///         println!("{} {} {:?}", record.name(), record.record_type(), record.data());
///     }
///
///     api.add_record(&DnsRecord::txt("_acme-challenge", "token"), None, None).await?;
///     api.commit(None, None).await?;
///     Ok(())
/// }
/// ```
pub struct NicApi {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    initial_token: Option<Token>,
    updater: Option<Arc<dyn TokenUpdater>>,
    session: OnceLock<TokenManager>,
}

impl std::fmt::Debug for NicApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NicApi")
            .field("config", &self.config)
            .field("session", &self.session.get())
            .finish()
    }
}

impl NicApi {
    /// Create a client using the `reqwest` transport
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let transport = ReqwestTransport::new(config.timeout())?;
        Ok(Self::build(config, Arc::new(transport)))
    }

    /// Create a client on a custom transport
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, transport))
    }

    fn build(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            transport,
            initial_token: None,
            updater: None,
            session: OnceLock::new(),
        }
    }

    /// Start from a previously saved token
    pub fn with_token(mut self, token: Token) -> Self {
        self.initial_token = Some(token);
        self.session = OnceLock::new();
        self
    }

    /// Notify `updater` whenever the token changes
    pub fn with_token_updater(mut self, updater: impl TokenUpdater + 'static) -> Self {
        self.updater = Some(Arc::new(updater));
        self.session = OnceLock::new();
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The session, created on first use
    pub fn ensure_connected(&self) -> &TokenManager {
        self.session.get_or_init(|| {
            tracing::debug!("Creating API session for client {}", self.config.client_id);
            TokenManager::new(
                &self.config,
                Arc::clone(&self.transport),
                self.initial_token.clone(),
                self.updater.clone(),
            )
        })
    }

    /// Current token, if one was obtained or provided
    pub fn token(&self) -> Option<Token> {
        self.ensure_connected().token()
    }

    /// Acquire a token with the configured username and password
    pub async fn get_token(&self) -> Result<Token> {
        let (username, password) = self.config.credentials().ok_or_else(|| {
            Error::config("username and password are required to acquire a token")
        })?;
        self.ensure_connected()
            .acquire_token(username, password)
            .await
    }

    /// List the account's services
    pub async fn services(&self) -> Result<Vec<NicService>> {
        let (_, body) = self.request_envelope(Method::Get, "/services", None).await?;
        NicService::list_from_response(&body)
    }

    /// List zones of `service`, or of the whole account when no service is
    /// given or configured
    pub async fn zones(&self, service: Option<&str>) -> Result<Vec<NicZone>> {
        let rpath = match service.or(self.config.default_service.as_deref()) {
            Some(service) => format!("/services/{service}/zones"),
            None => "/zones".to_string(),
        };
        let (_, body) = self.request_envelope(Method::Get, &rpath, None).await?;
        NicZone::list_from_response(&body)
    }

    /// Download the zone file in BIND format
    pub async fn zonefile(&self, service: Option<&str>, zone: Option<&str>) -> Result<String> {
        let (service, zone) = self.resolve(service, zone);
        let rpath = format!("/services/{service}/zones/{zone}");

        let response = self.send(Method::Get, &rpath, None).await?;
        if !response.is_success() {
            return Err(Error::transport(response.status, response.body));
        }
        Ok(response.body)
    }

    /// All records of a zone
    pub async fn records(
        &self,
        service: Option<&str>,
        zone: Option<&str>,
    ) -> Result<Vec<DnsRecord>> {
        let (service, zone) = self.resolve(service, zone);
        let rpath = format!("/services/{service}/zones/{zone}/records");

        let data = self.request_data_required(Method::Get, &rpath, None).await?;
        let zone_element = data
            .find("zone")
            .ok_or_else(|| Error::protocol("Can't find <zone> in response data"))?;

        let found = zone_element.attribute("name").unwrap_or("");
        if found != zone {
            return Err(Error::zone_mismatch(zone, found));
        }

        let records = zone_element
            .find_all("rr")
            .into_iter()
            .map(DnsRecord::from_xml)
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            "Fetched {} records for zone {} (service {})",
            records.len(),
            zone,
            service
        );
        Ok(records)
    }

    /// Add one record
    ///
    /// See [`NicApi::add_records`].
    pub async fn add_record(
        &self,
        record: &DnsRecord,
        service: Option<&str>,
        zone: Option<&str>,
    ) -> Result<Vec<DnsRecord>> {
        self.add_records(std::slice::from_ref(record), service, zone)
            .await
    }

    /// Add records in one request
    ///
    /// Only A, AAAA, CNAME and TXT records can be added; any other record
    /// fails with [`Error::NotWritable`] before a request is made. Changes
    /// take effect after [`NicApi::commit`].
    ///
    /// Returns the added records as echoed by the server (with their
    /// assigned ids), or an empty list when the response carries none.
    pub async fn add_records(
        &self,
        records: &[DnsRecord],
        service: Option<&str>,
        zone: Option<&str>,
    ) -> Result<Vec<DnsRecord>> {
        if let Some(record) = records.iter().find(|record| !record.is_writable()) {
            return Err(Error::NotWritable(record.record_type()));
        }
        if records.is_empty() {
            tracing::debug!("No records to add");
            return Ok(Vec::new());
        }

        let (service, zone) = self.resolve(service, zone);
        let rpath = format!("/services/{service}/zones/{zone}/records");

        let rr_list: Vec<Element> = records.iter().map(DnsRecord::to_xml).collect();
        let body = envelope::build_request(&rr_list)?;
        tracing::debug!(
            "Adding {} records on service {} zone {}",
            rr_list.len(),
            service,
            zone
        );

        let data = self.request_data_list(Method::Put, &rpath, Some(body)).await?;
        let added = data
            .iter()
            .filter(|element| element.name() == "zone")
            .flat_map(|zone_element| zone_element.find_all("rr"))
            .map(DnsRecord::from_xml)
            .collect::<Result<Vec<_>>>()?;

        tracing::info!("Added {} records to zone {}", records.len(), zone);
        Ok(added)
    }

    /// Delete a record by id
    pub async fn delete_record(
        &self,
        id: RecordId,
        service: Option<&str>,
        zone: Option<&str>,
    ) -> Result<()> {
        let (service, zone) = self.resolve(service, zone);
        tracing::debug!("Deleting record #{} on service {} zone {}", id, service, zone);

        let rpath = format!("/services/{service}/zones/{zone}/records/{id}");
        self.request_status(Method::Delete, &rpath).await?;

        tracing::info!("Deleted record #{} from zone {}", id, zone);
        Ok(())
    }

    /// Publish pending changes of a zone
    pub async fn commit(&self, service: Option<&str>, zone: Option<&str>) -> Result<()> {
        let (service, zone) = self.resolve(service, zone);
        let rpath = format!("/services/{service}/zones/{zone}/commit");
        self.request_status(Method::Post, &rpath).await?;

        tracing::info!("Committed changes of zone {}", zone);
        Ok(())
    }

    /// Discard pending changes of a zone
    pub async fn rollback(&self, service: Option<&str>, zone: Option<&str>) -> Result<()> {
        let (service, zone) = self.resolve(service, zone);
        let rpath = format!("/services/{service}/zones/{zone}/rollback");
        self.request_status(Method::Post, &rpath).await?;

        tracing::info!("Rolled back changes of zone {}", zone);
        Ok(())
    }

    fn resolve<'a>(
        &'a self,
        service: Option<&'a str>,
        zone: Option<&'a str>,
    ) -> (&'a str, &'a str) {
        let service = service
            .or(self.config.default_service.as_deref())
            .unwrap_or("");
        let zone = zone.or(self.config.default_zone.as_deref()).unwrap_or("");
        (service, zone)
    }

    /// Execute one API request with a bearer token
    ///
    /// A 401 answer triggers one token renewal and one retry.
    async fn send(&self, method: Method, rpath: &str, body: Option<String>) -> Result<ApiResponse> {
        let session = self.ensure_connected();
        let url = self.config.api_url(rpath);

        let access_token = session.access_token().await?;
        let response = self
            .transport
            .execute(api_request(method, &url, &access_token, body.as_deref()))
            .await?;

        if response.status != STATUS_UNAUTHORIZED {
            return Ok(response);
        }

        tracing::warn!("{} {} was rejected with HTTP 401, renewing token", method, rpath);
        let access_token = session.renew_rejected(&access_token).await?;
        self.transport
            .execute(api_request(method, &url, &access_token, body.as_deref()))
            .await
    }

    /// Execute a request and parse a successful envelope
    async fn request_envelope(
        &self,
        method: Method,
        rpath: &str,
        body: Option<String>,
    ) -> Result<(Envelope, String)> {
        let response = self.send(method, rpath, body).await?;

        let envelope = match Envelope::parse(&response.body) {
            Ok(envelope) => envelope,
            Err(_) if !response.is_success() => {
                return Err(Error::transport(response.status, response.body));
            }
            Err(e) => return Err(e),
        };

        if !envelope.is_success() {
            let text = envelope.error_text();
            tracing::debug!("{} {} failed: {}", method, rpath, text);
            return Err(Error::api(text));
        }

        Ok((envelope, response.body))
    }

    async fn request_data_list(
        &self,
        method: Method,
        rpath: &str,
        body: Option<String>,
    ) -> Result<Vec<Element>> {
        let (envelope, _) = self.request_envelope(method, rpath, body).await?;
        Ok(envelope.into_data_list())
    }

    async fn request_data_required(
        &self,
        method: Method,
        rpath: &str,
        body: Option<String>,
    ) -> Result<Element> {
        let (envelope, raw_body) = self.request_envelope(method, rpath, body).await?;
        envelope.require_data(&raw_body)
    }

    async fn request_status(&self, method: Method, rpath: &str) -> Result<()> {
        self.request_envelope(method, rpath, None).await?;
        Ok(())
    }
}

fn api_request(method: Method, url: &str, access_token: &str, body: Option<&str>) -> ApiRequest {
    let request = ApiRequest::new(method, url).with_bearer_token(access_token);
    match body {
        Some(xml) => request.with_xml(xml),
        None => request,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ClientConfig {
        ClientConfig::new("id", "secret")
            .with_credentials("user", "password")
            .with_default_service("SVC")
            .with_default_zone("example.ru")
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let result = NicApi::new(ClientConfig::new("", "secret"));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_resolve_defaults() {
        let api = NicApi::new(config()).unwrap();
        assert_eq!(api.resolve(None, None), ("SVC", "example.ru"));
        assert_eq!(api.resolve(Some("OTHER"), Some("z.ru")), ("OTHER", "z.ru"));

        let bare = NicApi::new(ClientConfig::new("id", "secret")).unwrap();
        assert_eq!(bare.resolve(None, None), ("", ""));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let api = NicApi::new(config()).unwrap();
        let debug = format!("{api:?}");
        assert!(!debug.contains("\"secret\""));
        assert!(!debug.contains("password\""));
        assert!(debug.contains("NicApi"));
    }
}
