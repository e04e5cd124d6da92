// # nicdns_records - walk a nic.ru account from the command line
//
// Lists the account's DNS services, the zones of the selected service and
// the records of the selected zone. When `NIC_TXT_NAME` and `NIC_TXT_VALUE`
// are set, a TXT record is added and the zone is committed.
//
// ## Configuration
//
// - `NIC_CLIENT_ID`, `NIC_CLIENT_SECRET`: OAuth application (required)
// - `NIC_USERNAME`, `NIC_PASSWORD`: account credentials
// - `NIC_SCOPE`: OAuth scope
// - `NIC_BASE_URL`: API host (default https://api.nic.ru)
// - `NIC_SERVICE`, `NIC_ZONE`: default service and zone
// - `NIC_TIMEOUT_SECS`: per-request timeout
// - `NIC_OFFLINE_SECS`: lifetime of the refresh token
// - `NIC_TOKEN_FILE`: where the token is kept between runs
// - `NIC_LOG_LEVEL`: trace, debug, info, warn, error
//
// ## Example
//
// ```bash
// export NIC_CLIENT_ID=app-id NIC_CLIENT_SECRET=app-secret
// export NIC_USERNAME=123/NIC-D NIC_PASSWORD=secret
// export NIC_SERVICE=MY-SERVICE NIC_ZONE=example.ru
// export NIC_TOKEN_FILE=$HOME/.cache/nicdns/token.json
//
// nicdns_records
// ```

use anyhow::{Context, Result};
use nicdns_client::NicApi;
use nicdns_core::config::DEFAULT_BASE_URL;
use nicdns_core::{ClientConfig, DnsRecord, FileTokenStore};
use std::env;
use std::process::ExitCode;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Settings read from the environment
struct Settings {
    client_id: String,
    client_secret: String,
    username: Option<String>,
    password: Option<String>,
    scope: Option<String>,
    base_url: String,
    service: Option<String>,
    zone: Option<String>,
    timeout_secs: Option<u64>,
    offline_secs: Option<u64>,
    token_file: Option<String>,
    txt: Option<(String, String)>,
    log_level: String,
}

impl Settings {
    fn from_env() -> Result<Self> {
        let txt = match (env::var("NIC_TXT_NAME").ok(), env::var("NIC_TXT_VALUE").ok()) {
            (Some(name), Some(value)) => Some((name, value)),
            (None, None) => None,
            _ => anyhow::bail!("NIC_TXT_NAME and NIC_TXT_VALUE must be set together"),
        };

        Ok(Self {
            client_id: env::var("NIC_CLIENT_ID").context("NIC_CLIENT_ID is required")?,
            client_secret: env::var("NIC_CLIENT_SECRET")
                .context("NIC_CLIENT_SECRET is required")?,
            username: env::var("NIC_USERNAME").ok(),
            password: env::var("NIC_PASSWORD").ok(),
            scope: env::var("NIC_SCOPE").ok(),
            base_url: env::var("NIC_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            service: env::var("NIC_SERVICE").ok(),
            zone: env::var("NIC_ZONE").ok(),
            timeout_secs: parse_var("NIC_TIMEOUT_SECS")?,
            offline_secs: parse_var("NIC_OFFLINE_SECS")?,
            token_file: env::var("NIC_TOKEN_FILE").ok(),
            txt,
            log_level: env::var("NIC_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    fn client_config(&self) -> Result<ClientConfig> {
        let mut config = ClientConfig::new(&self.client_id, &self.client_secret)
            .with_base_url(&self.base_url);

        match (&self.username, &self.password) {
            (Some(username), Some(password)) => {
                config = config.with_credentials(username, password);
            }
            (None, None) => {}
            _ => anyhow::bail!("NIC_USERNAME and NIC_PASSWORD must be set together"),
        }
        if let Some(scope) = &self.scope {
            config = config.with_scope(scope);
        }
        if let Some(service) = &self.service {
            config = config.with_default_service(service);
        }
        if let Some(zone) = &self.zone {
            config = config.with_default_zone(zone);
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout_secs(secs);
        }
        if let Some(secs) = self.offline_secs {
            config = config.with_offline_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    fn level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

fn parse_var(name: &str) -> Result<Option<u64>> {
    match env::var(name) {
        Ok(value) => value
            .parse()
            .map(Some)
            .with_context(|| format!("{name} must be a number of seconds, got '{value}'")),
        Err(_) => Ok(None),
    }
}

fn main() -> ExitCode {
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {e:#}");
            return ExitCode::from(1);
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(settings.level())
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {e}");
        return ExitCode::from(1);
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {e}");
            return ExitCode::from(2);
        }
    };

    match runtime.block_on(run(settings)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::from(2)
        }
    }
}

async fn run(settings: Settings) -> Result<()> {
    let mut api = NicApi::new(settings.client_config()?)?;

    if let Some(path) = &settings.token_file {
        let store = FileTokenStore::new(path)?;
        match store.load()? {
            Some(token) => {
                info!("Resuming session from {}", store.path().display());
                api = api.with_token(token);
            }
            None => info!("No saved token at {}", store.path().display()),
        }
        api = api.with_token_updater(store);
    }

    for service in api.services().await? {
        info!(
            "Service {} ({}): {}/{} zones, enabled: {}",
            service.name, service.tariff, service.domains_num, service.domains_limit, service.enable
        );
    }

    if settings.service.is_none() {
        warn!("NIC_SERVICE is not set, listing zones across all services");
    }
    for zone in api.zones(None).await? {
        info!(
            "Zone {} in {} (uncommitted changes: {})",
            zone.name, zone.service, zone.has_changes
        );
    }

    if settings.zone.is_none() {
        info!("NIC_ZONE is not set, skipping record listing");
        return Ok(());
    }

    let records = api.records(None, None).await?;
    info!("{} record(s)", records.len());
    for record in &records {
        info!(
            "{:>10} {:<6} {:<24} ttl={}",
            record.id().map(|id| id.to_string()).unwrap_or_default(),
            record.record_type(),
            record.name(),
            record
                .ttl()
                .map(|ttl| ttl.to_string())
                .unwrap_or_else(|| "-".to_string())
        );
    }

    if let Some((name, value)) = settings.txt {
        let added = api
            .add_record(&DnsRecord::txt(name, value), None, None)
            .await?;
        for record in &added {
            info!("Added {} record {}", record.record_type(), record.name());
        }
        api.commit(None, None).await?;
        info!("Zone committed");
    }

    Ok(())
}
