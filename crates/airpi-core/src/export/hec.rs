//! Splunk HTTP Event Collector exporter.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::{Event, ExportError, Exporter};

/// Startup configuration error. Fatal: the daemon refuses to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Required setting is absent or blank.
    Missing(&'static str),
    /// Setting is present but unusable.
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Missing(field) => write!(f, "missing required setting: {}", field),
            ConfigError::Invalid(msg) => write!(f, "invalid setting: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Connection settings for a HEC endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct HecConfig {
    token: String,
    host: String,
    port: u16,
    tls: bool,
    verify_tls: bool,
    timeout: Duration,
}

impl HecConfig {
    pub const DEFAULT_PORT: u16 = 8088;
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Validates the token and host; both must be non-blank.
    pub fn new(token: Option<&str>, host: &str) -> Result<Self, ConfigError> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::Missing("HEC token"))?;
        let host = host.trim();
        if host.is_empty() {
            return Err(ConfigError::Missing("HEC host"));
        }
        if host.contains('/') {
            return Err(ConfigError::Invalid(format!(
                "HEC host {:?} must be a host name, not a URL",
                host
            )));
        }
        Ok(Self {
            token: token.to_string(),
            host: host.to_string(),
            port: Self::DEFAULT_PORT,
            tls: true,
            verify_tls: true,
            timeout: Self::DEFAULT_TIMEOUT,
        })
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }

    /// Whether the server certificate is checked. Stock HEC installs ship a
    /// self-signed certificate, which only passes with verification off.
    pub fn verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }

    pub fn verifies_tls(&self) -> bool {
        self.verify_tls
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Full event endpoint URL.
    pub fn endpoint(&self) -> String {
        let scheme = if self.tls { "https" } else { "http" };
        format!(
            "{}://{}:{}/services/collector/event",
            scheme, self.host, self.port
        )
    }
}

// The token stays out of logs.
impl std::fmt::Debug for HecConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HecConfig")
            .field("endpoint", &self.endpoint())
            .field("verify_tls", &self.verify_tls)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Posts events to a HEC endpoint with a blocking HTTP agent.
pub struct HecExporter {
    agent: ureq::Agent,
    endpoint: String,
    authorization: String,
}

impl HecExporter {
    pub fn new(config: &HecConfig) -> Result<Self, ConfigError> {
        let mut builder = ureq::AgentBuilder::new().timeout(config.timeout);
        if config.tls && !config.verify_tls {
            warn!("HEC certificate verification is disabled");
            let connector = native_tls::TlsConnector::builder()
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true)
                .build()
                .map_err(|e| ConfigError::Invalid(format!("TLS setup failed: {}", e)))?;
            builder = builder.tls_connector(Arc::new(connector));
        }
        Ok(Self {
            agent: builder.build(),
            endpoint: config.endpoint(),
            authorization: format!("Splunk {}", config.token),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Exporter for HecExporter {
    fn send(&mut self, event: &Event<'_>) -> Result<(), ExportError> {
        let body = serde_json::to_string(event)?;
        let result = self
            .agent
            .post(&self.endpoint)
            .set("Authorization", &self.authorization)
            .set("Content-Type", "application/json")
            .send_string(&body);

        match result {
            Ok(response) => {
                debug!("HEC accepted event ({})", response.status());
                Ok(())
            }
            Err(ureq::Error::Status(code, response)) => Err(ExportError::Status(
                code,
                response.into_string().unwrap_or_default().trim().to_string(),
            )),
            Err(ureq::Error::Transport(e)) => Err(ExportError::Transport(e.to_string())),
        }
    }
}
