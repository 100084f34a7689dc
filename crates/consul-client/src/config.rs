// Configuration for ConsulClient

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::{ConsulError, Result};
use crate::retry::RetryPolicy;

/// Where the ACL token travels on each request
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TokenPlacement {
    /// `?token=` query parameter
    #[default]
    QueryParam,
    /// `X-Consul-Token` header
    Header,
}

/// Configuration for the Consul HTTP client
#[derive(Clone, Debug)]
pub struct ConsulClientConfig {
    /// Agent host (default: "127.0.0.1")
    pub host: String,
    /// Agent HTTP port (default: 8500)
    pub port: u16,
    /// Use https
    pub use_tls: bool,
    /// Skip certificate verification
    pub trust_all: bool,
    /// Extra PEM root certificate
    pub ca_pem: Option<Vec<u8>>,
    /// ACL token attached to every request
    pub acl_token: Option<String>,
    /// Datacenter attached to every request
    pub datacenter: Option<String>,
    /// Request timeout, excluding blocking wait time (default: 10s)
    pub timeout: Duration,
    /// Connection timeout (default: 5s)
    pub connect_timeout: Duration,
    pub token_placement: TokenPlacement,
    pub retry: RetryPolicy,
}

impl Default for ConsulClientConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8500,
            use_tls: false,
            trust_all: false,
            ca_pem: None,
            acl_token: None,
            datacenter: None,
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            token_placement: TokenPlacement::QueryParam,
            retry: RetryPolicy::default(),
        }
    }
}

impl ConsulClientConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            host: host.to_string(),
            port,
            ..Default::default()
        }
    }

    pub fn with_tls(mut self, use_tls: bool) -> Self {
        self.use_tls = use_tls;
        self
    }

    pub fn with_trust_all(mut self, trust_all: bool) -> Self {
        self.trust_all = trust_all;
        self
    }

    pub fn with_ca_pem(mut self, pem: impl Into<Vec<u8>>) -> Self {
        self.ca_pem = Some(pem.into());
        self
    }

    pub fn with_acl_token(mut self, token: &str) -> Self {
        self.acl_token = Some(token.to_string());
        self
    }

    pub fn with_datacenter(mut self, dc: &str) -> Self {
        self.datacenter = Some(dc.to_string());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_token_placement(mut self, placement: TokenPlacement) -> Self {
        self.token_placement = placement;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Scheme, host and port, e.g. `http://127.0.0.1:8500`
    pub fn base_url(&self) -> String {
        let scheme = if self.use_tls { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(ConsulError::InvalidConfig("host must not be empty".into()));
        }
        if self.port == 0 {
            return Err(ConsulError::InvalidConfig("port must not be 0".into()));
        }
        if self.timeout.is_zero() {
            return Err(ConsulError::InvalidConfig("timeout must be positive".into()));
        }
        Ok(())
    }

    /// Load from `CONSUL_*` environment variables.
    ///
    /// Recognises the client's own keys (`CONSUL_HOST`, `CONSUL_PORT`,
    /// `CONSUL_ACL_TOKEN`, ...) as well as the variables the Consul CLI uses
    /// (`CONSUL_HTTP_ADDR`, `CONSUL_HTTP_TOKEN`, `CONSUL_HTTP_SSL`,
    /// `CONSUL_HTTP_SSL_VERIFY`, `CONSUL_CACERT`).
    pub fn from_env() -> Result<Self> {
        let config = Config::builder()
            .add_source(Environment::with_prefix("CONSUL").try_parsing(true))
            .build()
            .map_err(|e| ConsulError::InvalidConfig(e.to_string()))?;
        Self::from_config(&config)
    }

    /// Load from a config file (toml, yaml or json), overridden by the
    /// environment the same way as [`ConsulClientConfig::from_env`]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(Environment::with_prefix("CONSUL").try_parsing(true))
            .build()
            .map_err(|e| ConsulError::InvalidConfig(e.to_string()))?;
        Self::from_config(&config)
    }

    /// Build from an already assembled [`Config`]
    pub fn from_config(config: &Config) -> Result<Self> {
        let settings: ConsulSettings = config
            .clone()
            .try_deserialize()
            .map_err(|e| ConsulError::InvalidConfig(e.to_string()))?;
        settings.into_config()
    }
}

/// Flat key layout shared by config files and `CONSUL_*` variables
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConsulSettings {
    host: Option<String>,
    port: Option<u16>,
    use_tls: Option<bool>,
    trust_all: Option<bool>,
    ca_file: Option<PathBuf>,
    acl_token: Option<String>,
    datacenter: Option<String>,
    timeout_ms: Option<u64>,
    connect_timeout_ms: Option<u64>,
    token_in_header: Option<bool>,
    max_retries: Option<u32>,

    // Consul CLI names
    http_addr: Option<String>,
    http_token: Option<String>,
    http_ssl: Option<bool>,
    http_ssl_verify: Option<bool>,
    cacert: Option<PathBuf>,
}

impl ConsulSettings {
    fn into_config(self) -> Result<ConsulClientConfig> {
        let mut config = ConsulClientConfig::default();

        if let Some(addr) = &self.http_addr {
            apply_http_addr(&mut config, addr)?;
        }
        if let Some(v) = self.http_ssl {
            config.use_tls = v;
        }
        if let Some(v) = self.http_ssl_verify {
            config.trust_all = !v;
        }
        config.acl_token = self.http_token.filter(|t| !t.is_empty());

        if let Some(v) = self.host {
            config.host = v;
        }
        if let Some(v) = self.port {
            config.port = v;
        }
        if let Some(v) = self.use_tls {
            config.use_tls = v;
        }
        if let Some(v) = self.trust_all {
            config.trust_all = v;
        }
        if let Some(v) = self.acl_token.filter(|t| !t.is_empty()) {
            config.acl_token = Some(v);
        }
        config.datacenter = self.datacenter.filter(|dc| !dc.is_empty());
        if let Some(ms) = self.timeout_ms {
            config.timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.connect_timeout_ms {
            config.connect_timeout = Duration::from_millis(ms);
        }
        if self.token_in_header == Some(true) {
            config.token_placement = TokenPlacement::Header;
        }
        if let Some(n) = self.max_retries {
            config.retry.max_retries = n;
        }

        if let Some(path) = self.ca_file.or(self.cacert) {
            let pem = std::fs::read(&path).map_err(|e| {
                ConsulError::InvalidConfig(format!(
                    "failed to read CA file {}: {}",
                    path.display(),
                    e
                ))
            })?;
            config.ca_pem = Some(pem);
        }

        config.validate()?;
        Ok(config)
    }
}

/// Accepts `host:port`, `http://host:port` and `https://host:port`
fn apply_http_addr(config: &mut ConsulClientConfig, addr: &str) -> Result<()> {
    let rest = if let Some(rest) = addr.strip_prefix("https://") {
        config.use_tls = true;
        rest
    } else if let Some(rest) = addr.strip_prefix("http://") {
        config.use_tls = false;
        rest
    } else {
        addr
    };
    let rest = rest.trim_end_matches('/');

    match rest.rsplit_once(':') {
        Some((host, port)) => {
            config.host = host.to_string();
            config.port = port.parse().map_err(|_| {
                ConsulError::InvalidConfig(format!("invalid port in address '{}'", addr))
            })?;
        }
        None => config.host = rest.to_string(),
    }
    Ok(())
}
