//! Configuration system (layered: code > env > config file > defaults).

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::assets::AssetId;
use crate::auth::store::default_token_path;
use crate::util::poll::BoundedWait;

pub const DEFAULT_ION_SERVER: &str = "https://ion.cesium.com";
pub const DEFAULT_API_SERVER: &str = "https://api.cesium.com";
pub const DEFAULT_CLIENT_ID: &str = "ion-publish";
pub const DEFAULT_CALLBACK_HOST: &str = "localhost";
pub const DEFAULT_CALLBACK_PORT: u16 = 10101;
pub const DEFAULT_CALLBACK_PATH: &str = "/oauth";
const DEFAULT_SCOPES: [&str; 2] = ["assets:read", "assets:write"];
const DEFAULT_CALLBACK_POLL_INTERVAL: Duration = Duration::from_secs(1);
const DEFAULT_CALLBACK_MAX_ATTEMPTS: u32 = 60;
const DEFAULT_CALLBACK_READ_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_STATUS_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Floor for every polling interval; tokio timers reject a zero period.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Errors raised while assembling an [`IonConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read config file {path}: {message}")]
    Io { path: PathBuf, message: String },
    #[error("Invalid config file: {0}")]
    Parse(String),
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
}

impl From<toml::de::Error> for ConfigError {
    fn from(error: toml::de::Error) -> Self {
        Self::Parse(error.to_string())
    }
}

/// Immutable settings shared by the auth flow, the publisher and the tiling monitor.
///
/// Build one per process and hand it out behind an `Arc`; nothing in the crate
/// mutates it after construction.
///
/// # Example
/// ```
/// use ion_publish::config::IonConfig;
///
/// let config = IonConfig::new().with_api_server("http://127.0.0.1:8080");
/// assert_eq!(config.token_endpoint(), "http://127.0.0.1:8080/oauth/token");
/// assert_eq!(config.redirect_uri(), "http://localhost:10101/oauth");
/// ```
#[derive(Clone, PartialEq)]
pub struct IonConfig {
    pub ion_server: String,
    pub api_server: String,
    pub client_id: String,
    pub scopes: Vec<String>,
    pub callback_host: String,
    pub callback_port: u16,
    pub callback_path: String,
    pub callback_poll_interval: Duration,
    pub callback_max_attempts: u32,
    pub callback_read_timeout: Duration,
    pub status_poll_interval: Duration,
    pub token_path: PathBuf,
}

impl fmt::Debug for IonConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IonConfig")
            .field("ion_server", &self.ion_server)
            .field("api_server", &self.api_server)
            .field("client_id", &self.client_id)
            .field("callback", &self.callback_authority())
            .field("token_path", &self.token_path)
            .finish_non_exhaustive()
    }
}

impl Default for IonConfig {
    fn default() -> Self {
        Self {
            ion_server: DEFAULT_ION_SERVER.to_string(),
            api_server: DEFAULT_API_SERVER.to_string(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            callback_host: DEFAULT_CALLBACK_HOST.to_string(),
            callback_port: DEFAULT_CALLBACK_PORT,
            callback_path: DEFAULT_CALLBACK_PATH.to_string(),
            callback_poll_interval: DEFAULT_CALLBACK_POLL_INTERVAL,
            callback_max_attempts: DEFAULT_CALLBACK_MAX_ATTEMPTS,
            callback_read_timeout: DEFAULT_CALLBACK_READ_TIMEOUT,
            status_poll_interval: DEFAULT_STATUS_POLL_INTERVAL,
            token_path: default_token_path(),
        }
    }
}

impl IonConfig {
    /// Built-in defaults pointing at the public ion service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overlaid with environment variables (and a `.env` file if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        Self::new().apply_env(|key| std::env::var(key).ok())
    }

    /// Full resolution: defaults, then the optional TOML file, then the environment.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        let base = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::new(),
        };
        base.apply_env(|key| std::env::var(key).ok())
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|err| ConfigError::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(raw)?;
        file.apply(Self::new())
    }

    /// Overlay values from `lookup` (normally `std::env::var`).
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("ION_SERVER") {
            self.ion_server = value;
        }
        if let Some(value) = lookup("ION_API_SERVER") {
            self.api_server = value;
        }
        if let Some(value) = lookup("ION_CLIENT_ID") {
            self.client_id = value;
        }
        if let Some(value) = lookup("ION_TOKEN_PATH") {
            self.token_path = PathBuf::from(value);
        }
        if let Some(value) = lookup("ION_CALLBACK_PORT") {
            self.callback_port =
                value
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue {
                        key: "ION_CALLBACK_PORT".to_string(),
                        value,
                    })?;
        }
        Ok(self)
    }

    pub fn with_ion_server(mut self, url: impl Into<String>) -> Self {
        self.ion_server = url.into();
        self
    }

    pub fn with_api_server(mut self, url: impl Into<String>) -> Self {
        self.api_server = url.into();
        self
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    pub fn with_token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_path = path.into();
        self
    }

    /// Host and port the loopback callback listener binds. Port `0` picks a free port.
    pub fn with_callback_address(mut self, host: impl Into<String>, port: u16) -> Self {
        self.callback_host = host.into();
        self.callback_port = port;
        self
    }

    /// Intervals below [`MIN_POLL_INTERVAL`] are raised to it.
    pub fn with_callback_wait(mut self, interval: Duration, max_attempts: u32) -> Self {
        self.callback_poll_interval = interval.max(MIN_POLL_INTERVAL);
        self.callback_max_attempts = max_attempts;
        self
    }

    pub fn with_callback_read_timeout(mut self, timeout: Duration) -> Self {
        self.callback_read_timeout = timeout.max(MIN_POLL_INTERVAL);
        self
    }

    /// Intervals below [`MIN_POLL_INTERVAL`] are raised to it.
    pub fn with_status_poll_interval(mut self, interval: Duration) -> Self {
        self.status_poll_interval = interval.max(MIN_POLL_INTERVAL);
        self
    }

    /// The bounded accept loop used by the callback listener.
    pub fn callback_wait(&self) -> BoundedWait {
        BoundedWait::new(
            self.callback_poll_interval.max(MIN_POLL_INTERVAL),
            self.callback_max_attempts,
        )
    }

    /// `host:port` the browser redirect is expected to carry in its `Host` header.
    pub fn callback_authority(&self) -> String {
        format!("{}:{}", self.callback_host, self.callback_port)
    }

    pub fn redirect_uri(&self) -> String {
        format!("http://{}{}", self.callback_authority(), self.callback_path)
    }

    pub fn scope_param(&self) -> String {
        self.scopes.join(" ")
    }

    pub fn authorize_endpoint(&self) -> String {
        format!("{}/ion/oauth", trim_base(&self.ion_server))
    }

    pub fn token_endpoint(&self) -> String {
        format!("{}/oauth/token", trim_base(&self.api_server))
    }

    pub fn assets_endpoint(&self) -> String {
        format!("{}/v1/assets", trim_base(&self.api_server))
    }

    pub fn asset_endpoint(&self, id: AssetId) -> String {
        format!("{}/v1/assets/{id}", trim_base(&self.api_server))
    }
}

fn trim_base(url: &str) -> &str {
    url.trim_end_matches('/')
}

/// On-disk TOML layout. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    ion_server: Option<String>,
    api_server: Option<String>,
    client_id: Option<String>,
    scopes: Option<Vec<String>>,
    token_path: Option<PathBuf>,
    callback: Option<CallbackSection>,
    status_poll_interval_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct CallbackSection {
    host: Option<String>,
    port: Option<u16>,
    path: Option<String>,
    poll_interval_ms: Option<u64>,
    max_attempts: Option<u32>,
    read_timeout_ms: Option<u64>,
}

impl ConfigFile {
    fn apply(self, mut config: IonConfig) -> Result<IonConfig, ConfigError> {
        if let Some(value) = self.ion_server {
            config.ion_server = value;
        }
        if let Some(value) = self.api_server {
            config.api_server = value;
        }
        if let Some(value) = self.client_id {
            config.client_id = value;
        }
        if let Some(value) = self.scopes {
            config.scopes = value;
        }
        if let Some(value) = self.token_path {
            config.token_path = value;
        }
        if let Some(ms) = self.status_poll_interval_ms {
            config.status_poll_interval = positive_millis("status_poll_interval_ms", ms)?;
        }
        if let Some(callback) = self.callback {
            if let Some(value) = callback.host {
                config.callback_host = value;
            }
            if let Some(value) = callback.port {
                config.callback_port = value;
            }
            if let Some(value) = callback.path {
                config.callback_path = value;
            }
            if let Some(ms) = callback.poll_interval_ms {
                config.callback_poll_interval = positive_millis("callback.poll_interval_ms", ms)?;
            }
            if let Some(value) = callback.max_attempts {
                config.callback_max_attempts = value;
            }
            if let Some(ms) = callback.read_timeout_ms {
                config.callback_read_timeout = positive_millis("callback.read_timeout_ms", ms)?;
            }
        }
        Ok(config)
    }
}

fn positive_millis(key: &str, ms: u64) -> Result<Duration, ConfigError> {
    if ms == 0 {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: ms.to_string(),
        });
    }
    Ok(Duration::from_millis(ms))
}
