use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::env;
use std::sync::Arc;

pub const DEFAULT_REST_URL: &str = "https://www.bitrue.com";
pub const DEFAULT_WS_URL: &str = "wss://ws.bitrue.com/kline-api/ws";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_STREAM_BUFFER: usize = 16;

/// API key pair used to sign private requests.
///
/// Immutable once built and shared read-only (behind an `Arc`) by every
/// transport and signer that needs it. The `Debug` output of the inner
/// secrets is redacted by `secrecy`.
#[derive(Debug, Clone)]
pub struct Credentials {
    access_key: Secret<String>,
    secret_key: Secret<String>,
}

impl Credentials {
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: Secret::new(access_key.into()),
            secret_key: Secret::new(secret_key.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.access_key.expose_secret().is_empty() || self.secret_key.expose_secret().is_empty()
    }

    /// Get access key (use carefully - exposes secret)
    pub fn access_key(&self) -> &str {
        self.access_key.expose_secret()
    }

    /// Get secret key (use carefully - exposes secret)
    pub fn secret_key(&self) -> &str {
        self.secret_key.expose_secret()
    }
}

#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    pub credentials: Arc<Credentials>,
    pub base_url: Option<String>,
    pub ws_url: Option<String>,
    pub request_timeout_secs: u64,
    pub stream_buffer: usize,
}

// Custom Serialize implementation - never expose secrets in serialization
impl Serialize for ExchangeConfig {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("ExchangeConfig", 6)?;
        state.serialize_field("api_key", "[REDACTED]")?;
        state.serialize_field("secret_key", "[REDACTED]")?;
        state.serialize_field("base_url", &self.base_url)?;
        state.serialize_field("ws_url", &self.ws_url)?;
        state.serialize_field("request_timeout_secs", &self.request_timeout_secs)?;
        state.serialize_field("stream_buffer", &self.stream_buffer)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for ExchangeConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct ExchangeConfigHelper {
            api_key: String,
            secret_key: String,
            base_url: Option<String>,
            ws_url: Option<String>,
            #[serde(default = "default_timeout")]
            request_timeout_secs: u64,
            #[serde(default = "default_stream_buffer")]
            stream_buffer: usize,
        }

        const fn default_timeout() -> u64 {
            DEFAULT_REQUEST_TIMEOUT_SECS
        }

        const fn default_stream_buffer() -> usize {
            DEFAULT_STREAM_BUFFER
        }

        let helper = ExchangeConfigHelper::deserialize(deserializer)?;
        Ok(Self {
            credentials: Arc::new(Credentials::new(helper.api_key, helper.secret_key)),
            base_url: helper.base_url,
            ws_url: helper.ws_url,
            request_timeout_secs: helper.request_timeout_secs,
            stream_buffer: helper.stream_buffer,
        })
    }
}

impl ExchangeConfig {
    /// Create a new configuration with API credentials
    #[must_use]
    pub fn new(api_key: String, secret_key: String) -> Self {
        Self::with_credentials(Arc::new(Credentials::new(api_key, secret_key)))
    }

    /// Create a configuration sharing an existing set of credentials
    #[must_use]
    pub fn with_credentials(credentials: Arc<Credentials>) -> Self {
        Self {
            credentials,
            base_url: None,
            ws_url: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            stream_buffer: DEFAULT_STREAM_BUFFER,
        }
    }

    /// Create configuration from environment variables
    ///
    /// Expected environment variables:
    /// - `{EXCHANGE}_API_KEY` (e.g., `BITRUE_API_KEY`)
    /// - `{EXCHANGE}_SECRET_KEY` (e.g., `BITRUE_SECRET_KEY`)
    /// - `{EXCHANGE}_BASE_URL` (optional)
    /// - `{EXCHANGE}_WS_URL` (optional)
    pub fn from_env(exchange_prefix: &str) -> Result<Self, ConfigError> {
        let prefix = exchange_prefix.to_uppercase();
        let api_key_var = format!("{}_API_KEY", prefix);
        let secret_key_var = format!("{}_SECRET_KEY", prefix);

        let api_key = env::var(&api_key_var)
            .map_err(|_| ConfigError::MissingEnvironmentVariable(api_key_var))?;
        let secret_key = env::var(&secret_key_var)
            .map_err(|_| ConfigError::MissingEnvironmentVariable(secret_key_var))?;

        let mut config = Self::new(api_key, secret_key);
        config.base_url = env::var(format!("{}_BASE_URL", prefix)).ok();
        config.ws_url = env::var(format!("{}_WS_URL", prefix)).ok();
        Ok(config)
    }

    /// Create configuration from a `.env` file and environment variables
    ///
    /// A missing `.env` file is not an error; the process environment is used as-is.
    #[cfg(feature = "env-file")]
    pub fn from_env_file(exchange_prefix: &str) -> Result<Self, ConfigError> {
        Self::from_env_file_with_path(exchange_prefix, ".env")
    }

    #[cfg(feature = "env-file")]
    pub fn from_env_file_with_path(
        exchange_prefix: &str,
        env_file_path: &str,
    ) -> Result<Self, ConfigError> {
        match dotenv::from_path(env_file_path) {
            Ok(()) => {}
            Err(dotenv::Error::Io(io_err)) if io_err.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(ConfigError::InvalidConfiguration(format!(
                    "Failed to load .env file '{}': {}",
                    env_file_path, e
                )));
            }
        }

        Self::from_env(exchange_prefix)
    }

    /// Configuration for public market data only
    #[must_use]
    pub fn read_only() -> Self {
        Self::new(String::new(), String::new())
    }

    /// Check if this configuration has valid credentials for authenticated operations
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.credentials.is_empty()
    }

    #[must_use]
    pub fn base_url(mut self, base_url: String) -> Self {
        self.base_url = Some(base_url);
        self
    }

    #[must_use]
    pub fn ws_url(mut self, ws_url: String) -> Self {
        self.ws_url = Some(ws_url);
        self
    }

    #[must_use]
    pub const fn request_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_secs = seconds;
        self
    }

    #[must_use]
    pub const fn stream_buffer(mut self, capacity: usize) -> Self {
        self.stream_buffer = capacity;
        self
    }

    pub fn rest_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_REST_URL)
    }

    pub fn stream_url(&self) -> &str {
        self.ws_url.as_deref().unwrap_or(DEFAULT_WS_URL)
    }

    /// Get API key (use carefully - exposes secret)
    pub fn api_key(&self) -> &str {
        self.credentials.access_key()
    }

    /// Get secret key (use carefully - exposes secret)
    pub fn secret_key(&self) -> &str {
        self.credentials.secret_key()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvironmentVariable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}
