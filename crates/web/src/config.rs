//! Frontend configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional; defaults suit a local backend on port 8080.
//!
//! - `CATALOG_API_BASE` - Backend base URL (default: `http://localhost:8080`)
//! - `CATALOG_HOST` - Bind address (default: 127.0.0.1)
//! - `CATALOG_PORT` - Listen port (default: 3000)
//! - `CATALOG_BASE_URL` - Public URL of this frontend (default: `http://localhost:3000`)
//! - `CATALOG_API_TIMEOUT_SECS` - Backend request timeout (default: 30)
//! - `CATALOG_PAGE_SIZE` - Products per listing page (default: 12)
//! - `CATALOG_REDIRECT_DELAY_MS` - Delay before returning to the listing after a
//!   successful upload (default: 1500)
//! - `CATALOG_MAX_UPLOAD_MB` - Request body limit for upload forms (default: 25)
//! - `CATALOG_UPLOAD_TTL_SECS` - How long an idle upload is tracked before it is
//!   cancelled (default: 600)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Default backend location when `CATALOG_API_BASE` is unset.
pub const DEFAULT_API_BASE: &str = "http://localhost:8080";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Catalog frontend configuration.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the frontend
    pub base_url: String,
    /// Backend API configuration
    pub api: ApiConfig,
    /// Products per listing page
    pub page_size: u32,
    /// Delay before navigating back to the listing after a successful upload
    pub redirect_delay: Duration,
    /// Maximum accepted request body for upload forms, in bytes
    pub max_upload_bytes: usize,
    /// Idle time after which a tracked upload is dropped (and aborted)
    pub upload_ttl: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate
    pub sentry_sample_rate: f32,
    /// Sentry transaction sample rate
    pub sentry_traces_sample_rate: f32,
}

/// Backend API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Backend base URL; `/api/...` paths are resolved against it
    pub base_url: Url,
    /// Per-request timeout
    pub timeout: Duration,
}

impl ApiConfig {
    /// Configuration for a backend at `base_url` with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the URL does not parse.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_url("CATALOG_API_BASE", base_url)?,
            timeout: Duration::from_secs(30),
        })
    }
}

impl CatalogConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but malformed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = EnvSource { lookup };

        let api_base = env.or_default("CATALOG_API_BASE", DEFAULT_API_BASE);
        let api = ApiConfig {
            base_url: parse_url("CATALOG_API_BASE", &api_base)?,
            timeout: Duration::from_secs(env.parsed("CATALOG_API_TIMEOUT_SECS", 30)?),
        };

        let max_upload_mb: usize = env.parsed("CATALOG_MAX_UPLOAD_MB", 25)?;

        Ok(Self {
            host: env.parsed("CATALOG_HOST", IpAddr::from([127, 0, 0, 1]))?,
            port: env.parsed("CATALOG_PORT", 3000)?,
            base_url: env.or_default("CATALOG_BASE_URL", "http://localhost:3000"),
            api,
            page_size: env.parsed::<u32>("CATALOG_PAGE_SIZE", 12)?.max(1),
            redirect_delay: Duration::from_millis(env.parsed("CATALOG_REDIRECT_DELAY_MS", 1500)?),
            max_upload_bytes: max_upload_mb.saturating_mul(1024 * 1024),
            upload_ttl: Duration::from_secs(env.parsed("CATALOG_UPLOAD_TTL_SECS", 600)?),
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: env.parsed("SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: env.parsed("SENTRY_TRACES_SAMPLE_RATE", 0.0)?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the frontend is served over HTTPS (enables secure cookies).
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct EnvSource<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> EnvSource<F> {
    /// Get an optional variable; blank values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|value| !value.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parsed<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key).map_or(Ok(default), |value| {
            value
                .trim()
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }
}

/// Parse a base URL, requiring an http(s) scheme.
fn parse_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url)
}
