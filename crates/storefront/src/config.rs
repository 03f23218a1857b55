//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `COMMERCE_BACKEND_URL` - Base URL of the commerce backend (e.g., `http://localhost:9000`)
//!
//! ## Optional
//! - `COMMERCE_PUBLISHABLE_KEY` - Publishable API key sent with store API calls
//! - `COMMERCE_AMOUNT_UNIT` - `major`, `minor`, or `heuristic` (default: major)
//! - `COMMERCE_TIMEOUT_SECS` - Backend request timeout (default: 10)
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 8000)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront (default: `http://localhost:8000`)
//! - `STOREFRONT_DEFAULT_REGION` - Country code used when none is given (default: us)
//! - `STOREFRONT_LOCALE` - Number formatting locale (default: en-US)
//! - `REGION_CACHE_TTL_SECS` - Region cache lifetime, unset or 0 keeps regions until cleared
//! - `PRODUCT_CACHE_TTL_SECS` - Product listing cache lifetime (default: 300)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use lather_core::AmountUnit;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Country code used when a request carries none
    pub default_region: String,
    /// Locale tag for number formatting
    pub locale: String,
    /// Commerce backend configuration
    pub commerce: CommerceConfig,
    /// Region cache lifetime (`None` = until cleared)
    pub region_cache_ttl: Option<Duration>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate
    pub sentry_sample_rate: f32,
    /// Sentry transaction sample rate
    pub sentry_traces_sample_rate: f32,
}

/// Commerce backend connection settings.
///
/// Implements `Debug` manually to redact the publishable key.
#[derive(Clone)]
pub struct CommerceConfig {
    /// Base URL of the backend (no trailing slash)
    pub backend_url: Url,
    /// Publishable API key for the store API
    pub publishable_key: Option<SecretString>,
    /// How raw backend amounts map to major currency units
    pub amount_unit: AmountUnit,
    /// Per-request timeout
    pub timeout: Duration,
    /// Product listing cache lifetime
    pub product_cache_ttl: Duration,
}

impl std::fmt::Debug for CommerceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommerceConfig")
            .field("backend_url", &self.backend_url.as_str())
            .field(
                "publishable_key",
                &self.publishable_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("amount_unit", &self.amount_unit)
            .field("timeout", &self.timeout)
            .field("product_cache_ttl", &self.product_cache_ttl)
            .finish()
    }
}

impl CommerceConfig {
    /// Settings for a backend at `backend_url` with defaults for everything else.
    #[must_use]
    pub const fn new(backend_url: Url) -> Self {
        Self {
            backend_url,
            publishable_key: None,
            amount_unit: AmountUnit::Major,
            timeout: Duration::from_secs(10),
            product_cache_ttl: Duration::from_secs(300),
        }
    }

    fn from_env() -> Result<Self, ConfigError> {
        let backend_url = parse_backend_url(&get_required_env("COMMERCE_BACKEND_URL")?)?;
        let publishable_key = get_optional_env("COMMERCE_PUBLISHABLE_KEY").map(SecretString::from);
        if publishable_key.is_none() {
            tracing::warn!("COMMERCE_PUBLISHABLE_KEY is not set; store API calls may be rejected");
        }

        Ok(Self {
            backend_url,
            publishable_key,
            amount_unit: parse_env("COMMERCE_AMOUNT_UNIT", "major")?,
            timeout: Duration::from_secs(parse_env("COMMERCE_TIMEOUT_SECS", "10")?),
            product_cache_ttl: Duration::from_secs(parse_env("PRODUCT_CACHE_TTL_SECS", "300")?),
        })
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env("STOREFRONT_PORT", "8000")?;
        let base_url = get_env_or_default("STOREFRONT_BASE_URL", "http://localhost:8000");
        let default_region = get_env_or_default("STOREFRONT_DEFAULT_REGION", "us").to_lowercase();
        let locale = get_env_or_default("STOREFRONT_LOCALE", "en-US");

        let commerce = CommerceConfig::from_env()?;

        let region_ttl_secs: u64 = parse_env("REGION_CACHE_TTL_SECS", "0")?;
        let region_cache_ttl = (region_ttl_secs > 0).then(|| Duration::from_secs(region_ttl_secs));

        Ok(Self {
            host,
            port,
            base_url,
            default_region,
            locale,
            commerce,
            region_cache_ttl,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Configuration for a storefront talking to `commerce`, with defaults elsewhere.
    #[must_use]
    pub fn with_commerce(commerce: CommerceConfig) -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 8000,
            base_url: "http://localhost:8000".to_string(),
            default_region: "us".to_string(),
            locale: "en-US".to_string(),
            commerce,
            region_cache_ttl: None,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the storefront is served over HTTPS.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    parse_value(key, &get_env_or_default(key, default))
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Validate the backend URL and strip any trailing slash from its path.
fn parse_backend_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |msg: String| ConfigError::InvalidEnvVar("COMMERCE_BACKEND_URL".to_string(), msg);

    let mut url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    let path = url.path().trim_end_matches('/').to_string();
    url.set_path(&path);
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_backend_url_strips_trailing_slash() {
        let url = parse_backend_url("http://localhost:9000/").unwrap();
        assert_eq!(url.as_str(), "http://localhost:9000/");
        assert_eq!(url.path(), "/");

        let url = parse_backend_url("https://api.lather.shop/medusa/").unwrap();
        assert_eq!(url.path(), "/medusa");
    }

    #[test]
    fn test_parse_backend_url_rejects_bad_input() {
        assert!(matches!(
            parse_backend_url("not a url"),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
        assert!(matches!(
            parse_backend_url("ftp://files.example.com"),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
    }

    #[test]
    fn test_parse_value() {
        let port: u16 = parse_value("STOREFRONT_PORT", "8080").unwrap();
        assert_eq!(port, 8080);

        let unit: AmountUnit = parse_value("COMMERCE_AMOUNT_UNIT", "heuristic").unwrap();
        assert_eq!(unit, AmountUnit::Heuristic);

        let err = parse_value::<u16>("STOREFRONT_PORT", "eighty").unwrap_err();
        assert!(err.to_string().contains("STOREFRONT_PORT"));
    }

    #[test]
    fn test_socket_addr() {
        let mut config = StorefrontConfig::with_commerce(CommerceConfig::new(
            Url::parse("http://localhost:9000").unwrap(),
        ));
        config.port = 3000;

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
        assert!(!config.is_secure());
    }

    #[test]
    fn test_commerce_config_debug_redacts_key() {
        let mut commerce = CommerceConfig::new(Url::parse("http://localhost:9000").unwrap());
        commerce.publishable_key = Some(SecretString::from("pk_super_secret_value"));

        let debug_output = format!("{commerce:?}");

        assert!(debug_output.contains("localhost:9000"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("pk_super_secret_value"));
    }
}
