//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `COMMERCE_PUBLIC_KEY` - Public API key of the hosted commerce store (`pk_...`)
//!
//! ## Optional
//! - `COMMERCE_API_URL` - Commerce API base URL (default: <https://api.chec.io/v1>)
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_PREFERENCES_PATH` - Preference file (default: .cartsync/preferences.json)
//! - `CART_QUEUE_CAPACITY` - Pending cart operations before callers wait (default: 64)
//! - `CATALOG_CACHE_TTL_SECS` - Product listing cache lifetime (default: 300)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Performance trace sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "https://api.chec.io/v1";
const DEFAULT_PREFERENCES_PATH: &str = ".cartsync/preferences.json";
const PUBLIC_KEY_PREFIX: &str = "pk_";
const SECRET_KEY_PREFIX: &str = "sk_";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "your_",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "insert",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure key in {0}: {1}")]
    InsecureKey(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Hosted commerce API configuration
    pub commerce: CommerceConfig,
    /// Cart controller tuning
    pub sync: SyncConfig,
    /// Where the theme preference is persisted
    pub preferences_path: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production")
    pub sentry_environment: Option<String>,
    /// Fraction of error events sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// Hosted commerce API configuration.
///
/// Implements `Debug` manually to redact the key.
#[derive(Clone)]
pub struct CommerceConfig {
    /// API base URL, without trailing slash
    pub api_url: Url,
    /// Public API key, sent as `X-Authorization`
    pub public_key: SecretString,
}

impl std::fmt::Debug for CommerceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommerceConfig")
            .field("api_url", &self.api_url.as_str())
            .field("public_key", &"[REDACTED]")
            .finish()
    }
}

/// Cart controller configuration.
#[derive(Debug, Clone, Copy)]
pub struct SyncConfig {
    /// Capacity of the mutation queue
    pub queue_capacity: usize,
    /// Lifetime of cached catalog listings
    pub catalog_cache_ttl: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 64,
            catalog_cache_ttl: Duration::from_secs(300),
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid, or
    /// if the commerce key is a placeholder or a secret key.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env("STOREFRONT_PORT", "3000")?;
        let commerce = CommerceConfig::from_env()?;
        let sync = SyncConfig::from_env()?;
        let preferences_path = preferences_path_from_env();

        Ok(Self {
            host,
            port,
            commerce,
            sync,
            preferences_path,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl CommerceConfig {
    /// Load the commerce API settings on their own.
    ///
    /// Used by the CLI, which needs no server settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the key is missing or unusable, or the URL
    /// does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw_url = get_env_or_default("COMMERCE_API_URL", DEFAULT_API_URL);
        let api_url = Url::parse(raw_url.trim_end_matches('/')).map_err(|e| {
            ConfigError::InvalidEnvVar("COMMERCE_API_URL".to_string(), e.to_string())
        })?;

        let public_key = get_required_env("COMMERCE_PUBLIC_KEY")?;
        validate_public_key(&public_key, "COMMERCE_PUBLIC_KEY")?;

        Ok(Self {
            api_url,
            public_key: SecretString::from(public_key),
        })
    }

    /// Expose the key for the request header.
    #[must_use]
    pub fn public_key(&self) -> &str {
        self.public_key.expose_secret()
    }
}

impl SyncConfig {
    /// Load the controller tuning on its own.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a value does not parse or the queue capacity
    /// is zero.
    pub fn from_env() -> Result<Self, ConfigError> {
        let queue_capacity: usize = parse_env("CART_QUEUE_CAPACITY", "64")?;
        if queue_capacity == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "CART_QUEUE_CAPACITY".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        let ttl_secs: u64 = parse_env("CATALOG_CACHE_TTL_SECS", "300")?;

        Ok(Self {
            queue_capacity,
            catalog_cache_ttl: Duration::from_secs(ttl_secs),
        })
    }
}

/// Location of the preference file.
#[must_use]
pub fn preferences_path_from_env() -> PathBuf {
    PathBuf::from(get_env_or_default(
        "STOREFRONT_PREFERENCES_PATH",
        DEFAULT_PREFERENCES_PATH,
    ))
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Reject placeholders and secret keys.
///
/// The storefront only ever talks to the public side of the commerce API.
fn validate_public_key(key: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = key.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureKey(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    if key.starts_with(SECRET_KEY_PREFIX) {
        return Err(ConfigError::InsecureKey(
            var_name.to_string(),
            "is a secret key; use the public key instead".to_string(),
        ));
    }

    if !key.starts_with(PUBLIC_KEY_PREFIX) || key.len() <= PUBLIC_KEY_PREFIX.len() {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("must start with '{PUBLIC_KEY_PREFIX}'"),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_public_key_placeholder() {
        let result = validate_public_key("pk_your-key-here", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureKey(_, _))));
    }

    #[test]
    fn test_validate_public_key_rejects_secret_key() {
        let result = validate_public_key("sk_184625ed86f36703d7d233bcf6d519a8", "TEST_VAR");
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::InsecureKey(_, _)));
        assert!(err.to_string().contains("secret key"));
    }

    #[test]
    fn test_validate_public_key_requires_prefix() {
        assert!(matches!(
            validate_public_key("184625ed86f36703d7d233bcf6d519a8", "TEST_VAR"),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
        assert!(validate_public_key("pk_", "TEST_VAR").is_err());
    }

    #[test]
    fn test_validate_public_key_valid() {
        assert!(validate_public_key("pk_184625ed86f36703d7d233bcf6d519a8", "TEST_VAR").is_ok());
    }

    #[test]
    fn test_sync_config_default() {
        let sync = SyncConfig::default();
        assert_eq!(sync.queue_capacity, 64);
        assert_eq!(sync.catalog_cache_ttl, Duration::from_secs(300));
    }

    #[test]
    fn test_socket_addr() {
        let config = StorefrontConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            commerce: CommerceConfig {
                api_url: Url::parse(DEFAULT_API_URL).unwrap(),
                public_key: SecretString::from("pk_test"),
            },
            sync: SyncConfig::default(),
            preferences_path: PathBuf::from(DEFAULT_PREFERENCES_PATH),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_commerce_config_debug_redacts_key() {
        let config = CommerceConfig {
            api_url: Url::parse(DEFAULT_API_URL).unwrap(),
            public_key: SecretString::from("pk_super_private_value"),
        };

        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("api.chec.io"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("pk_super_private_value"));
    }
}
