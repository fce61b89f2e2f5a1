//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `AURA_API_URL` - Base URL of the catalog API (default: <http://localhost:8000>)
//! - `AURA_DATA_DIR` - Directory for durable client state (default: `$HOME/.aura`)
//! - `AURA_REQUEST_TIMEOUT_SECS` - Per-request timeout in seconds (default: 10)
//! - `AURA_CURRENCY` - ISO 4217 code for catalog prices (default: INR)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use aura_core::CurrencyCode;

const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the catalog API.
    pub api_url: Url,
    /// Directory holding the durable key-value store.
    pub data_dir: PathBuf,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Currency the catalog prices are denominated in. The API sends bare
    /// numbers; this code is attached when prices enter the cart.
    pub currency: CurrencyCode,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a set variable fails to parse. Unset
    /// variables fall back to defaults; nothing is required.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_url = parse_env("AURA_API_URL", DEFAULT_API_URL, Url::parse)?;
        let data_dir = std::env::var("AURA_DATA_DIR")
            .map_or_else(|_| default_data_dir(), PathBuf::from);
        let request_timeout = parse_env(
            "AURA_REQUEST_TIMEOUT_SECS",
            &DEFAULT_TIMEOUT_SECS.to_string(),
            |s| s.parse::<u64>().map(Duration::from_secs),
        )?;
        let currency = match get_env_or_default("AURA_CURRENCY", "INR").as_str() {
            "INR" => CurrencyCode::INR,
            "USD" => CurrencyCode::USD,
            "EUR" => CurrencyCode::EUR,
            "GBP" => CurrencyCode::GBP,
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "AURA_CURRENCY".to_string(),
                    format!("unsupported currency code: {other}"),
                ));
            }
        };

        Ok(Self {
            api_url,
            data_dir,
            request_timeout,
            currency,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable (or its default) with the given parser.
fn parse_env<T, E: std::fmt::Display>(
    key: &str,
    default: &str,
    parse: impl Fn(&str) -> Result<T, E>,
) -> Result<T, ConfigError> {
    let value = get_env_or_default(key, default);
    parse(&value).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Default state directory: `$HOME/.aura`, or `./.aura` when HOME is unset.
fn default_data_dir() -> PathBuf {
    std::env::var("HOME").map_or_else(|_| PathBuf::from(".aura"), |home| {
        PathBuf::from(home).join(".aura")
    })
}
