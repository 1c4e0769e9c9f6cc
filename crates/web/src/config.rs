//! Site configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DELICIOUS_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `DELICIOUS_BASE_URL` - Public URL for the site
//! - `DELICIOUS_SESSION_SECRET` - Session secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `DELICIOUS_HOST` - Bind address (default: 127.0.0.1)
//! - `DELICIOUS_PORT` - Listen port (default: 7777)
//! - `DELICIOUS_UPLOADS_DIR` - Where resized photos are written (default: crates/web/public/uploads)
//! - `MAP_KEY` - Maps API key handed to the map page
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate, 0.0-1.0 (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate, 0.0-1.0 (default: 0.1)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Default uploads directory, relative to the workspace root.
pub const DEFAULT_UPLOADS_DIR: &str = "crates/web/public/uploads";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Web application configuration.
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the site
    pub base_url: String,
    /// Session secret, validated at startup
    pub session_secret: SecretString,
    /// Directory photos are written to and served from under `/uploads`
    pub uploads_dir: PathBuf,
    /// Maps API key for the map page
    pub map_key: Option<String>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (production, staging, ...)
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

impl WebConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("DELICIOUS_DATABASE_URL")?;
        let host = get_env_or_default("DELICIOUS_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("DELICIOUS_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("DELICIOUS_PORT", "7777")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("DELICIOUS_PORT".to_string(), e.to_string()))?;
        let base_url = get_required_env("DELICIOUS_BASE_URL")?;
        url::Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("DELICIOUS_BASE_URL".to_string(), e.to_string())
        })?;
        let session_secret = get_validated_secret("DELICIOUS_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "DELICIOUS_SESSION_SECRET")?;

        let uploads_dir = PathBuf::from(get_env_or_default(
            "DELICIOUS_UPLOADS_DIR",
            DEFAULT_UPLOADS_DIR,
        ));

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            uploads_dir,
            map_key: get_optional_env("MAP_KEY"),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: get_sample_rate("SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: get_sample_rate("SENTRY_TRACES_SAMPLE_RATE", 0.1)?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the site is served over HTTPS.
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

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse a 0.0-1.0 sample rate.
fn get_sample_rate(key: &str, default: f32) -> Result<f32, ConfigError> {
    let Some(raw) = get_optional_env(key) else {
        return Ok(default);
    };
    parse_sample_rate(&raw).map_err(|reason| ConfigError::InvalidEnvVar(key.to_string(), reason))
}

fn parse_sample_rate(raw: &str) -> Result<f32, String> {
    let rate = raw.trim().parse::<f32>().map_err(|e| e.to_string())?;
    if (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(format!("must be between 0.0 and 1.0 (got {rate})"))
    }
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> WebConfig {
        WebConfig {
            database_url: SecretString::from("postgres://localhost/delicious"),
            host: "127.0.0.1".parse().unwrap(),
            port: 7777,
            base_url: base_url.to_string(),
            session_secret: SecretString::from("x".repeat(32)),
            uploads_dir: PathBuf::from(DEFAULT_UPLOADS_DIR),
            map_key: None,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.1,
        }
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        assert!((shannon_entropy("zzzzzz") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("xyxy");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let err = validate_secret_strength("changeme-please-now", "DELICIOUS_SESSION_SECRET")
            .unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(ref var, _) if var == "DELICIOUS_SESSION_SECRET"));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength(&"ab".repeat(20), "K");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        assert!(validate_secret_strength("q8Z!vR3#mW7$kT1@pL5^nB9&hD2*", "K").is_ok());
    }

    #[test]
    fn test_validate_session_secret_length() {
        assert!(validate_session_secret(&SecretString::from("short"), "K").is_err());
        assert!(validate_session_secret(&SecretString::from("a".repeat(32)), "K").is_ok());
    }

    #[test]
    fn test_parse_sample_rate() {
        assert!((parse_sample_rate("0.25").unwrap() - 0.25).abs() < f32::EPSILON);
        assert!(parse_sample_rate("1.5").is_err());
        assert!(parse_sample_rate("lots").is_err());
    }

    #[test]
    fn test_socket_addr_default_port() {
        let addr = config("http://localhost:7777").socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 7777);
    }

    #[test]
    fn test_is_secure() {
        assert!(!config("http://localhost:7777").is_secure());
        assert!(config("https://delicious.example").is_secure());
    }
}
