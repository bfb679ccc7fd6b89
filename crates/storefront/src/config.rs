//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `MERCADITO_TOKEN_SECRET` - Bearer token signing secret (min 32 chars)
//!
//! ## Optional
//! - `MERCADITO_HOST` - Bind address (default: 127.0.0.1)
//! - `MERCADITO_PORT` - Listen port (default: 8080)
//! - `MERCADITO_BASE_URL` - Public URL (default: `http://localhost:8080`)
//! - `MERCADITO_SESSION_TTL_SECS` - Server session inactivity TTL (default: 3600)
//! - `MERCADITO_TOKEN_TTL_SECS` - Bearer token lifetime (default: 43200, i.e. 12h)
//! - `MERCADITO_ADMIN_EMAIL` / `MERCADITO_ADMIN_PASSWORD` - Reserved admin
//!   credential pair; the reserved-admin login path is disabled unless both
//!   are set
//! - `MERCADITO_ADMIN_TTL_SECS` - Lifetime of the materialized admin record
//!   (default: 10)
//! - `GITHUB_CLIENT_ID` / `GITHUB_CLIENT_SECRET` - OAuth app credentials;
//!   the GitHub login path is disabled unless both are set
//! - `GITHUB_CALLBACK_URL` - OAuth callback (default: `{base_url}/githubcallback`)

use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use mercadito_core::Email;

const MIN_TOKEN_SECRET_LENGTH: usize = 32;

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

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Bearer token signing secret
    pub token_secret: SecretString,
    /// Server-side session inactivity TTL in seconds
    pub session_ttl_secs: i64,
    /// Bearer token lifetime in seconds
    pub token_ttl_secs: i64,
    /// Reserved admin credential pair (None disables the reserved path)
    pub reserved_admin: Option<ReservedAdminConfig>,
    /// Lifetime of the materialized admin record in seconds
    pub admin_ttl_secs: u64,
    /// GitHub OAuth app configuration (None disables the OAuth path)
    pub github: Option<GitHubConfig>,
}

/// The reserved admin credential pair and the template attributes used when
/// the transient admin record is materialized.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct ReservedAdminConfig {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub age: i32,
    pub password: SecretString,
}

impl std::fmt::Debug for ReservedAdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReservedAdminConfig")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("age", &self.age)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// GitHub OAuth app configuration.
///
/// Implements `Debug` manually to redact the client secret.
#[derive(Clone)]
pub struct GitHubConfig {
    pub client_id: String,
    pub client_secret: SecretString,
    pub callback_url: String,
}

impl std::fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("callback_url", &self.callback_url)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the token secret fails the minimum-length check.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("MERCADITO_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("MERCADITO_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("MERCADITO_PORT", "8080")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("MERCADITO_PORT".to_string(), e.to_string()))?;
        let base_url = get_env_or_default("MERCADITO_BASE_URL", "http://localhost:8080");

        let token_secret = SecretString::from(get_required_env("MERCADITO_TOKEN_SECRET")?);
        validate_token_secret(&token_secret, "MERCADITO_TOKEN_SECRET")?;

        let session_ttl_secs = parse_env_or_default("MERCADITO_SESSION_TTL_SECS", 3600)?;
        let token_ttl_secs = parse_env_or_default("MERCADITO_TOKEN_TTL_SECS", 12 * 60 * 60)?;
        let admin_ttl_secs = parse_env_or_default("MERCADITO_ADMIN_TTL_SECS", 10)?;

        let reserved_admin = reserved_admin_from_env()?;
        let github = github_from_env(&base_url);

        Ok(Self {
            host,
            port,
            base_url,
            token_secret,
            session_ttl_secs,
            token_ttl_secs,
            reserved_admin,
            admin_ttl_secs,
            github,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Load the reserved admin credential pair, if configured.
fn reserved_admin_from_env() -> Result<Option<ReservedAdminConfig>, ConfigError> {
    let (Some(email), Some(password)) = (
        get_optional_env("MERCADITO_ADMIN_EMAIL"),
        get_optional_env("MERCADITO_ADMIN_PASSWORD"),
    ) else {
        return Ok(None);
    };

    let email = Email::parse(&email)
        .map_err(|e| ConfigError::InvalidEnvVar("MERCADITO_ADMIN_EMAIL".to_string(), e.to_string()))?;

    Ok(Some(ReservedAdminConfig {
        first_name: get_env_or_default("MERCADITO_ADMIN_FIRST_NAME", "Admin"),
        last_name: get_env_or_default("MERCADITO_ADMIN_LAST_NAME", "Coder"),
        email,
        age: 0,
        password: SecretString::from(password),
    }))
}

/// Load the GitHub OAuth app configuration, if configured.
fn github_from_env(base_url: &str) -> Option<GitHubConfig> {
    let client_id = get_optional_env("GITHUB_CLIENT_ID")?;
    let client_secret = get_optional_env("GITHUB_CLIENT_SECRET")?;

    let callback_url = get_env_or_default(
        "GITHUB_CALLBACK_URL",
        &format!("{base_url}/githubcallback"),
    );

    Some(GitHubConfig {
        client_id,
        client_secret: SecretString::from(client_secret),
        callback_url,
    })
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
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse a numeric environment variable with a default value.
fn parse_env_or_default<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(value) => value
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

/// Validate that the token signing secret meets minimum length requirements.
fn validate_token_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_TOKEN_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_TOKEN_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_token_secret_too_short() {
        let secret = SecretString::from("short");
        assert!(validate_token_secret(&secret, "TEST_SECRET").is_err());
    }

    #[test]
    fn test_validate_token_secret_valid_length() {
        let secret = SecretString::from("x".repeat(32));
        assert!(validate_token_secret(&secret, "TEST_SECRET").is_ok());
    }

    #[test]
    fn test_socket_addr() {
        let config = StorefrontConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 8080,
            base_url: "http://localhost:8080".to_string(),
            token_secret: SecretString::from("x".repeat(32)),
            session_ttl_secs: 3600,
            token_ttl_secs: 43200,
            reserved_admin: None,
            admin_ttl_secs: 10,
            github: None,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 8080);
    }

    #[test]
    fn test_github_config_debug_redacts_secret() {
        let config = GitHubConfig {
            client_id: "client_id_value".to_string(),
            client_secret: SecretString::from("super_secret_value"),
            callback_url: "http://localhost:8080/githubcallback".to_string(),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("client_id_value"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_value"));
    }

    #[test]
    fn test_reserved_admin_debug_redacts_password() {
        let config = ReservedAdminConfig {
            first_name: "Admin".to_string(),
            last_name: "Coder".to_string(),
            email: Email::parse("admin@example.com").unwrap(),
            age: 0,
            password: SecretString::from("super_secret_value"),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_value"));
    }
}
