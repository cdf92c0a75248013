//! EET client configuration.
//!
//! Selects the service environment and transport settings. Defaults point
//! to the playground (test) service. Override via environment variables or
//! explicit construction.

use url::Url;

/// Playground endpoint. Accepts any certificate issued for testing and
/// never registers sales.
pub const PLAYGROUND_URL: &str = "https://pg.eet.cz:443/eet/services/EETServiceSOAP/v3";

/// Production endpoint.
pub const PRODUCTION_URL: &str = "https://prod.eet.cz:443/eet/services/EETServiceSOAP/v3";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Registration service environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Environment {
    /// Test service.
    #[default]
    Playground,
    /// Live service.
    Production,
}

impl Environment {
    /// Canonical endpoint of this environment.
    pub fn endpoint_url(&self) -> &'static str {
        match self {
            Self::Playground => PLAYGROUND_URL,
            Self::Production => PRODUCTION_URL,
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "playground" | "pg" => Ok(Self::Playground),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(ConfigError::InvalidEnvironment(s.to_string())),
        }
    }
}

/// Configuration for submitting registrations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EetConfig {
    /// Target environment.
    pub environment: Environment,
    /// Endpoint the requests are posted to. Defaults to the environment's
    /// endpoint.
    pub endpoint: Url,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Send every request with `overeni="true"` (checked, not registered).
    pub verification_mode: bool,
}

impl EetConfig {
    /// Configuration for an environment with default settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` if the built-in endpoint fails to
    /// parse (does not occur, but avoids `expect()`).
    pub fn for_environment(environment: Environment) -> Result<Self, ConfigError> {
        let endpoint = parse_url("endpoint", environment.endpoint_url())?;
        Ok(Self {
            environment,
            endpoint,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            verification_mode: false,
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `EET_ENVIRONMENT` (`playground` | `production`, default: `playground`)
    /// - `EET_ENDPOINT_URL` (default: the environment's endpoint)
    /// - `EET_TIMEOUT_SECS` (default: 5)
    /// - `EET_VERIFICATION_MODE` (`true` | `1` to enable, default: off)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("EET_ENVIRONMENT") {
            Some(s) => s.parse()?,
            None => Environment::default(),
        };
        let mut config = Self::for_environment(environment)?;

        if let Some(raw) = lookup("EET_ENDPOINT_URL") {
            config.endpoint = parse_url("EET_ENDPOINT_URL", &raw)?;
        }
        config.timeout_secs = lookup("EET_TIMEOUT_SECS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        config.verification_mode = lookup("EET_VERIFICATION_MODE")
            .map(|s| matches!(s.to_ascii_lowercase().as_str(), "true" | "1"))
            .unwrap_or(false);

        Ok(config)
    }

    /// Create a configuration pointing to a local mock server (for testing).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` if the localhost URL cannot be parsed.
    pub fn local_mock(port: u16) -> Result<Self, ConfigError> {
        Ok(Self {
            environment: Environment::Playground,
            endpoint: parse_url(
                "localhost",
                &format!("http://127.0.0.1:{port}/eet/services/EETServiceSOAP/v3"),
            )?,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            verification_mode: false,
        })
    }
}

fn parse_url(name: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(name.to_string(), e.to_string()))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("unknown EET environment {0:?} (expected playground or production)")]
    InvalidEnvironment(String),
}
