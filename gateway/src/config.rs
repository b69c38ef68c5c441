use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Listener and admin listener cannot share {0}")]
    ListenerConflict(String),

    #[error("Backend URL must use http or https, got {0}")]
    UnsupportedScheme(String),

    #[error("Backend compatibility version cannot be 0")]
    InvalidCompatibilityVersion,

    #[error("Insert timeout cannot be 0")]
    InvalidInsertTimeout,
}

/// Gateway configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Listener for the document API
    #[serde(default = "Listener::api_default")]
    pub listener: Listener,
    /// Listener for the health and readiness probes
    #[serde(default = "Listener::admin_default")]
    pub admin_listener: Listener,
    /// Search backend the operations are forwarded to
    #[serde(default)]
    pub backend: BackendConfig,
    /// Timeout applied to document writes, in seconds
    #[serde(default = "default_insert_timeout_secs")]
    pub insert_timeout_secs: u64,
}

impl Config {
    /// Validates the gateway configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.admin_listener.validate()?;

        if self.listener == self.admin_listener {
            return Err(ValidationError::ListenerConflict(format!(
                "{}:{}",
                self.listener.host, self.listener.port
            )));
        }

        self.backend.validate()?;

        if self.insert_timeout_secs == 0 {
            return Err(ValidationError::InvalidInsertTimeout);
        }

        Ok(())
    }

    pub fn insert_timeout(&self) -> Duration {
        Duration::from_secs(self.insert_timeout_secs)
    }
}

fn default_insert_timeout_secs() -> u64 {
    10
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Listener {
    fn api_default() -> Self {
        Listener {
            host: "127.0.0.1".into(),
            port: 8080,
        }
    }

    fn admin_default() -> Self {
        Listener {
            host: "127.0.0.1".into(),
            port: 8081,
        }
    }

    /// Validates the listener configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

/// How backend clients are created for each operation
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClientStrategy {
    /// A new client per operation, closed when the operation ends
    #[default]
    PerRequest,
    /// One shared connection pool, caller headers attached per request
    Pooled,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct BackendConfig {
    /// Base URL of the backend REST API
    #[serde(default = "default_backend_url")]
    pub url: Url,
    /// Major version passed in the `compatible-with` media type parameter
    #[serde(default = "default_compatible_with")]
    pub compatible_with: u8,
    #[serde(default)]
    pub strategy: ClientStrategy,
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig {
            url: default_backend_url(),
            compatible_with: default_compatible_with(),
            strategy: ClientStrategy::default(),
        }
    }
}

impl BackendConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !matches!(self.url.scheme(), "http" | "https") {
            return Err(ValidationError::UnsupportedScheme(
                self.url.scheme().to_string(),
            ));
        }

        if self.compatible_with == 0 {
            return Err(ValidationError::InvalidCompatibilityVersion);
        }

        Ok(())
    }
}

const DEFAULT_BACKEND_URL: &str = "http://localhost:9200";

fn default_backend_url() -> Url {
    Url::parse(DEFAULT_BACKEND_URL).expect("default backend url is valid")
}

fn default_compatible_with() -> u8 {
    7
}
