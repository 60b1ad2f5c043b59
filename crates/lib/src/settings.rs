//! Runtime configuration for the store set.
//!
//! Settings decide which adapters exist for this process: the durable store
//! when a URL is configured, the volatile store always, and the local-file
//! store only outside production.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::reconcile::DEFAULT_ADAPTER_TIMEOUT;

/// Execution context this process runs in.
///
/// The local-file store is a development convenience and is never enabled in
/// [`Environment::Production`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Environment {
    Production,
    #[default]
    Development,
    Test,
}

impl Environment {
    pub fn is_production(self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl std::str::FromStr for Environment {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "production" | "prod" => Ok(Environment::Production),
            "development" | "dev" => Ok(Environment::Development),
            "test" => Ok(Environment::Test),
            other => Err(SettingsError::InvalidEnvironment {
                value: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Production => write!(f, "production"),
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
        }
    }
}

/// Store-set configuration.
#[derive(Clone, Debug)]
pub struct Settings {
    /// Execution context; gates the local-file store.
    pub environment: Environment,

    /// Connection URL for the durable store (`sqlite:` or `postgres:`).
    /// `None` leaves the durable store unconfigured.
    pub durable_url: Option<String>,

    /// Path of the local-file store. `None` disables it even outside
    /// production.
    pub local_file_path: Option<PathBuf>,

    /// Per-adapter deadline for reads and writes. A slow store is degraded
    /// to unavailable for the affected call, never allowed to block its
    /// siblings.
    pub adapter_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            durable_url: None,
            local_file_path: None,
            adapter_timeout: DEFAULT_ADAPTER_TIMEOUT,
        }
    }
}

impl Settings {
    /// Read settings from the `IDMESH_*` environment variables.
    ///
    /// - `IDMESH_ENV`: `production` | `development` | `test` (default
    ///   development)
    /// - `IDMESH_DATABASE_URL`: durable store connection URL
    /// - `IDMESH_LOCAL_STORE`: local-file store path
    /// - `IDMESH_ADAPTER_TIMEOUT_MS`: per-adapter deadline in milliseconds
    pub fn from_env() -> crate::Result<Self> {
        let mut settings = Self::default();
        if let Ok(env) = std::env::var("IDMESH_ENV") {
            settings.environment = env.parse()?;
        }
        if let Ok(url) = std::env::var("IDMESH_DATABASE_URL") {
            settings.durable_url = Some(url);
        }
        if let Ok(path) = std::env::var("IDMESH_LOCAL_STORE") {
            settings.local_file_path = Some(PathBuf::from(path));
        }
        if let Ok(ms) = std::env::var("IDMESH_ADAPTER_TIMEOUT_MS") {
            let ms: u64 = ms
                .parse()
                .map_err(|_| SettingsError::InvalidTimeout { value: ms.clone() })?;
            settings.adapter_timeout = Duration::from_millis(ms);
        }
        Ok(settings)
    }
}

/// Errors that can occur while reading configuration.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SettingsError {
    /// `IDMESH_ENV` held an unknown value.
    #[error("unknown environment: {value:?} (expected production, development or test)")]
    InvalidEnvironment {
        /// The unrecognized value
        value: String,
    },

    /// `IDMESH_ADAPTER_TIMEOUT_MS` was not a number.
    #[error("invalid adapter timeout: {value:?} (expected milliseconds)")]
    InvalidTimeout {
        /// The unparsable value
        value: String,
    },
}

// Conversion from SettingsError to the main Error type
impl From<SettingsError> for crate::Error {
    fn from(err: SettingsError) -> Self {
        crate::Error::Settings(err)
    }
}
