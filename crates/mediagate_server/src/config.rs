//! Server configuration loading.

use config::{Config, Environment, File};
use mediagate_core::ReportConfig;
use mediagate_error::{ConfigError, MediagateResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Prefix of environment variables that override file settings.
const ENV_PREFIX: &str = "MEDIAGATE";

/// Listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Address to bind
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    9000
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerSettings {
    /// `host:port` for binding.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Complete gateway configuration.
///
/// # Example
///
/// ```toml
/// [server]
/// host = "0.0.0.0"
/// port = 9000
///
/// [scan]
/// base_url = "https://matrix.org"
/// temp_directory = "/tmp/mediagate"
/// script = "/usr/local/bin/scan.sh"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediagateConfig {
    /// Listener settings
    #[serde(default)]
    pub server: ServerSettings,
    /// Pipeline settings
    pub scan: ReportConfig,
}

impl MediagateConfig {
    /// Load configuration from a TOML file, then apply environment overrides.
    ///
    /// Environment variables use the `MEDIAGATE` prefix and `__` as the
    /// separator, e.g. `MEDIAGATE__SCAN__SCRIPT` or `MEDIAGATE__SERVER__PORT`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the file cannot be read, a value
    /// cannot be parsed, or the scan settings are incomplete.
    pub fn from_file(path: impl AsRef<Path>) -> MediagateResult<Self> {
        Self::load(path.as_ref(), Environment::with_prefix(ENV_PREFIX))
    }

    /// Like [`MediagateConfig::from_file`], with overrides taken from
    /// `variables` instead of the process environment.
    pub fn from_file_with_env(
        path: impl AsRef<Path>,
        variables: impl IntoIterator<Item = (String, String)>,
    ) -> MediagateResult<Self> {
        let variables: config::Map<String, String> = variables.into_iter().collect();
        Self::load(
            path.as_ref(),
            Environment::with_prefix(ENV_PREFIX).source(Some(variables)),
        )
    }

    fn load(path: &Path, environment: Environment) -> MediagateResult<Self> {
        debug!(path = %path.display(), "Loading configuration");

        let config: Self = Config::builder()
            .add_source(File::from(path))
            .add_source(
                environment
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| {
                ConfigError::new(format!(
                    "Failed to read configuration from {}: {}",
                    path.display(),
                    e
                ))
            })?
            .try_deserialize()
            .map_err(|e| ConfigError::new(format!("Failed to parse configuration: {}", e)))?;

        config.scan.validate()?;
        debug!(
            address = %config.server.address(),
            base_url = %config.scan.base_url(),
            "Configuration loaded"
        );
        Ok(config)
    }
}
