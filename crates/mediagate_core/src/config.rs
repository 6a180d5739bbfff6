//! Pipeline configuration.

use derive_getters::Getters;
use mediagate_error::{ConfigError, MediagateResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings every pipeline invocation needs.
///
/// All three fields are required; a missing or empty value is a
/// configuration error raised at construction, before any I/O.
///
/// # Examples
///
/// ```
/// use mediagate_core::ReportConfig;
///
/// let config = ReportConfig::builder()
///     .base_url("https://matrix.example")
///     .temp_directory("/tmp/mediagate")
///     .script("/usr/local/bin/scan.sh")
///     .build()
///     .unwrap();
/// assert_eq!(config.base_url(), "https://matrix.example");
///
/// let missing = ReportConfig::builder().base_url("https://matrix.example").build();
/// assert!(missing.is_err());
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Getters,
    derive_builder::Builder,
)]
#[builder(setter(into), build_fn(private, name = "build_internal"))]
pub struct ReportConfig {
    /// Root of the media repository, e.g. `https://matrix.org`
    base_url: String,
    /// Directory under which per-request workspaces are created
    temp_directory: PathBuf,
    /// Scanner command, invoked with the file path as its only argument
    script: String,
}

impl ReportConfig {
    /// Create a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if any value is empty.
    pub fn new(
        base_url: impl Into<String>,
        temp_directory: impl Into<PathBuf>,
        script: impl Into<String>,
    ) -> MediagateResult<Self> {
        let config = Self {
            base_url: base_url.into(),
            temp_directory: temp_directory.into(),
            script: script.into(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Creates a new config builder.
    pub fn builder() -> ReportConfigBuilder {
        ReportConfigBuilder::default()
    }

    /// Check that no required value is empty.
    ///
    /// Deserialized configurations bypass the builder and must call this.
    pub fn validate(&self) -> MediagateResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::new("base_url must not be empty").into());
        }
        if self.temp_directory.as_os_str().is_empty() {
            return Err(ConfigError::new("temp_directory must not be empty").into());
        }
        if self.script.trim().is_empty() {
            return Err(ConfigError::new("script must not be empty").into());
        }
        Ok(())
    }
}

impl ReportConfigBuilder {
    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a field is missing or empty.
    pub fn build(&self) -> MediagateResult<ReportConfig> {
        let config = self
            .build_internal()
            .map_err(|e| ConfigError::new(format!("Invalid report configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }
}
