//! Harness configuration loading via `ortho-config`.

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::fixture::SnapshotFixture;

/// Environment variable gating live acceptance runs.
pub const ACCEPTANCE_ENV: &str = "STACKCHECK_ACC";

/// Harness configuration derived from environment variables, configuration
/// files, and CLI flags.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(prefix = "STACKCHECK")]
pub struct HarnessConfig {
    /// Orchestration CLI binary driven by the engine. Defaults to `tofu`.
    #[ortho_config(default = "tofu".to_owned())]
    pub engine_bin: String,
    /// Root directory under which per-case working directories are created.
    #[ortho_config(default = ".stackcheck".to_owned())]
    pub work_root: String,
    /// Provider-published image queried by the public-image cases.
    #[ortho_config(default = "CentOS 7.4 64bit".to_owned())]
    pub public_image: String,
    /// CPU architecture used when narrowing public-image queries.
    #[ortho_config(default = "x86".to_owned())]
    pub architecture: String,
    /// Image the snapshot fixture boots its builder instance from.
    #[ortho_config(default = "Ubuntu 18.04 server 64bit".to_owned())]
    pub builder_image: String,
    /// Subnet looked up for fixture instance networking.
    #[ortho_config(default = "subnet-default".to_owned())]
    pub subnet_name: String,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(
        description: &'static str,
        env_var: &'static str,
        toml_key: &'static str,
    ) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }
}

impl HarnessConfig {
    fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::MissingField(format!(
                "missing {}: set {} or add {} to stackcheck.toml",
                metadata.description, metadata.env_var, metadata.toml_key
            )));
        }
        Ok(())
    }

    /// Loads configuration using the `ortho-config` derive. Values merge
    /// defaults, configuration files, environment variables, and CLI flags
    /// in that order of precedence.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the loader fails to merge
    /// sources.
    pub fn load_from_sources() -> Result<Self, ConfigError> {
        Self::load().map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Loads configuration without attempting to parse CLI arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("stackcheck")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Performs semantic validation on required fields. Error messages
    /// include guidance on how to provide missing values via environment
    /// variables or configuration files.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a required field is
    /// empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::require_field(
            &self.engine_bin,
            &FieldMetadata::new(
                "orchestration CLI binary",
                "STACKCHECK_ENGINE_BIN",
                "engine_bin",
            ),
        )?;
        Self::require_field(
            &self.work_root,
            &FieldMetadata::new(
                "working directory root",
                "STACKCHECK_WORK_ROOT",
                "work_root",
            ),
        )?;
        Self::require_field(
            &self.public_image,
            &FieldMetadata::new(
                "public image name",
                "STACKCHECK_PUBLIC_IMAGE",
                "public_image",
            ),
        )?;
        Self::require_field(
            &self.architecture,
            &FieldMetadata::new(
                "CPU architecture",
                "STACKCHECK_ARCHITECTURE",
                "architecture",
            ),
        )?;
        Self::require_field(
            &self.builder_image,
            &FieldMetadata::new(
                "builder image name",
                "STACKCHECK_BUILDER_IMAGE",
                "builder_image",
            ),
        )?;
        Self::require_field(
            &self.subnet_name,
            &FieldMetadata::new("subnet name", "STACKCHECK_SUBNET_NAME", "subnet_name"),
        )?;
        Ok(())
    }

    /// Builds the snapshot fixture for one acceptance run, applying the
    /// configured builder image and subnet.
    #[must_use]
    pub fn fixture(&self, run_id: impl Into<String>) -> SnapshotFixture {
        SnapshotFixture::new(run_id)
            .builder_image(&self.builder_image)
            .subnet_name(&self.subnet_name)
    }

    /// Working directory for one acceptance run.
    #[must_use]
    pub fn workdir(&self, run_id: &str) -> Utf8PathBuf {
        Utf8PathBuf::from(&self.work_root).join(run_id)
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
