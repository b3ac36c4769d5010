//! Leftover-resource sweeper for acceptance runs.
//!
//! Acceptance cases provision real cloud resources; when a run dies before
//! teardown, images and builder instances stay behind. The sweeper finds
//! them through the provider CLI using the per-run tag the fixture plants
//! (`acc-run=<id>`) and the generated instance name, deletes them, and
//! fails if anything remains afterwards.

use std::collections::BTreeMap;
use std::ffi::OsString;

use camino::Utf8Path;
use serde::Deserialize;
use thiserror::Error;

use crate::command::{CommandError, CommandOutput, CommandRunner, ProcessCommandRunner};
use crate::fixture::{NAME_PREFIX, RUN_TAG_KEY};

/// Environment variable used by test harnesses to identify a run.
pub const RUN_ID_ENV: &str = "STACKCHECK_RUN_ID";

/// Default provider CLI binary name.
pub const DEFAULT_PROVIDER_BIN: &str = "cumulus";

/// Configuration for a sweeper pass.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SweepConfig {
    /// Project id to scope resource discovery.
    pub project_id: String,
    /// Run identifier the fixture tagged resources with.
    pub run_id: String,
    /// Path to the provider CLI binary.
    pub provider_bin: String,
}

impl SweepConfig {
    /// Constructs a config, trimming whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`SweepError::InvalidConfig`] when any required field is
    /// blank.
    pub fn new(
        project_id: impl Into<String>,
        run_id: impl Into<String>,
        provider_bin: impl Into<String>,
    ) -> Result<Self, SweepError> {
        let config = Self {
            project_id: project_id.into().trim().to_owned(),
            run_id: run_id.into().trim().to_owned(),
            provider_bin: provider_bin.into().trim().to_owned(),
        };
        for (field, value) in [
            ("project_id", &config.project_id),
            ("run_id", &config.run_id),
            ("provider_bin", &config.provider_bin),
        ] {
            if value.is_empty() {
                return Err(SweepError::InvalidConfig {
                    field: field.to_owned(),
                });
            }
        }
        Ok(config)
    }

    /// Instance name the fixture generated for this run.
    #[must_use]
    pub fn instance_name(&self) -> String {
        format!("{NAME_PREFIX}{}", self.run_id)
    }
}

/// Summary of sweeper work.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SweepSummary {
    /// Number of images deleted during the sweep.
    pub deleted_images: usize,
    /// Number of compute instances deleted during the sweep.
    pub deleted_instances: usize,
}

/// Errors returned by the sweeper.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum SweepError {
    /// Raised when configuration is missing required values.
    #[error("missing {field}")]
    InvalidConfig {
        /// Name of the missing or invalid field.
        field: String,
    },
    /// Raised when the provider CLI returns a non-zero exit status.
    #[error("{program} exited with status {status_text}: {stderr}")]
    CommandFailure {
        /// Program that failed.
        program: String,
        /// Exit status reported by the OS.
        status: Option<i32>,
        /// Human readable representation of the exit status.
        status_text: String,
        /// Stderr captured from the command.
        stderr: String,
    },
    /// Raised when JSON output from the CLI cannot be parsed.
    #[error("failed to parse {resource} output: {message}")]
    Parse {
        /// Resource type being parsed (for example `images`).
        resource: String,
        /// Parser error message.
        message: String,
    },
    /// Raised when resources remain after the sweep.
    #[error("resources remain after sweep: {message}")]
    NotClean {
        /// Human-readable description of what remains.
        message: String,
    },
    /// Raised when command execution fails.
    #[error(transparent)]
    Runner(#[from] CommandError),
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
struct ProviderImage {
    id: String,
    #[serde(default)]
    tags: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
struct ProviderInstance {
    id: String,
    #[serde(default)]
    name: String,
}

/// Deletes run-scoped cloud resources by shelling out to the provider CLI.
#[derive(Clone, Debug)]
pub struct Sweeper<R: CommandRunner> {
    config: SweepConfig,
    runner: R,
}

impl Sweeper<ProcessCommandRunner> {
    /// Creates a sweeper wired to the real process runner.
    #[must_use]
    pub const fn with_process_runner(config: SweepConfig) -> Self {
        Self::new(config, ProcessCommandRunner)
    }
}

impl<R: CommandRunner> Sweeper<R> {
    /// Creates a new sweeper using the provided configuration and runner.
    #[must_use]
    pub const fn new(config: SweepConfig, runner: R) -> Self {
        Self { config, runner }
    }

    /// Performs a sweep and returns how many resources were deleted.
    ///
    /// Images are deleted first so no snapshot pins its source instance,
    /// then the builder instances. The sweep fails if any run-scoped
    /// resources remain at the end.
    ///
    /// # Errors
    ///
    /// Returns [`SweepError`] when the provider CLI fails, output cannot be
    /// parsed, or resources remain after deletion attempts.
    pub fn sweep(&self) -> Result<SweepSummary, SweepError> {
        let mut deleted_images = 0;
        for image in self.run_images()? {
            self.delete_image(&image)?;
            deleted_images += 1;
        }

        let mut deleted_instances = 0;
        for instance in self.run_instances()? {
            self.delete_instance(&instance)?;
            deleted_instances += 1;
        }

        let remaining_images = self.run_images()?;
        let remaining_instances = self.run_instances()?;
        if !remaining_images.is_empty() || !remaining_instances.is_empty() {
            let names = remaining_images
                .iter()
                .map(|image| image.id.as_str())
                .chain(remaining_instances.iter().map(|instance| instance.id.as_str()))
                .collect::<Vec<_>>()
                .join(", ");
            return Err(SweepError::NotClean { message: names });
        }

        Ok(SweepSummary {
            deleted_images,
            deleted_instances,
        })
    }

    fn run_images(&self) -> Result<Vec<ProviderImage>, SweepError> {
        let images: Vec<ProviderImage> = self.list_resources(&["image"], "images")?;
        Ok(images
            .into_iter()
            .filter(|image| {
                image
                    .tags
                    .get(RUN_TAG_KEY)
                    .is_some_and(|value| *value == self.config.run_id)
            })
            .collect())
    }

    fn run_instances(&self) -> Result<Vec<ProviderInstance>, SweepError> {
        let instances: Vec<ProviderInstance> = self.list_resources(&["server"], "instances")?;
        let expected = self.config.instance_name();
        Ok(instances
            .into_iter()
            .filter(|instance| instance.name == expected)
            .collect())
    }

    fn delete_image(&self, image: &ProviderImage) -> Result<CommandOutput, SweepError> {
        let args = vec![
            OsString::from("image"),
            OsString::from("delete"),
            OsString::from(&image.id),
        ];
        self.run_provider(&args, "image delete")
    }

    fn delete_instance(&self, instance: &ProviderInstance) -> Result<CommandOutput, SweepError> {
        let args = vec![
            OsString::from("server"),
            OsString::from("delete"),
            OsString::from(&instance.id),
            OsString::from("--wait"),
        ];
        self.run_provider(&args, "instance delete")
    }

    /// Lists resources using the provider CLI, returning parsed JSON.
    fn list_resources<T>(&self, subcommand: &[&str], resource: &str) -> Result<Vec<T>, SweepError>
    where
        T: serde::de::DeserializeOwned,
    {
        let mut args = Vec::new();
        for part in subcommand {
            args.push(OsString::from(*part));
        }
        args.push(OsString::from("list"));
        args.push(OsString::from(format!(
            "project-id={}",
            self.config.project_id
        )));
        args.push(OsString::from("-o"));
        args.push(OsString::from("json"));

        let output = self.run_provider(&args, resource)?;
        serde_json::from_str::<Vec<T>>(&output.stdout).map_err(|err| SweepError::Parse {
            resource: resource.to_owned(),
            message: err.to_string(),
        })
    }

    fn run_provider(&self, args: &[OsString], resource: &str) -> Result<CommandOutput, SweepError> {
        let output = self
            .runner
            .run(&self.config.provider_bin, args, Utf8Path::new("."))?;
        if output.is_success() {
            return Ok(output);
        }

        let status_text = output
            .code
            .map_or_else(|| String::from("unknown"), |code| code.to_string());
        Err(SweepError::CommandFailure {
            program: self.config.provider_bin.clone(),
            status: output.code,
            status_text,
            stderr: format!("{resource}: {}", output.stderr),
        })
    }
}
