//! Subprocess seam shared by the CLI engine and the sweeper.
//!
//! Both external collaborators (the orchestration CLI and the provider CLI)
//! are reached through `CommandRunner` so tests can script outcomes without
//! spawning processes.

use std::ffi::OsString;
use std::process::Command;

use camino::Utf8Path;
use thiserror::Error;

/// Errors raised when a command cannot be started.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum CommandError {
    /// Raised when the process fails to spawn.
    #[error("failed to start {program}: {message}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying error message.
        message: String,
    },
}

/// Result of running an external command.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommandOutput {
    /// Exit code reported by the process, if available.
    pub code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl CommandOutput {
    /// Returns `true` when the exit code equals zero.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.code, Some(0))
    }
}

/// Abstraction over command execution to support fakes in tests.
pub trait CommandRunner {
    /// Runs `program` with the given arguments in `dir`, capturing stdout
    /// and stderr.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Spawn`] if the command cannot be started.
    fn run(
        &self,
        program: &str,
        args: &[OsString],
        dir: &Utf8Path,
    ) -> Result<CommandOutput, CommandError>;
}

/// Real command runner that shells out to the host operating system.
#[derive(Clone, Debug, Default)]
pub struct ProcessCommandRunner;

impl CommandRunner for ProcessCommandRunner {
    fn run(
        &self,
        program: &str,
        args: &[OsString],
        dir: &Utf8Path,
    ) -> Result<CommandOutput, CommandError> {
        let output = Command::new(program)
            .args(args)
            .current_dir(dir)
            .output()
            .map_err(|err| CommandError::Spawn {
                program: program.to_owned(),
                message: err.to_string(),
            })?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
