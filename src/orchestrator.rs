//! CLI-backed implementation of the orchestration engine.
//!
//! `CliEngine` drives an OpenTofu-compatible binary inside a dedicated
//! working directory: the rendered document is written to `main.tf`, the
//! directory is initialised once, and apply/show/destroy subcommands run
//! through the [`CommandRunner`] seam. The engine binary owns all plan,
//! diff, and provider API logic.

use std::ffi::OsString;
use std::sync::atomic::{AtomicBool, Ordering};

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};
use thiserror::Error;

use crate::command::{CommandError, CommandOutput, CommandRunner, ProcessCommandRunner};
use crate::document::Document;
use crate::engine::{Engine, EngineFuture};
use crate::state::{StackState, StateError};

/// Default orchestration CLI binary name.
pub const DEFAULT_ENGINE_BIN: &str = "tofu";

/// File the rendered document is written to inside the working directory.
pub const DOCUMENT_FILE: &str = "main.tf";

/// Errors raised by the CLI engine.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum CliEngineError {
    /// Raised when the working directory cannot be prepared or written.
    #[error("failed to prepare working directory {path}: {message}")]
    Workspace {
        /// Directory that failed.
        path: String,
        /// Underlying error message.
        message: String,
    },
    /// Raised when a subcommand exits with a non-zero status.
    #[error("{program} {action} exited with status {status_text}: {stderr}")]
    CommandFailure {
        /// Engine binary that failed.
        program: String,
        /// Subcommand being run (`init`, `apply`, `show`, `destroy`).
        action: String,
        /// Exit status reported by the OS.
        status: Option<i32>,
        /// Human readable representation of the exit status.
        status_text: String,
        /// Stderr captured from the command.
        stderr: String,
    },
    /// Raised when the command cannot be started at all.
    #[error(transparent)]
    Runner(#[from] CommandError),
    /// Raised when state output cannot be decoded.
    #[error(transparent)]
    State(#[from] StateError),
}

/// Engine implementation that shells out to the orchestration CLI.
#[derive(Debug)]
pub struct CliEngine<R: CommandRunner> {
    bin: String,
    workdir: Utf8PathBuf,
    runner: R,
    initialised: AtomicBool,
}

impl CliEngine<ProcessCommandRunner> {
    /// Creates an engine wired to the real process runner.
    ///
    /// # Errors
    ///
    /// Returns [`CliEngineError::Workspace`] when the working directory
    /// cannot be created.
    pub fn with_process_runner(
        bin: impl Into<String>,
        workdir: impl Into<Utf8PathBuf>,
    ) -> Result<Self, CliEngineError> {
        Self::new(bin, workdir, ProcessCommandRunner)
    }
}

impl<R: CommandRunner> CliEngine<R> {
    /// Creates an engine using the provided runner, ensuring the working
    /// directory exists.
    ///
    /// # Errors
    ///
    /// Returns [`CliEngineError::Workspace`] when the working directory
    /// cannot be created.
    pub fn new(
        bin: impl Into<String>,
        workdir: impl Into<Utf8PathBuf>,
        runner: R,
    ) -> Result<Self, CliEngineError> {
        let workdir = workdir.into();
        std::fs::create_dir_all(&workdir).map_err(|err| CliEngineError::Workspace {
            path: workdir.to_string(),
            message: err.to_string(),
        })?;
        Ok(Self {
            bin: bin.into(),
            workdir,
            runner,
            initialised: AtomicBool::new(false),
        })
    }

    /// Working directory the engine operates in.
    #[must_use]
    pub fn workdir(&self) -> &Utf8Path {
        &self.workdir
    }

    fn write_document(&self, document: &Document) -> Result<(), CliEngineError> {
        let dir = Dir::open_ambient_dir(&self.workdir, ambient_authority()).map_err(|err| {
            CliEngineError::Workspace {
                path: self.workdir.to_string(),
                message: err.to_string(),
            }
        })?;
        dir.write(DOCUMENT_FILE, document.render())
            .map_err(|err| CliEngineError::Workspace {
                path: self.workdir.join(DOCUMENT_FILE).to_string(),
                message: err.to_string(),
            })
    }

    fn run_subcommand(&self, action: &str, extra: &[&str]) -> Result<CommandOutput, CliEngineError> {
        let mut args = vec![OsString::from(action)];
        args.extend(extra.iter().copied().map(OsString::from));

        let output = self.runner.run(&self.bin, &args, &self.workdir)?;
        if output.is_success() {
            return Ok(output);
        }

        let status_text = output
            .code
            .map_or_else(|| String::from("unknown"), |code| code.to_string());
        Err(CliEngineError::CommandFailure {
            program: self.bin.clone(),
            action: action.to_owned(),
            status: output.code,
            status_text,
            stderr: output.stderr,
        })
    }

    fn ensure_initialised(&self) -> Result<(), CliEngineError> {
        if self.initialised.load(Ordering::Acquire) {
            return Ok(());
        }
        self.run_subcommand("init", &["-input=false", "-no-color"])?;
        self.initialised.store(true, Ordering::Release);
        Ok(())
    }

    fn apply_blocking(&self, document: &Document) -> Result<StackState, CliEngineError> {
        self.write_document(document)?;
        self.ensure_initialised()?;
        self.run_subcommand("apply", &["-auto-approve", "-input=false", "-no-color"])?;
        let show = self.run_subcommand("show", &["-json"])?;
        Ok(StackState::from_show_output(&show.stdout)?)
    }

    fn destroy_blocking(&self) -> Result<(), CliEngineError> {
        self.run_subcommand("destroy", &["-auto-approve", "-input=false", "-no-color"])?;
        Ok(())
    }
}

impl<R: CommandRunner + Send + Sync> Engine for CliEngine<R> {
    type Error = CliEngineError;

    fn apply<'a>(&'a self, document: &'a Document) -> EngineFuture<'a, StackState, Self::Error> {
        Box::pin(async move { self.apply_blocking(document) })
    }

    fn destroy(&self) -> EngineFuture<'_, (), Self::Error> {
        Box::pin(async move { self.destroy_blocking() })
    }
}
