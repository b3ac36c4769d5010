//! Test support utilities shared across unit and integration tests.

use std::collections::{BTreeSet, VecDeque};
use std::env;
use std::ffi::OsString;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard};

use crate::command::{CommandError, CommandOutput, CommandRunner};
use crate::document::Document;
use crate::engine::{Engine, EngineFuture};
use crate::state::StackState;

/// Scripted command runner that returns pre-seeded outputs in FIFO order.
///
/// Used to drive deterministic command outcomes without spawning processes.
#[derive(Clone, Debug, Default)]
pub struct ScriptedRunner {
    responses: Arc<StdMutex<VecDeque<CommandOutput>>>,
    invocations: Arc<StdMutex<Vec<CommandInvocation>>>,
}

/// Records a single invocation made through [`ScriptedRunner`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommandInvocation {
    /// Program name as passed to the runner.
    pub program: String,
    /// Arguments passed to the program.
    pub args: Vec<OsString>,
    /// Directory the command was asked to run in.
    pub dir: Utf8PathBuf,
}

impl CommandInvocation {
    /// Returns a shell-like command string for assertions.
    #[must_use]
    pub fn command_string(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        parts.push(self.program.clone());
        parts.extend(
            self.args
                .iter()
                .map(|arg| arg.to_string_lossy().into_owned()),
        );
        parts.join(" ")
    }
}

impl ScriptedRunner {
    /// Creates a new runner with no queued responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all invocations recorded so far.
    #[must_use]
    pub fn invocations(&self) -> Vec<CommandInvocation> {
        self.invocations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn push(&self, output: CommandOutput) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(output);
    }

    /// Pushes a successful exit status.
    pub fn push_success(&self) {
        self.push(CommandOutput {
            code: Some(0),
            stdout: String::new(),
            stderr: String::new(),
        });
    }

    /// Pushes a failing exit code with stderr text.
    pub fn push_failure(&self, code: i32) {
        self.push(CommandOutput {
            code: Some(code),
            stdout: String::new(),
            stderr: String::from("simulated failure"),
        });
    }

    /// Pushes a response with no exit code to simulate abnormal termination.
    pub fn push_missing_exit_code(&self) {
        self.push(CommandOutput {
            code: None,
            stdout: String::new(),
            stderr: String::new(),
        });
    }

    /// Pushes an explicit command output response.
    pub fn push_output(
        &self,
        code: Option<i32>,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) {
        self.push(CommandOutput {
            code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        });
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(
        &self,
        program: &str,
        args: &[OsString],
        dir: &Utf8Path,
    ) -> Result<CommandOutput, CommandError> {
        self.invocations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(CommandInvocation {
                program: program.to_owned(),
                args: args.to_vec(),
                dir: dir.to_owned(),
            });
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .ok_or_else(|| CommandError::Spawn {
                program: program.to_owned(),
                message: String::from("no scripted response available"),
            })
    }
}

/// Error type produced by [`ScriptedEngine`].
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ScriptedEngineError {
    /// Raised when an apply is scripted to fail or no state is queued.
    #[error("scripted apply failure: {0}")]
    Apply(String),
    /// Raised when destroy is scripted to fail.
    #[error("scripted destroy failure")]
    Destroy,
}

#[derive(Debug, Default)]
struct ScriptedEngineInner {
    states: VecDeque<StackState>,
    applied: Vec<String>,
    destroy_calls: usize,
    fail_on_destroy: bool,
}

/// Engine double that returns pre-seeded states in FIFO order.
///
/// Each apply records the rendered document it received and pops the next
/// queued state; an empty queue makes the apply fail, which stands in for
/// an engine-side provisioning error.
#[derive(Clone, Debug, Default)]
pub struct ScriptedEngine {
    inner: Arc<StdMutex<ScriptedEngineInner>>,
}

impl ScriptedEngine {
    /// Creates an engine with no queued states.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a state to be returned by the next apply.
    pub fn push_state(&self, state: StackState) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .states
            .push_back(state);
    }

    /// Makes every destroy call fail.
    pub fn fail_on_destroy(&self) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .fail_on_destroy = true;
    }

    /// Returns the rendered documents applied so far, in order.
    #[must_use]
    pub fn applied_documents(&self) -> Vec<String> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .applied
            .clone()
    }

    /// Returns how many times destroy was called.
    #[must_use]
    pub fn destroy_calls(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .destroy_calls
    }
}

impl Engine for ScriptedEngine {
    type Error = ScriptedEngineError;

    fn apply<'a>(&'a self, document: &'a Document) -> EngineFuture<'a, StackState, Self::Error> {
        Box::pin(async move {
            let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            inner.applied.push(document.render());
            inner
                .states
                .pop_front()
                .ok_or_else(|| ScriptedEngineError::Apply(String::from("no scripted state")))
        })
    }

    fn destroy(&self) -> EngineFuture<'_, (), Self::Error> {
        Box::pin(async move {
            let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            inner.destroy_calls += 1;
            if inner.fail_on_destroy {
                return Err(ScriptedEngineError::Destroy);
            }
            Ok(())
        })
    }
}

/// Global mutex used to serialise environment mutation in tests.
pub static ENV_LOCK: Mutex<()> = Mutex::const_new(());

/// Guard that holds the env mutex and cleans up variables on drop.
pub struct EnvGuard {
    previous: Vec<(String, Option<OsString>)>,
    _guard: MutexGuard<'static, ()>,
}

impl EnvGuard {
    /// Sets multiple environment variables while holding a global mutex.
    pub async fn set_vars(pairs: &[(&str, &str)]) -> Self {
        debug_assert!(
            {
                let mut seen = BTreeSet::new();
                pairs.iter().all(|(key, _)| seen.insert(*key))
            },
            "duplicate environment variable keys passed to EnvGuard::set_vars"
        );

        let guard = ENV_LOCK.lock().await;
        let mut previous = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            let old = env::var_os(key);
            // SAFETY: Environment mutation is serialised by `ENV_LOCK`, preventing races.
            unsafe { env::set_var(key, value) };
            previous.push(((*key).to_owned(), old));
        }

        Self {
            previous,
            _guard: guard,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, old) in &self.previous {
            // SAFETY: Environment mutation is serialised by holding `_guard`.
            unsafe {
                match old {
                    Some(val) => env::set_var(key, val),
                    None => env::remove_var(key),
                }
            }
        }
    }
}

/// Produces a JSON array matching `cumulus image list -o json`.
#[must_use]
pub fn json_images(images: &[(&str, &str, &[(&str, &str)])]) -> String {
    let items = images
        .iter()
        .map(|(id, name, tags)| {
            let tags_json = tags
                .iter()
                .map(|(key, value)| format!("\"{key}\":\"{value}\""))
                .collect::<Vec<_>>()
                .join(",");
            format!("{{\"id\":\"{id}\",\"name\":\"{name}\",\"tags\":{{{tags_json}}}}}")
        })
        .collect::<Vec<_>>()
        .join(",");
    format!("[{items}]")
}

/// Produces a JSON array matching `cumulus server list -o json`.
#[must_use]
pub fn json_instances(instances: &[(&str, &str)]) -> String {
    let items = instances
        .iter()
        .map(|(id, name)| format!("{{\"id\":\"{id}\",\"name\":\"{name}\"}}"))
        .collect::<Vec<_>>()
        .join(",");
    format!("[{items}]")
}
