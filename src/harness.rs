//! Step-wise acceptance case runner with guaranteed teardown.
//!
//! A case is an ordered list of steps; each step applies one configuration
//! document and evaluates its checks against the resulting state. The first
//! failing step aborts the remainder. Destroy is always attempted, both
//! after the final step and after a mid-case failure, and a teardown
//! failure is surfaced even when every step passed.

use std::fmt::Display;

use thiserror::Error;

use crate::check::{Check, CheckError, evaluate_all};
use crate::document::Document;
use crate::engine::Engine;
use crate::state::StackState;

/// One apply-and-verify step of an acceptance case.
#[derive(Clone, Debug)]
pub struct CaseStep {
    /// Document handed to the engine for this step.
    pub document: Document,
    /// Checks evaluated against the applied state. May be empty for pure
    /// provisioning steps.
    pub checks: Vec<Check>,
}

impl CaseStep {
    /// Creates a step that applies a document without verifying anything.
    #[must_use]
    pub const fn provision(document: Document) -> Self {
        Self {
            document,
            checks: Vec::new(),
        }
    }

    /// Creates a step with checks.
    #[must_use]
    pub fn verified(document: Document, checks: Vec<Check>) -> Self {
        Self { document, checks }
    }
}

/// An ordered acceptance case.
#[derive(Clone, Debug, Default)]
pub struct AcceptanceCase {
    /// Steps executed in order.
    pub steps: Vec<CaseStep>,
}

impl AcceptanceCase {
    /// Creates an empty case.
    #[must_use]
    pub const fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Appends a step, returning the case for chaining.
    #[must_use]
    pub fn step(mut self, step: CaseStep) -> Self {
        self.steps.push(step);
        self
    }
}

/// Errors surfaced while running an acceptance case.
#[derive(Debug, Error)]
pub enum HarnessError<EngineError>
where
    EngineError: std::error::Error + 'static,
{
    /// Raised when applying a step's document fails.
    #[error("step {step} apply failed: {message}")]
    Apply {
        /// Zero-based index of the failing step.
        step: usize,
        /// Failure description, including any teardown note.
        message: String,
        /// Engine error behind the failure.
        #[source]
        source: EngineError,
    },
    /// Raised when a step's checks fail against the applied state.
    #[error("step {step} check failed: {message}")]
    Check {
        /// Zero-based index of the failing step.
        step: usize,
        /// Failure description, including any teardown note.
        message: String,
        /// The failing check.
        #[source]
        source: CheckError,
    },
    /// Raised when teardown fails after every step succeeded.
    #[error("failed to destroy case resources: {0}")]
    Teardown(#[source] EngineError),
}

/// Runs acceptance cases against an engine.
#[derive(Debug)]
pub struct Harness<E> {
    engine: E,
}

impl<E> Harness<E>
where
    E: Engine,
    E::Error: Display + Send + Sync + std::error::Error + 'static,
{
    /// Creates a harness around an engine.
    #[must_use]
    pub const fn new(engine: E) -> Self {
        Self { engine }
    }

    /// Returns the wrapped engine.
    #[must_use]
    pub const fn engine(&self) -> &E {
        &self.engine
    }

    /// Runs every step in order and tears the case down.
    ///
    /// Returns the state produced by the final step so callers can inspect
    /// attributes beyond their checks.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError`] when an apply or check fails (teardown is
    /// still attempted and noted in the message), or when teardown itself
    /// fails after a fully successful case.
    pub async fn run(&self, case: &AcceptanceCase) -> Result<StackState, HarnessError<E::Error>> {
        let mut last_state = StackState::new();

        for (index, step) in case.steps.iter().enumerate() {
            let state = match self.engine.apply(&step.document).await {
                Ok(state) => state,
                Err(err) => {
                    let message = self.destroy_with_note(&err).await;
                    return Err(HarnessError::Apply {
                        step: index,
                        message,
                        source: err,
                    });
                }
            };

            if let Err(err) = evaluate_all(&step.checks, &state) {
                let message = self.destroy_with_note(&err).await;
                return Err(HarnessError::Check {
                    step: index,
                    message,
                    source: err,
                });
            }

            last_state = state;
        }

        self.engine
            .destroy()
            .await
            .map_err(HarnessError::Teardown)?;

        Ok(last_state)
    }

    async fn destroy_with_note<Failure: Display>(&self, err: &Failure) -> String {
        let teardown_error = self.engine.destroy().await.err();
        append_teardown_note(err.to_string(), teardown_error.as_ref())
    }
}

fn append_teardown_note<Failure: Display>(
    message: String,
    teardown_error: Option<&Failure>,
) -> String {
    if let Some(teardown) = teardown_error {
        format!("{message} (teardown also failed: {teardown})")
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn teardown_note_is_appended_when_present() {
        let message = append_teardown_note(
            String::from("boom"),
            Some(&CheckError::MissingResource {
                address: String::from("data.x.y"),
            }),
        );
        assert_eq!(
            message,
            "boom (teardown also failed: resource data.x.y not found in state)"
        );
    }

    #[test]
    fn teardown_note_is_omitted_when_clean() {
        let message = append_teardown_note::<CheckError>(String::from("boom"), None);
        assert_eq!(message, "boom");
    }
}
