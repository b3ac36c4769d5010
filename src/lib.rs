//! Core library for the stackcheck acceptance harness.
//!
//! The crate renders declarative stack documents for a cloud image
//! provider, hands them to an OpenTofu-compatible orchestration CLI, and
//! asserts on the state the engine reports back (apply → check → destroy).

pub mod check;
pub mod cli;
pub mod command;
pub mod config;
pub mod document;
pub mod engine;
pub mod fixture;
pub mod harness;
pub mod image;
pub mod orchestrator;
pub mod state;
pub mod sweep;
pub mod test_support;

pub use check::{Check, CheckError, evaluate_all};
pub use command::{CommandError, CommandOutput, CommandRunner, ProcessCommandRunner};
pub use config::{ACCEPTANCE_ENV, ConfigError, HarnessConfig};
pub use document::{AttrValue, Block, BlockKind, Document, DocumentError};
pub use engine::{Engine, EngineFuture};
pub use fixture::{NAME_PREFIX, RUN_TAG_KEY, SnapshotFixture, generate_run_id};
pub use harness::{AcceptanceCase, CaseStep, Harness, HarnessError};
pub use image::{ImageFromInstance, ImageQuery, Visibility};
pub use orchestrator::{CliEngine, CliEngineError, DEFAULT_ENGINE_BIN, DOCUMENT_FILE};
pub use state::{ResourceState, StackState, StateError};
pub use sweep::{DEFAULT_PROVIDER_BIN, RUN_ID_ENV, SweepConfig, SweepError, SweepSummary, Sweeper};
