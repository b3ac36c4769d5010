//! Command-line interface definitions for the `stackcheck-sweep` binary.
//!
//! This module centralises the clap parser structure so both the sweep
//! binary and the build script can reuse it when generating the manual
//! page.

use clap::Parser;

/// Top-level CLI for the `stackcheck-sweep` binary.
#[derive(Debug, Parser)]
#[command(
    name = "stackcheck-sweep",
    about = "Delete cloud resources left behind by a single acceptance run"
)]
pub struct Cli {
    /// Project id used to scope resource discovery.
    #[arg(long, env = "STACKCHECK_PROJECT_ID")]
    pub project_id: String,
    /// Acceptance run id used to match tagged images and named instances.
    #[arg(long, env = "STACKCHECK_RUN_ID")]
    pub run_id: String,
    /// Path to the provider CLI binary.
    #[arg(long, default_value = "cumulus")]
    pub provider_bin: String,
}
