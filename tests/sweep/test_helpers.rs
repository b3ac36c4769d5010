//! Shared fixtures and helpers for sweep BDD scenarios.

use rstest::fixture;
use stackcheck::sweep::{DEFAULT_PROVIDER_BIN, SweepConfig, SweepSummary};
use stackcheck::test_support::ScriptedRunner;

#[derive(Clone, Debug)]
pub enum SweepOutcome {
    Success(SweepSummary),
    Failure(String),
}

#[derive(Clone, Debug)]
pub struct SweepContext {
    pub config: Option<SweepConfig>,
    pub runner: ScriptedRunner,
    pub outcome: Option<SweepOutcome>,
}

#[fixture]
pub fn sweep_context() -> SweepContext {
    SweepContext {
        config: None,
        runner: ScriptedRunner::new(),
        outcome: None,
    }
}

pub fn build_config(project: &str, run_id: &str) -> SweepConfig {
    SweepConfig::new(project, run_id, DEFAULT_PROVIDER_BIN)
        .unwrap_or_else(|err| panic!("sweep config should be valid: {err}"))
}
