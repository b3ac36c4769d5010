//! BDD scenarios for the sweep.

use rstest_bdd_macros::scenario;

use super::test_helpers::{SweepContext, sweep_context};

#[scenario(
    path = "tests/features/sweep.feature",
    name = "Delete run-scoped resources and verify clean state"
)]
fn scenario_delete_run_resources(sweep_context: SweepContext) {
    let _ = sweep_context;
}

#[scenario(
    path = "tests/features/sweep.feature",
    name = "Fail the sweep when resources remain"
)]
fn scenario_fail_when_not_clean(sweep_context: SweepContext) {
    let _ = sweep_context;
}
