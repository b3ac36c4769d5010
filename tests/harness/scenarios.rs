//! BDD scenarios for the acceptance harness.

use rstest_bdd_macros::scenario;

use super::test_helpers::{HarnessContext, harness_context};

#[scenario(
    path = "tests/features/harness.feature",
    name = "Verify a public image query against applied state"
)]
fn scenario_verify_public_image(harness_context: HarnessContext) {
    let _ = harness_context;
}

#[scenario(
    path = "tests/features/harness.feature",
    name = "Fail the case when the query matches nothing"
)]
fn scenario_fail_on_zero_matches(harness_context: HarnessContext) {
    let _ = harness_context;
}

#[scenario(
    path = "tests/features/harness.feature",
    name = "Fail the case when only teardown fails"
)]
fn scenario_fail_on_teardown_only(harness_context: HarnessContext) {
    let _ = harness_context;
}

#[scenario(
    path = "tests/features/harness.feature",
    name = "Surface teardown failure alongside a failing check"
)]
fn scenario_surface_teardown_failure(harness_context: HarnessContext) {
    let _ = harness_context;
}
