//! BDD step definitions for harness behaviour.

use rstest_bdd_macros::{given, then, when};
use stackcheck::harness::{AcceptanceCase, CaseStep, Harness};
use stackcheck::image::{ImageQuery, Visibility};
use stackcheck::state::StackState;
use stackcheck::{Check, Document};
use tokio::runtime::Runtime;

use super::test_helpers::{CaseOutcome, HarnessContext, public_image_state};
use crate::test_constants::{PUBLIC_IMAGE_NAME, QUERY_ADDRESS};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
}

fn query_document() -> Document {
    let block = ImageQuery::new()
        .name(PUBLIC_IMAGE_NAME)
        .visibility(Visibility::Public)
        .most_recent(true)
        .build()
        .unwrap_or_else(|err| panic!("query should build: {err}"));
    Document::new().with(block)
}

#[given("a query case expecting a public active image")]
fn public_image_case(mut harness_context: HarnessContext) -> HarnessContext {
    harness_context.engine.push_state(public_image_state("img-1"));
    harness_context.case = AcceptanceCase::new().step(CaseStep::verified(
        query_document(),
        vec![
            Check::resource_id(QUERY_ADDRESS),
            Check::attr(QUERY_ADDRESS, "visibility", "public"),
            Check::attr(QUERY_ADDRESS, "status", "active"),
            Check::attr(QUERY_ADDRESS, "protected", "true"),
        ],
    ));
    harness_context
}

#[given("a query case that matches no images")]
fn zero_match_case(mut harness_context: HarnessContext) -> HarnessContext {
    harness_context.engine.push_state(StackState::new());
    harness_context.case = AcceptanceCase::new().step(CaseStep::verified(
        query_document(),
        vec![Check::resource_id(QUERY_ADDRESS)],
    ));
    harness_context
}

#[given("an engine that fails during teardown")]
fn engine_fails_teardown(harness_context: HarnessContext) -> HarnessContext {
    harness_context.engine.fail_on_destroy();
    harness_context
}

#[when("I run the acceptance case")]
fn run_case(mut harness_context: HarnessContext) -> Result<HarnessContext, StepError> {
    let runtime = Runtime::new().map_err(|err| StepError::Assertion(err.to_string()))?;
    let harness = Harness::new(harness_context.engine.clone());
    let result = runtime.block_on(async { harness.run(&harness_context.case).await });
    harness_context.outcome = Some(match result {
        Ok(state) => CaseOutcome::Success(state),
        Err(err) => CaseOutcome::Failure(err.to_string()),
    });
    Ok(harness_context)
}

#[then("the case passes")]
fn case_passes(harness_context: &HarnessContext) -> Result<(), StepError> {
    match harness_context.outcome.as_ref() {
        Some(CaseOutcome::Success(state)) if state.resource(QUERY_ADDRESS).is_some() => Ok(()),
        Some(CaseOutcome::Success(_)) => Err(StepError::Assertion(String::from(
            "final state is missing the query resource",
        ))),
        Some(CaseOutcome::Failure(message)) => Err(StepError::Assertion(format!(
            "expected success, got: {message}"
        ))),
        None => Err(StepError::Assertion(String::from("missing outcome"))),
    }
}

#[then("the case fails with a missing resource error")]
fn case_fails_missing_resource(harness_context: &HarnessContext) -> Result<(), StepError> {
    let Some(CaseOutcome::Failure(message)) = harness_context.outcome.as_ref() else {
        return Err(StepError::Assertion(String::from(
            "expected case to fail, got success or missing outcome",
        )));
    };
    if message.contains("not found in state") {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected missing resource failure, got: {message}"
        )))
    }
}

#[then("the engine tore the stack down once")]
fn engine_tore_down_once(harness_context: &HarnessContext) -> Result<(), StepError> {
    let calls = harness_context.engine.destroy_calls();
    if calls == 1 {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected one destroy call, got {calls}"
        )))
    }
}

#[then("the case fails with a teardown error")]
fn case_fails_teardown(harness_context: &HarnessContext) -> Result<(), StepError> {
    let Some(CaseOutcome::Failure(message)) = harness_context.outcome.as_ref() else {
        return Err(StepError::Assertion(String::from(
            "expected case to fail, got success or missing outcome",
        )));
    };
    if message.contains("failed to destroy case resources") {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected teardown failure, got: {message}"
        )))
    }
}

#[then("the failure notes that teardown also failed")]
fn failure_notes_teardown(harness_context: &HarnessContext) -> Result<(), StepError> {
    let Some(CaseOutcome::Failure(message)) = harness_context.outcome.as_ref() else {
        return Err(StepError::Assertion(String::from(
            "expected case to fail, got success or missing outcome",
        )));
    };
    if message.contains("teardown also failed") {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected teardown note, got: {message}"
        )))
    }
}
