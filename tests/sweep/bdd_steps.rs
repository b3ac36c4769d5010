//! BDD step definitions for sweep behaviour.

use rstest_bdd_macros::{given, then, when};
use stackcheck::sweep::Sweeper;
use stackcheck::test_support::{json_images, json_instances};

use super::test_helpers::{SweepContext, SweepOutcome, build_config};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
}

#[given("a configured sweeper for project \"{project}\" and run \"{run_id}\"")]
fn configured_sweeper(
    mut sweep_context: SweepContext,
    project: String,
    run_id: String,
) -> SweepContext {
    sweep_context.config = Some(build_config(project.trim(), run_id.trim()));
    sweep_context
}

#[given("the provider lists one tagged image and the run's builder instance")]
fn provider_lists_run_resources(sweep_context: SweepContext) -> SweepContext {
    let Some(config) = sweep_context.config.as_ref() else {
        panic!("test setup requires a configured sweeper");
    };
    let run_id = config.run_id.as_str();
    let instance_name = config.instance_name();

    sweep_context.runner.push_output(
        Some(0),
        json_images(&[
            ("img-a", "stackcheck-run123", &[("acc-run", run_id)]),
            ("img-b", "unrelated", &[("team", "infra")]),
        ]),
        "",
    );
    sweep_context.runner.push_success(); // delete image
    sweep_context.runner.push_output(
        Some(0),
        json_instances(&[
            ("srv-a", instance_name.as_str()),
            ("srv-b", "other-instance"),
        ]),
        "",
    );
    sweep_context.runner.push_success(); // delete instance
    sweep_context
        .runner
        .push_output(Some(0), json_images(&[("img-b", "unrelated", &[])]), "");
    sweep_context
        .runner
        .push_output(Some(0), json_instances(&[("srv-b", "other-instance")]), "");

    sweep_context
}

#[given("the provider lists a tagged image that remains after deletion")]
fn provider_lists_remaining_image(sweep_context: SweepContext) -> SweepContext {
    let Some(config) = sweep_context.config.as_ref() else {
        panic!("test setup requires a configured sweeper");
    };
    let run_id = config.run_id.as_str();

    sweep_context.runner.push_output(
        Some(0),
        json_images(&[("img-a", "stackcheck-run123", &[("acc-run", run_id)])]),
        "",
    );
    sweep_context.runner.push_success(); // delete image
    sweep_context
        .runner
        .push_output(Some(0), json_instances(&[]), "");
    // post: image still present
    sweep_context.runner.push_output(
        Some(0),
        json_images(&[("img-a", "stackcheck-run123", &[("acc-run", run_id)])]),
        "",
    );
    sweep_context
        .runner
        .push_output(Some(0), json_instances(&[]), "");

    sweep_context
}

#[when("I run the sweep")]
fn run_sweep(mut sweep_context: SweepContext) -> SweepContext {
    let config = sweep_context
        .config
        .clone()
        .unwrap_or_else(|| panic!("test setup requires a configured sweeper"));
    let sweeper = Sweeper::new(config, sweep_context.runner.clone());
    sweep_context.outcome = Some(match sweeper.sweep() {
        Ok(summary) => SweepOutcome::Success(summary),
        Err(err) => SweepOutcome::Failure(err.to_string()),
    });
    sweep_context
}

#[then("the sweeper reports deleting {images:u32} image and {instances:u32} instance")]
fn reports_deletions(
    sweep_context: &SweepContext,
    images: u32,
    instances: u32,
) -> Result<(), StepError> {
    let Some(outcome) = sweep_context.outcome.as_ref() else {
        return Err(StepError::Assertion(String::from("missing outcome")));
    };
    let SweepOutcome::Success(summary) = outcome else {
        return Err(StepError::Assertion(format!(
            "expected success, got: {outcome:?}"
        )));
    };
    if summary.deleted_images == images as usize && summary.deleted_instances == instances as usize
    {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {images} images and {instances} instances, got {summary:?}"
        )))
    }
}

#[then("images are deleted before instances")]
fn images_deleted_first(sweep_context: &SweepContext) -> Result<(), StepError> {
    let invocations = sweep_context.runner.invocations();
    let position = |subcommand: &str| {
        invocations.iter().position(|call| {
            let text = call.command_string();
            text.contains(subcommand) && text.contains("delete")
        })
    };
    let image_delete = position("image")
        .ok_or_else(|| StepError::Assertion(String::from("missing image delete invocation")))?;
    let instance_delete = position("server")
        .ok_or_else(|| StepError::Assertion(String::from("missing server delete invocation")))?;
    if image_delete < instance_delete {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "image delete at {image_delete} should precede server delete at {instance_delete}"
        )))
    }
}

#[then("the sweeper reports a not-clean error")]
fn reports_not_clean(sweep_context: &SweepContext) -> Result<(), StepError> {
    let Some(outcome) = sweep_context.outcome.as_ref() else {
        return Err(StepError::Assertion(String::from("missing outcome")));
    };
    let SweepOutcome::Failure(message) = outcome else {
        return Err(StepError::Assertion(String::from(
            "expected sweep to fail, got success",
        )));
    };
    if message.contains("resources remain after sweep") {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected not-clean error, got: {message}"
        )))
    }
}
