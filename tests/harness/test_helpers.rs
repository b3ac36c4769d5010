//! Shared fixtures for harness BDD scenarios.

use std::collections::BTreeMap;

use rstest::fixture;
use stackcheck::harness::AcceptanceCase;
use stackcheck::state::{ResourceState, StackState};
use stackcheck::test_support::ScriptedEngine;

use crate::test_constants::QUERY_ADDRESS;

#[derive(Clone, Debug)]
pub enum CaseOutcome {
    Success(StackState),
    Failure(String),
}

#[derive(Clone, Debug)]
pub struct HarnessContext {
    pub engine: ScriptedEngine,
    pub case: AcceptanceCase,
    pub outcome: Option<CaseOutcome>,
}

#[fixture]
pub fn harness_context() -> HarnessContext {
    HarnessContext {
        engine: ScriptedEngine::new(),
        case: AcceptanceCase::new(),
        outcome: None,
    }
}

pub fn public_image_state(id: &str) -> StackState {
    let mut attributes = BTreeMap::new();
    attributes.insert(String::from("id"), id.to_owned());
    attributes.insert(String::from("visibility"), String::from("public"));
    attributes.insert(String::from("status"), String::from("active"));
    attributes.insert(String::from("protected"), String::from("true"));

    let mut state = StackState::new();
    state.insert(
        QUERY_ADDRESS,
        ResourceState {
            id: id.to_owned(),
            attributes,
        },
    );
    state
}
