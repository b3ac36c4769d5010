//! Flat state records produced by an applied configuration.
//!
//! The orchestration engine reports applied state as a JSON document; this
//! module reduces it to the flat string-keyed attribute map the assertion
//! layer works with. Nested values flatten to dotted keys (`tags.foo`,
//! `names.0`) and scalars render as plain strings so expected values can be
//! compared with string equality.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Errors raised while decoding engine state output.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum StateError {
    /// Raised when the engine's JSON output cannot be parsed.
    #[error("failed to parse state output: {0}")]
    Parse(String),
}

/// State of one resource after apply.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ResourceState {
    /// Primary identifier assigned by the provider. Empty when the engine
    /// recorded the resource without an id.
    pub id: String,
    /// Flattened attribute map.
    pub attributes: BTreeMap<String, String>,
}

impl ResourceState {
    /// Looks up a flattened attribute value.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// Applied state: resource address to resource state.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct StackState {
    resources: BTreeMap<String, ResourceState>,
}

#[derive(Debug, Deserialize)]
struct ShowDocument {
    #[serde(default)]
    values: Option<ShowValues>,
}

#[derive(Debug, Deserialize)]
struct ShowValues {
    #[serde(default)]
    root_module: ShowModule,
}

#[derive(Debug, Default, Deserialize)]
struct ShowModule {
    #[serde(default)]
    resources: Vec<ShowResource>,
}

#[derive(Debug, Deserialize)]
struct ShowResource {
    address: String,
    #[serde(default)]
    values: serde_json::Map<String, Value>,
}

impl StackState {
    /// Creates an empty state record.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            resources: BTreeMap::new(),
        }
    }

    /// Parses the engine's `show -json` output.
    ///
    /// A document without a `values` section (nothing applied yet) parses
    /// to an empty state rather than an error.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Parse`] when the payload is not valid JSON of
    /// the expected shape.
    pub fn from_show_output(payload: &str) -> Result<Self, StateError> {
        let document: ShowDocument =
            serde_json::from_str(payload).map_err(|err| StateError::Parse(err.to_string()))?;

        let mut state = Self::new();
        let resources = document
            .values
            .map(|values| values.root_module.resources)
            .unwrap_or_default();
        for resource in resources {
            let mut flattened = BTreeMap::new();
            for (key, value) in &resource.values {
                flatten_value(key, value, &mut flattened);
            }
            let id = flattened.get("id").cloned().unwrap_or_default();
            state.resources.insert(
                resource.address,
                ResourceState {
                    id,
                    attributes: flattened,
                },
            );
        }
        Ok(state)
    }

    /// Inserts or replaces a resource record.
    pub fn insert(&mut self, address: impl Into<String>, resource: ResourceState) {
        self.resources.insert(address.into(), resource);
    }

    /// Looks up a resource by address.
    #[must_use]
    pub fn resource(&self, address: &str) -> Option<&ResourceState> {
        self.resources.get(address)
    }

    /// Returns `true` when no resources are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Number of recorded resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }
}

fn flatten_value(key: &str, value: &Value, out: &mut BTreeMap<String, String>) {
    match value {
        Value::Null => {}
        Value::Bool(flag) => {
            out.insert(key.to_owned(), flag.to_string());
        }
        Value::Number(number) => {
            out.insert(key.to_owned(), number.to_string());
        }
        Value::String(text) => {
            out.insert(key.to_owned(), text.clone());
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                flatten_value(&format!("{key}.{index}"), item, out);
            }
        }
        Value::Object(entries) => {
            for (nested_key, nested_value) in entries {
                flatten_value(&format!("{key}.{nested_key}"), nested_value, out);
            }
        }
    }
}
