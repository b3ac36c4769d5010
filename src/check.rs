//! Assertions evaluated against applied state.
//!
//! Checks mirror what an acceptance step verifies after apply: the queried
//! resource landed in state with a non-empty id, and named attributes equal
//! expected literals exactly. Every failure is terminal for the case; the
//! harness never retries a failed check.

use thiserror::Error;

use crate::state::StackState;

/// Failures raised by checks.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum CheckError {
    /// Raised when the address is absent from state, including the
    /// zero-match query case.
    #[error("resource {address} not found in state")]
    MissingResource {
        /// Address the check looked for.
        address: String,
    },
    /// Raised when the resource exists but its primary id is empty.
    #[error("resource {address} has no id set")]
    EmptyId {
        /// Address of the id-less resource.
        address: String,
    },
    /// Raised when a checked attribute is not recorded at all.
    #[error("resource {address} has no attribute '{key}'")]
    MissingAttribute {
        /// Address of the resource.
        address: String,
        /// Attribute key that was absent.
        key: String,
    },
    /// Raised when an attribute value differs from the expected literal.
    #[error("resource {address} attribute '{key}' is '{actual}', expected '{expected}'")]
    Mismatch {
        /// Address of the resource.
        address: String,
        /// Attribute key compared.
        key: String,
        /// Expected literal.
        expected: String,
        /// Value recorded in state.
        actual: String,
    },
}

/// A single assertion against applied state.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Check {
    /// The address exists and its primary id is non-empty.
    ResourceId {
        /// Address to look up.
        address: String,
    },
    /// The named attribute equals the expected literal exactly.
    Attr {
        /// Address to look up.
        address: String,
        /// Attribute key.
        key: String,
        /// Expected literal value.
        expected: String,
    },
}

impl Check {
    /// Builds a resource-id check.
    #[must_use]
    pub fn resource_id(address: impl Into<String>) -> Self {
        Self::ResourceId {
            address: address.into(),
        }
    }

    /// Builds an attribute-equality check.
    #[must_use]
    pub fn attr(
        address: impl Into<String>,
        key: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self::Attr {
            address: address.into(),
            key: key.into(),
            expected: expected.into(),
        }
    }

    /// Evaluates the check against a state record.
    ///
    /// # Errors
    ///
    /// Returns the corresponding [`CheckError`] when the resource is
    /// missing, its id is empty, the attribute is absent, or the value
    /// mismatches.
    pub fn evaluate(&self, state: &StackState) -> Result<(), CheckError> {
        match self {
            Self::ResourceId { address } => {
                let resource = state.resource(address).ok_or_else(|| {
                    CheckError::MissingResource {
                        address: address.clone(),
                    }
                })?;
                if resource.id.is_empty() {
                    return Err(CheckError::EmptyId {
                        address: address.clone(),
                    });
                }
                Ok(())
            }
            Self::Attr {
                address,
                key,
                expected,
            } => {
                let resource = state.resource(address).ok_or_else(|| {
                    CheckError::MissingResource {
                        address: address.clone(),
                    }
                })?;
                let actual =
                    resource
                        .attribute(key)
                        .ok_or_else(|| CheckError::MissingAttribute {
                            address: address.clone(),
                            key: key.clone(),
                        })?;
                if actual != expected {
                    return Err(CheckError::Mismatch {
                        address: address.clone(),
                        key: key.clone(),
                        expected: expected.clone(),
                        actual: actual.to_owned(),
                    });
                }
                Ok(())
            }
        }
    }
}

/// Evaluates checks in order, stopping at the first failure.
///
/// # Errors
///
/// Returns the first failing check's [`CheckError`].
pub fn evaluate_all(checks: &[Check], state: &StackState) -> Result<(), CheckError> {
    for check in checks {
        check.evaluate(state)?;
    }
    Ok(())
}
