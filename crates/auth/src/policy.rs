//! Guarded-operation configuration.
//!
//! Operations declare their requirements either in code (implement
//! [`GuardedOperation`]) or through an [`OperationPolicy`] loaded at startup.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{AuthzError, Requirement};

/// An operation that must be authorized before it runs.
///
/// The API layer enforces these requirements before dispatching.
pub trait GuardedOperation {
    fn operation_name(&self) -> &str;

    fn requirements(&self) -> &[Requirement];
}

/// Borrowed view of one policy entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamedOperation<'a> {
    name: &'a str,
    requirements: &'a [Requirement],
}

impl<'a> NamedOperation<'a> {
    pub fn new(name: &'a str, requirements: &'a [Requirement]) -> Self {
        Self { name, requirements }
    }
}

impl GuardedOperation for NamedOperation<'_> {
    fn operation_name(&self) -> &str {
        self.name
    }

    fn requirements(&self) -> &[Requirement] {
        self.requirements
    }
}

/// Operation name → requirements, as configured.
///
/// JSON form: `{ "orders.update": [{ "kind": "permission", "permission": "orders.edit" }] }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationPolicy {
    operations: BTreeMap<String, Vec<Requirement>>,
}

impl OperationPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_operation(
        mut self,
        name: impl Into<String>,
        requirements: impl IntoIterator<Item = Requirement>,
    ) -> Self {
        self.operations
            .insert(name.into(), requirements.into_iter().collect());
        self
    }

    /// Requirements of a declared operation.
    pub fn requirements_for(&self, name: &str) -> Option<&[Requirement]> {
        self.operations.get(name).map(Vec::as_slice)
    }

    /// Resolve a declared operation; undeclared names are refused.
    pub fn operation<'a>(&'a self, name: &'a str) -> Result<NamedOperation<'a>, AuthzError> {
        self.requirements_for(name)
            .map(|requirements| NamedOperation::new(name, requirements))
            .ok_or_else(|| AuthzError::UnknownOperation(name.to_string()))
    }

    /// Layer `other` on top of `self`; entries in `other` win.
    pub fn merged(mut self, other: OperationPolicy) -> Self {
        self.operations.extend(other.operations);
        self
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}
