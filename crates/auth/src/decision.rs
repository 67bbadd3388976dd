//! Per-requirement authorization decisions.

use serde::Serialize;

/// Outcome a handler reports for one requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Succeed,
    Fail,
    /// No handler conclusively satisfied or rejected the requirement.
    #[default]
    Undetermined,
}

impl core::fmt::Display for Decision {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Decision::Succeed => f.write_str("succeed"),
            Decision::Fail => f.write_str("fail"),
            Decision::Undetermined => f.write_str("undetermined"),
        }
    }
}

/// Accumulates handler decisions for a single requirement.
///
/// # Invariants
/// - `Succeed` is never overridden by a later `Fail`.
/// - `Fail` is terminal: every later record is ignored.
/// - `Undetermined` never changes the recorded state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RequirementState {
    decision: Decision,
}

impl RequirementState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a handler decision and return the resulting state.
    pub fn record(&mut self, decision: Decision) -> Decision {
        match (self.decision, decision) {
            (Decision::Fail, _) => {}
            (_, Decision::Undetermined) => {}
            (Decision::Succeed, Decision::Fail) => {}
            (_, next) => self.decision = next,
        }
        self.decision
    }

    pub fn decision(&self) -> Decision {
        self.decision
    }

    pub fn is_terminal(&self) -> bool {
        self.decision == Decision::Fail
    }

    pub fn is_satisfied(&self) -> bool {
        self.decision == Decision::Succeed
    }
}
