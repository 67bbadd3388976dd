use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::{
    AuthorizationHandler, Decision, GuardedOperation, IdentityStore, PermissionAllowList,
    PermissionClaimHandler, PermissionRequirementHandler, Principal, Requirement,
    RequirementState, StoreError,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    /// A handler explicitly failed the requirement.
    #[error("forbidden: requirement '{0}' was denied")]
    Denied(String),

    /// No handler could satisfy the requirement.
    #[error("forbidden: requirement '{0}' could not be satisfied")]
    Undetermined(String),

    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),

    #[error("authorization cancelled by caller")]
    Cancelled,

    /// The operation has no policy entry; only a declared `[]` permits everyone.
    #[error("forbidden: operation '{0}' is not declared")]
    UnknownOperation(String),
}

// ─────────────────────────────────────────────────────────────────────────────
// Decision Point
// ─────────────────────────────────────────────────────────────────────────────

/// Composition point for requirement handlers.
///
/// For each requirement every handler runs in registration order until the
/// requirement's state becomes terminal. A requirement holds iff its state is
/// `Succeed`; an operation is permitted iff every attached requirement holds
/// (an operation without requirements is permitted).
#[derive(Clone, Default)]
pub struct DecisionPoint {
    handlers: Vec<Arc<dyn AuthorizationHandler>>,
}

impl DecisionPoint {
    pub fn new() -> Self {
        Self::default()
    }

    /// The two standard handlers: role-derived permissions and permission-token claims.
    pub fn standard<S>(store: S, allow_list: PermissionAllowList) -> Self
    where
        S: IdentityStore + 'static,
    {
        Self::new()
            .with_handler(PermissionRequirementHandler::new(store))
            .with_handler(PermissionClaimHandler::new(allow_list))
    }

    pub fn with_handler(mut self, handler: impl AuthorizationHandler + 'static) -> Self {
        self.handlers.push(Arc::new(handler));
        self
    }

    pub fn handler_names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    /// Resolve a single requirement.
    pub async fn decide(
        &self,
        principal: &Principal,
        requirement: &Requirement,
        cancel: &CancellationToken,
    ) -> Result<Decision, AuthzError> {
        let mut state = RequirementState::new();
        for handler in &self.handlers {
            state.record(handler.handle(principal, requirement, cancel).await?);
            if state.is_terminal() {
                break;
            }
        }
        Ok(state.decision())
    }

    /// Evaluate every requirement and explain each decision.
    ///
    /// Unlike [`DecisionPoint::authorize`] this does not stop at the first
    /// unsatisfied requirement.
    pub async fn evaluate(
        &self,
        principal: &Principal,
        requirements: &[Requirement],
        cancel: &CancellationToken,
    ) -> Result<AuthorizationOutcome, AuthzError> {
        let mut evaluations = Vec::with_capacity(requirements.len());
        for requirement in requirements {
            let decision = self.decide(principal, requirement, cancel).await?;
            evaluations.push(RequirementEvaluation::new(requirement, decision));
        }

        let outcome = AuthorizationOutcome::from_evaluations(evaluations);
        tracing::debug!(
            principal = %principal,
            requirements = requirements.len(),
            granted = outcome.granted,
            "authorization evaluated"
        );
        Ok(outcome)
    }

    /// Authorize a principal against a list of requirements.
    ///
    /// Stops at the first requirement that does not succeed.
    pub async fn authorize(
        &self,
        principal: &Principal,
        requirements: &[Requirement],
        cancel: &CancellationToken,
    ) -> Result<(), AuthzError> {
        for requirement in requirements {
            match self.decide(principal, requirement, cancel).await? {
                Decision::Succeed => continue,
                Decision::Fail => {
                    tracing::info!(principal = %principal, requirement = %requirement, "authorization denied");
                    return Err(AuthzError::Denied(requirement.to_string()));
                }
                Decision::Undetermined => {
                    tracing::info!(principal = %principal, requirement = %requirement, "authorization undetermined");
                    return Err(AuthzError::Undetermined(requirement.to_string()));
                }
            }
        }
        Ok(())
    }

    /// Authorize a guarded operation (checked before the operation runs).
    pub async fn authorize_operation<O>(
        &self,
        principal: &Principal,
        operation: &O,
        cancel: &CancellationToken,
    ) -> Result<(), AuthzError>
    where
        O: GuardedOperation + ?Sized,
    {
        let span = tracing::debug_span!("authorize_operation", operation = operation.operation_name());
        self.authorize(principal, operation.requirements(), cancel)
            .instrument(span)
            .await
    }
}

impl core::fmt::Debug for DecisionPoint {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DecisionPoint")
            .field("handlers", &self.handler_names())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation (Audit Trail)
// ─────────────────────────────────────────────────────────────────────────────

/// Decision for one requirement, with a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequirementEvaluation {
    pub requirement: Requirement,
    pub decision: Decision,
    pub reason: String,
}

impl RequirementEvaluation {
    fn new(requirement: &Requirement, decision: Decision) -> Self {
        let reason = match (requirement, decision) {
            (Requirement::Permission(r), Decision::Succeed) => {
                format!("a role assigned to the principal grants '{}'", r.permission)
            }
            (Requirement::Permission(r), Decision::Fail) => {
                format!("no role assigned to the principal grants '{}'", r.permission)
            }
            (Requirement::Permission(_), Decision::Undetermined) => {
                "principal is anonymous or unknown to the identity store".to_string()
            }
            (Requirement::Claim(r), Decision::Succeed) => {
                format!("claim '{}' lists an allowed permission token", r.claim_type)
            }
            (Requirement::Claim(r), Decision::Fail) => {
                format!("claim '{}' was rejected", r.claim_type)
            }
            (Requirement::Claim(r), Decision::Undetermined) => {
                format!("claim '{}' is missing, empty or lists no allowed token", r.claim_type)
            }
        };

        Self {
            requirement: requirement.clone(),
            decision,
            reason,
        }
    }

    pub fn is_satisfied(&self) -> bool {
        self.decision == Decision::Succeed
    }
}

/// Result of evaluating every requirement of an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationOutcome {
    pub granted: bool,
    pub evaluations: Vec<RequirementEvaluation>,
}

impl AuthorizationOutcome {
    fn from_evaluations(evaluations: Vec<RequirementEvaluation>) -> Self {
        Self {
            granted: evaluations.iter().all(RequirementEvaluation::is_satisfied),
            evaluations,
        }
    }

    /// Convert into the error the first unsatisfied requirement would raise.
    pub fn into_result(self) -> Result<(), AuthzError> {
        match self.evaluations.into_iter().find(|e| !e.is_satisfied()) {
            None => Ok(()),
            Some(e) if e.decision == Decision::Fail => Err(AuthzError::Denied(e.requirement.to_string())),
            Some(e) => Err(AuthzError::Undetermined(e.requirement.to_string())),
        }
    }
}
