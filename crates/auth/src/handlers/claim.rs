use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::AuthorizationHandler;
use crate::{AuthzError, Decision, PermissionAllowList, Principal, Requirement};

/// Grants a claim requirement when the principal's claim of that type lists an
/// allowed token.
///
/// The claim value is split on single spaces; comparison is exact and
/// case-sensitive. This handler opts in or stays neutral, it never fails a
/// requirement.
#[derive(Debug, Clone, Default)]
pub struct PermissionClaimHandler {
    allow_list: PermissionAllowList,
}

impl PermissionClaimHandler {
    pub fn new(allow_list: PermissionAllowList) -> Self {
        Self { allow_list }
    }

    /// Pure evaluation of a claim requirement against a principal.
    pub fn evaluate(&self, principal: &Principal, claim_type: &str) -> Decision {
        if !principal.is_authenticated() {
            return Decision::Undetermined;
        }

        let Some(claim) = principal.find_first(claim_type) else {
            return Decision::Undetermined;
        };

        if claim.value.trim().is_empty() {
            return Decision::Undetermined;
        }

        if claim.value.split(' ').any(|token| self.allow_list.contains(token)) {
            Decision::Succeed
        } else {
            Decision::Undetermined
        }
    }
}

#[async_trait]
impl AuthorizationHandler for PermissionClaimHandler {
    fn name(&self) -> &'static str {
        "permission_claim"
    }

    async fn handle(
        &self,
        principal: &Principal,
        requirement: &Requirement,
        _cancel: &CancellationToken,
    ) -> Result<Decision, AuthzError> {
        let Requirement::Claim(requirement) = requirement else {
            return Ok(Decision::Undetermined);
        };

        let decision = self.evaluate(principal, &requirement.claim_type);
        tracing::debug!(
            handler = self.name(),
            requirement = %requirement.claim_type,
            principal = %principal,
            %decision,
            "claim requirement evaluated"
        );
        Ok(decision)
    }
}
