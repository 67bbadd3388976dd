use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{AuthorizationHandler, cancellable};
use crate::{AuthzError, Decision, IdentityStore, Principal, Requirement};

/// Resolves permission requirements through the principal's persisted roles.
///
/// Every call re-queries the store: no caching, no shared state between calls.
/// Missing identity or an unknown username leaves the requirement
/// `Undetermined`; a known user without a matching role-claim fails it.
#[derive(Debug, Clone)]
pub struct PermissionRequirementHandler<S> {
    store: S,
}

impl<S> PermissionRequirementHandler<S>
where
    S: IdentityStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

#[async_trait]
impl<S> AuthorizationHandler for PermissionRequirementHandler<S>
where
    S: IdentityStore,
{
    fn name(&self) -> &'static str {
        "permission_requirement"
    }

    async fn handle(
        &self,
        principal: &Principal,
        requirement: &Requirement,
        cancel: &CancellationToken,
    ) -> Result<Decision, AuthzError> {
        let Requirement::Permission(requirement) = requirement else {
            return Ok(Decision::Undetermined);
        };
        let permission = requirement.permission.as_str();

        let Some(username) = principal.name() else {
            tracing::debug!(
                handler = self.name(),
                requirement = permission,
                "principal has no authenticated name"
            );
            return Ok(Decision::Undetermined);
        };

        let user = cancellable(cancel, self.store.find_user_by_username(username))
            .await
            .inspect_err(|e| log_lookup_error(username, permission, e))?;
        let Some(user) = user else {
            tracing::debug!(
                handler = self.name(),
                requirement = permission,
                principal = username,
                "user not found in identity store"
            );
            return Ok(Decision::Undetermined);
        };

        let role_claims = cancellable(cancel, self.store.role_claims_for_user(&user.id))
            .await
            .inspect_err(|e| log_lookup_error(username, permission, e))?;

        let decision = if role_claims.iter().any(|c| c.claim_value == permission) {
            Decision::Succeed
        } else {
            Decision::Fail
        };

        tracing::debug!(
            handler = self.name(),
            requirement = permission,
            principal = username,
            user_id = %user.id,
            role_claims = role_claims.len(),
            %decision,
            "permission requirement evaluated"
        );
        Ok(decision)
    }
}

fn log_lookup_error(username: &str, permission: &str, err: &AuthzError) {
    match err {
        AuthzError::Cancelled => {
            tracing::debug!(principal = username, requirement = permission, "permission lookup cancelled")
        }
        other => {
            tracing::warn!(principal = username, requirement = permission, error = %other, "permission lookup failed")
        }
    }
}
