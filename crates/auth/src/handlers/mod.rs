//! Requirement handlers.
//!
//! A handler resolves one requirement for one principal. Handlers only look at
//! the requirement kinds they own and report `Undetermined` for the rest, so
//! the decision point can run every handler against every requirement.

use std::future::Future;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::{AuthzError, Decision, Principal, Requirement, StoreError};

mod claim;
mod permission;

pub use claim::PermissionClaimHandler;
pub use permission::PermissionRequirementHandler;

#[async_trait]
pub trait AuthorizationHandler: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    async fn handle(
        &self,
        principal: &Principal,
        requirement: &Requirement,
        cancel: &CancellationToken,
    ) -> Result<Decision, AuthzError>;
}

/// Run a store lookup unless the caller cancels first.
pub(crate) async fn cancellable<T, F>(cancel: &CancellationToken, lookup: F) -> Result<T, AuthzError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AuthzError::Cancelled),
        result = lookup => result.map_err(AuthzError::from),
    }
}
