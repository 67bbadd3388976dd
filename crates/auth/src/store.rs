//! Identity Store query surface.
//!
//! The authorization core only reads from the store. Adapters live in
//! `tessera-infra` (in-memory for tests/dev, Postgres for deployments).

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tessera_core::{RoleId, UserId};

/// Persisted user, keyed by username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
}

/// Persisted role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRecord {
    pub id: RoleId,
    pub name: String,
}

/// Many-to-many link between users and roles (unique per pair).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserRoleAssignment {
    pub user_id: UserId,
    pub role_id: RoleId,
}

/// Claim granted to every holder of a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleClaimRecord {
    pub role_id: RoleId,
    pub claim_type: String,
    pub claim_value: String,
}

/// Infrastructure failure talking to the identity store.
///
/// Lookup misses are not errors; they come back as `None`/empty results.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("identity store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}

/// Read-only identity lookups used by the permission handler.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError>;

    async fn list_role_assignments(&self, user_id: &UserId) -> Result<Vec<UserRoleAssignment>, StoreError>;

    async fn list_roles(&self) -> Result<Vec<RoleRecord>, StoreError>;

    async fn list_role_claims(&self) -> Result<Vec<RoleClaimRecord>, StoreError>;

    /// Every role-claim visible to the user through its role assignments.
    ///
    /// Joins assignments → roles → role-claims. Assignments pointing at a role
    /// that no longer exists contribute nothing. Adapters with a query engine
    /// should override this with a single joined query.
    async fn role_claims_for_user(&self, user_id: &UserId) -> Result<Vec<RoleClaimRecord>, StoreError> {
        let assigned: HashSet<RoleId> = self
            .list_role_assignments(user_id)
            .await?
            .into_iter()
            .map(|a| a.role_id)
            .collect();
        if assigned.is_empty() {
            return Ok(Vec::new());
        }

        let roles: HashSet<RoleId> = self
            .list_roles()
            .await?
            .into_iter()
            .filter(|r| assigned.contains(&r.id))
            .map(|r| r.id)
            .collect();
        if roles.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self
            .list_role_claims()
            .await?
            .into_iter()
            .filter(|c| roles.contains(&c.role_id))
            .collect())
    }
}

#[async_trait]
impl<S> IdentityStore for Arc<S>
where
    S: IdentityStore + ?Sized,
{
    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        (**self).find_user_by_username(username).await
    }

    async fn list_role_assignments(&self, user_id: &UserId) -> Result<Vec<UserRoleAssignment>, StoreError> {
        (**self).list_role_assignments(user_id).await
    }

    async fn list_roles(&self) -> Result<Vec<RoleRecord>, StoreError> {
        (**self).list_roles().await
    }

    async fn list_role_claims(&self) -> Result<Vec<RoleClaimRecord>, StoreError> {
        (**self).list_role_claims().await
    }

    async fn role_claims_for_user(&self, user_id: &UserId) -> Result<Vec<RoleClaimRecord>, StoreError> {
        (**self).role_claims_for_user(user_id).await
    }
}
