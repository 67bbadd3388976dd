//! Test-only identity store.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use tessera_core::{RoleId, UserId};

use crate::{IdentityStore, RoleClaimRecord, RoleRecord, StoreError, UserRecord, UserRoleAssignment};

#[derive(Debug, Default)]
pub(crate) struct FixtureStore {
    users: Vec<UserRecord>,
    roles: Vec<RoleRecord>,
    assignments: Vec<UserRoleAssignment>,
    role_claims: Vec<RoleClaimRecord>,
    failing: bool,
    hanging: bool,
    lookups: AtomicUsize,
}

impl FixtureStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_user(mut self, id: &str, username: &str) -> Self {
        self.users.push(UserRecord {
            id: UserId::from_string(id),
            username: username.to_string(),
        });
        self
    }

    pub(crate) fn with_role(mut self, id: &str, name: &str) -> Self {
        self.roles.push(RoleRecord {
            id: RoleId::from_string(id),
            name: name.to_string(),
        });
        self
    }

    pub(crate) fn with_assignment(mut self, user_id: &str, role_id: &str) -> Self {
        self.assignments.push(UserRoleAssignment {
            user_id: UserId::from_string(user_id),
            role_id: RoleId::from_string(role_id),
        });
        self
    }

    pub(crate) fn with_role_claim(mut self, role_id: &str, claim_type: &str, value: &str) -> Self {
        self.role_claims.push(RoleClaimRecord {
            role_id: RoleId::from_string(role_id),
            claim_type: claim_type.to_string(),
            claim_value: value.to_string(),
        });
        self
    }

    /// Every lookup returns `StoreError::Unavailable`.
    pub(crate) fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    /// Every lookup waits forever.
    pub(crate) fn hanging(mut self) -> Self {
        self.hanging = true;
        self
    }

    pub(crate) fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    async fn enter(&self) -> Result<(), StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.hanging {
            std::future::pending::<()>().await;
        }
        if self.failing {
            return Err(StoreError::unavailable("connection refused"));
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityStore for FixtureStore {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        self.enter().await?;
        Ok(self.users.iter().find(|u| u.username == username).cloned())
    }

    async fn list_role_assignments(&self, user_id: &UserId) -> Result<Vec<UserRoleAssignment>, StoreError> {
        self.enter().await?;
        Ok(self
            .assignments
            .iter()
            .filter(|a| &a.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_roles(&self) -> Result<Vec<RoleRecord>, StoreError> {
        self.enter().await?;
        Ok(self.roles.clone())
    }

    async fn list_role_claims(&self) -> Result<Vec<RoleClaimRecord>, StoreError> {
        self.enter().await?;
        Ok(self.role_claims.clone())
    }
}
