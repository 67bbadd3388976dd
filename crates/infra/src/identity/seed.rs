//! JSON seed for the in-memory identity store (dev/test deployments).
//!
//! ```json
//! {
//!   "users": [{ "username": "alice" }],
//!   "roles": [{ "name": "editor" }],
//!   "assignments": [{ "username": "alice", "role": "editor" }],
//!   "role_claims": [{ "role": "editor", "claim_type": "permission", "claim_value": "orders.edit" }]
//! }
//! ```
//!
//! Records reference each other by username / role name; ids are minted unless
//! given explicitly.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tessera_auth::{RoleRecord, StoreError, UserRecord};
use tessera_core::{DomainError, RoleId, UserId};

use super::InMemoryIdentityStore;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid seed json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown user '{0}' in seed")]
    UnknownUser(String),

    #[error("unknown role '{0}' in seed")]
    UnknownRole(String),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdentitySeed {
    #[serde(default)]
    pub users: Vec<SeedUser>,
    #[serde(default)]
    pub roles: Vec<SeedRole>,
    #[serde(default)]
    pub assignments: Vec<SeedAssignment>,
    #[serde(default)]
    pub role_claims: Vec<SeedRoleClaim>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedUser {
    #[serde(default)]
    pub id: Option<String>,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedRole {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedAssignment {
    pub username: String,
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedRoleClaim {
    pub role: String,
    pub claim_type: String,
    pub claim_value: String,
}

impl IdentitySeed {
    pub fn from_json(json: &str) -> Result<Self, SeedError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SeedError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Load every record into `store`, in dependency order.
    pub fn apply(&self, store: &InMemoryIdentityStore) -> Result<(), SeedError> {
        for user in &self.users {
            store.insert_user(UserRecord {
                id: user.id.clone().map(UserId::from_string).unwrap_or_default(),
                username: user.username.clone(),
            })?;
        }

        for role in &self.roles {
            store.insert_role(RoleRecord {
                id: role.id.clone().map(RoleId::from_string).unwrap_or_default(),
                name: role.name.clone(),
            })?;
        }

        for assignment in &self.assignments {
            let user = store
                .user_by_username(&assignment.username)?
                .ok_or_else(|| SeedError::UnknownUser(assignment.username.clone()))?;
            let role = store
                .role_by_name(&assignment.role)?
                .ok_or_else(|| SeedError::UnknownRole(assignment.role.clone()))?;
            store.assign_role(&user.id, &role.id)?;
        }

        for claim in &self.role_claims {
            let role = store
                .role_by_name(&claim.role)?
                .ok_or_else(|| SeedError::UnknownRole(claim.role.clone()))?;
            store.add_role_claim(&role.id, claim.claim_type.clone(), claim.claim_value.clone())?;
        }

        tracing::info!(
            users = self.users.len(),
            roles = self.roles.len(),
            assignments = self.assignments.len(),
            role_claims = self.role_claims.len(),
            "identity seed applied"
        );
        Ok(())
    }
}

impl InMemoryIdentityStore {
    pub fn from_seed(seed: &IdentitySeed) -> Result<Self, SeedError> {
        let store = Self::new();
        seed.apply(&store)?;
        Ok(store)
    }
}
