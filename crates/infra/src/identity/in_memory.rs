use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard};

use async_trait::async_trait;

use tessera_auth::{
    IdentityStore, RoleClaimRecord, RoleRecord, StoreError, UserRecord, UserRoleAssignment,
};
use tessera_core::{DomainError, DomainResult, RoleId, UserId};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<UserId, UserRecord>,
    roles: HashMap<RoleId, RoleRecord>,
    assignments: HashSet<UserRoleAssignment>,
    role_claims: Vec<RoleClaimRecord>,
}

/// In-memory identity store for tests/dev.
///
/// Usernames and role names are unique; a (user, role) assignment exists at
/// most once.
#[derive(Debug, Default)]
pub struct InMemoryIdentityStore {
    tables: RwLock<Tables>,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables
            .read()
            .map_err(|_| StoreError::unavailable("identity tables lock poisoned"))
    }

    fn write<T>(&self, f: impl FnOnce(&mut Tables) -> DomainResult<T>) -> DomainResult<T> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| DomainError::invariant("identity tables lock poisoned"))?;
        f(&mut tables)
    }

    pub fn insert_user(&self, user: UserRecord) -> DomainResult<()> {
        if user.username.trim().is_empty() {
            return Err(DomainError::validation("username cannot be empty"));
        }
        self.write(|t| {
            if t.users.contains_key(&user.id) {
                return Err(DomainError::conflict(format!("user id '{}' already exists", user.id)));
            }
            if t.users.values().any(|u| u.username == user.username) {
                return Err(DomainError::conflict(format!(
                    "username '{}' already exists",
                    user.username
                )));
            }
            t.users.insert(user.id.clone(), user);
            Ok(())
        })
    }

    pub fn insert_role(&self, role: RoleRecord) -> DomainResult<()> {
        if role.name.trim().is_empty() {
            return Err(DomainError::validation("role name cannot be empty"));
        }
        self.write(|t| {
            if t.roles.contains_key(&role.id) {
                return Err(DomainError::conflict(format!("role id '{}' already exists", role.id)));
            }
            if t.roles.values().any(|r| r.name == role.name) {
                return Err(DomainError::conflict(format!("role '{}' already exists", role.name)));
            }
            t.roles.insert(role.id.clone(), role);
            Ok(())
        })
    }

    /// Assign a role to a user. Returns `false` when the pair already existed.
    pub fn assign_role(&self, user_id: &UserId, role_id: &RoleId) -> DomainResult<bool> {
        self.write(|t| {
            if !t.users.contains_key(user_id) {
                return Err(DomainError::not_found(format!("user '{user_id}'")));
            }
            if !t.roles.contains_key(role_id) {
                return Err(DomainError::not_found(format!("role '{role_id}'")));
            }
            Ok(t.assignments.insert(UserRoleAssignment {
                user_id: user_id.clone(),
                role_id: role_id.clone(),
            }))
        })
    }

    /// Remove a role assignment. Returns `false` when there was none.
    pub fn revoke_role(&self, user_id: &UserId, role_id: &RoleId) -> DomainResult<bool> {
        self.write(|t| {
            Ok(t.assignments.remove(&UserRoleAssignment {
                user_id: user_id.clone(),
                role_id: role_id.clone(),
            }))
        })
    }

    pub fn add_role_claim(
        &self,
        role_id: &RoleId,
        claim_type: impl Into<String>,
        claim_value: impl Into<String>,
    ) -> DomainResult<()> {
        let claim = RoleClaimRecord {
            role_id: role_id.clone(),
            claim_type: claim_type.into(),
            claim_value: claim_value.into(),
        };
        self.write(|t| {
            if !t.roles.contains_key(role_id) {
                return Err(DomainError::not_found(format!("role '{role_id}'")));
            }
            t.role_claims.push(claim);
            Ok(())
        })
    }

    pub fn role_by_name(&self, name: &str) -> Result<Option<RoleRecord>, StoreError> {
        let tables = self.read()?;
        Ok(tables.roles.values().find(|r| r.name == name).cloned())
    }

    pub fn user_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        let tables = self.read()?;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    /// Poison the table lock, as a panicking writer would.
    #[cfg(test)]
    pub(crate) fn poison(&self) {
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = self.tables.write();
            panic!("writer panicked while holding the identity tables");
        }));
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        let tables = self.read()?;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    async fn list_role_assignments(&self, user_id: &UserId) -> Result<Vec<UserRoleAssignment>, StoreError> {
        let tables = self.read()?;
        Ok(tables
            .assignments
            .iter()
            .filter(|a| &a.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_roles(&self) -> Result<Vec<RoleRecord>, StoreError> {
        let tables = self.read()?;
        Ok(tables.roles.values().cloned().collect())
    }

    async fn list_role_claims(&self) -> Result<Vec<RoleClaimRecord>, StoreError> {
        let tables = self.read()?;
        Ok(tables.role_claims.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tessera_auth::{Decision, PermissionRequirementHandler, Principal, Requirement};
    use tessera_auth::AuthorizationHandler;
    use tokio_util::sync::CancellationToken;

    use super::*;

    fn user(id: &str, username: &str) -> UserRecord {
        UserRecord {
            id: UserId::from_string(id),
            username: username.to_string(),
        }
    }

    fn role(id: &str, name: &str) -> RoleRecord {
        RoleRecord {
            id: RoleId::from_string(id),
            name: name.to_string(),
        }
    }

    fn seeded() -> InMemoryIdentityStore {
        let store = InMemoryIdentityStore::new();
        store.insert_user(user("u-alice", "alice")).unwrap();
        store.insert_role(role("r-editor", "editor")).unwrap();
        store.insert_role(role("r-viewer", "viewer")).unwrap();
        store
            .assign_role(&UserId::from_string("u-alice"), &RoleId::from_string("r-editor"))
            .unwrap();
        store
            .add_role_claim(&RoleId::from_string("r-editor"), "permission", "orders.edit")
            .unwrap();
        store
            .add_role_claim(&RoleId::from_string("r-viewer"), "permission", "orders.read")
            .unwrap();
        store
    }

    #[tokio::test]
    async fn finds_user_by_exact_username() {
        let store = seeded();
        assert_eq!(
            store.find_user_by_username("alice").await.unwrap(),
            Some(user("u-alice", "alice"))
        );
        assert_eq!(store.find_user_by_username("Alice").await.unwrap(), None);
    }

    #[tokio::test]
    async fn role_claims_follow_assignments() {
        let store = seeded();
        let alice = UserId::from_string("u-alice");

        let claims = store.role_claims_for_user(&alice).await.unwrap();
        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].claim_value, "orders.edit");

        store.revoke_role(&alice, &RoleId::from_string("r-editor")).unwrap();
        assert!(store.role_claims_for_user(&alice).await.unwrap().is_empty());
    }

    #[test]
    fn duplicate_assignment_is_a_no_op() {
        let store = seeded();
        let assigned = store
            .assign_role(&UserId::from_string("u-alice"), &RoleId::from_string("r-editor"))
            .unwrap();
        assert!(!assigned);
    }

    #[test]
    fn rejects_duplicate_usernames_and_role_names() {
        let store = seeded();
        assert!(matches!(
            store.insert_user(user("u-other", "alice")),
            Err(DomainError::Conflict(_))
        ));
        assert!(matches!(
            store.insert_role(role("r-other", "editor")),
            Err(DomainError::Conflict(_))
        ));
    }

    #[test]
    fn rejects_dangling_references() {
        let store = seeded();
        assert!(matches!(
            store.assign_role(&UserId::from_string("u-ghost"), &RoleId::from_string("r-editor")),
            Err(DomainError::NotFound(_))
        ));
        assert!(matches!(
            store.add_role_claim(&RoleId::from_string("r-ghost"), "permission", "x"),
            Err(DomainError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn drives_permission_handler() {
        let store = Arc::new(seeded());
        let handler = PermissionRequirementHandler::new(store.clone());
        let alice = Principal::authenticated("sub", Some("alice".to_string()), "Bearer");
        let cancel = CancellationToken::new();

        let before = handler
            .handle(&alice, &Requirement::permission("orders.read"), &cancel)
            .await
            .unwrap();
        assert_eq!(before, Decision::Fail);

        // No caching: a new assignment is visible on the next evaluation.
        store
            .assign_role(&UserId::from_string("u-alice"), &RoleId::from_string("r-viewer"))
            .unwrap();
        let after = handler
            .handle(&alice, &Requirement::permission("orders.read"), &cancel)
            .await
            .unwrap();
        assert_eq!(after, Decision::Succeed);
    }

    #[tokio::test]
    async fn poisoned_tables_surface_as_store_errors() {
        let store = seeded();
        store.poison();

        assert!(matches!(store.user_by_username("alice"), Err(StoreError::Unavailable(_))));
        assert!(matches!(store.role_by_name("editor"), Err(StoreError::Unavailable(_))));
        assert!(matches!(
            store.find_user_by_username("alice").await,
            Err(StoreError::Unavailable(_))
        ));
    }
}
