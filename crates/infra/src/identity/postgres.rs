//! Postgres-backed identity store.
//!
//! Reads the `users`, `roles`, `user_roles` and `role_claims` tables (see
//! `migrations/0001_identity.sql`).
//!
//! ## Error Mapping
//!
//! Every `sqlx::Error` becomes `StoreError::Unavailable`: the authorization
//! core treats any failure to read identity data as an infrastructure outage.
//! A missing row is not an error (`fetch_optional` / empty `fetch_all`).

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Row};
use tracing::instrument;

use tessera_auth::{
    IdentityStore, RoleClaimRecord, RoleRecord, StoreError, UserRecord, UserRoleAssignment,
};
use tessera_core::{RoleId, UserId};

const SCHEMA: &str = include_str!("../../migrations/0001_identity.sql");

/// Postgres-backed identity store.
///
/// ## Thread Safety
///
/// Uses SQLx connection pool which is thread-safe (Arc + Send + Sync).
/// Each lookup checks out its own connection; nothing is cached in-process.
#[derive(Debug, Clone)]
pub struct PostgresIdentityStore {
    pool: Arc<PgPool>,
}

#[derive(Debug)]
struct UserRow {
    id: String,
    username: String,
}

#[derive(Debug)]
struct RoleRow {
    id: String,
    name: String,
}

#[derive(Debug)]
struct UserRoleRow {
    user_id: String,
    role_id: String,
}

#[derive(Debug)]
struct RoleClaimRow {
    role_id: String,
    claim_type: String,
    claim_value: String,
}

impl<'r> FromRow<'r, PgRow> for UserRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(UserRow {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for RoleRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(RoleRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for UserRoleRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(UserRoleRow {
            user_id: row.try_get("user_id")?,
            role_id: row.try_get("role_id")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for RoleClaimRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(RoleClaimRow {
            role_id: row.try_get("role_id")?,
            claim_type: row.try_get("claim_type")?,
            claim_value: row.try_get("claim_value")?,
        })
    }
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId::from_string(row.id),
            username: row.username,
        }
    }
}

impl From<RoleRow> for RoleRecord {
    fn from(row: RoleRow) -> Self {
        Self {
            id: RoleId::from_string(row.id),
            name: row.name,
        }
    }
}

impl From<UserRoleRow> for UserRoleAssignment {
    fn from(row: UserRoleRow) -> Self {
        Self {
            user_id: UserId::from_string(row.user_id),
            role_id: RoleId::from_string(row.role_id),
        }
    }
}

impl From<RoleClaimRow> for RoleClaimRecord {
    fn from(row: RoleClaimRow) -> Self {
        Self {
            role_id: RoleId::from_string(row.role_id),
            claim_type: row.claim_type,
            claim_value: row.claim_value,
        }
    }
}

impl PostgresIdentityStore {
    /// Create a new PostgresIdentityStore with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Connect to `database_url` with a default-sized pool.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create the identity tables if they do not exist.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }
}

#[async_trait]
impl IdentityStore for PostgresIdentityStore {
    #[instrument(skip(self), err)]
    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>("SELECT id, username FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user_by_username", e))?;
        Ok(row.map(Into::into))
    }

    #[instrument(skip(self), fields(user_id = %user_id), err)]
    async fn list_role_assignments(&self, user_id: &UserId) -> Result<Vec<UserRoleAssignment>, StoreError> {
        let rows = sqlx::query_as::<_, UserRoleRow>(
            "SELECT user_id, role_id FROM user_roles WHERE user_id = $1",
        )
        .bind(user_id.as_str())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_role_assignments", e))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self), err)]
    async fn list_roles(&self) -> Result<Vec<RoleRecord>, StoreError> {
        let rows = sqlx::query_as::<_, RoleRow>("SELECT id, name FROM roles ORDER BY name")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_roles", e))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self), err)]
    async fn list_role_claims(&self) -> Result<Vec<RoleClaimRecord>, StoreError> {
        let rows = sqlx::query_as::<_, RoleClaimRow>(
            "SELECT role_id, claim_type, claim_value FROM role_claims ORDER BY id",
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_role_claims", e))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Single joined query instead of three table scans.
    #[instrument(skip(self), fields(user_id = %user_id), err)]
    async fn role_claims_for_user(&self, user_id: &UserId) -> Result<Vec<RoleClaimRecord>, StoreError> {
        let rows = sqlx::query_as::<_, RoleClaimRow>(
            r#"
            SELECT rc.role_id, rc.claim_type, rc.claim_value
            FROM user_roles ur
            JOIN roles r ON r.id = ur.role_id
            JOIN role_claims rc ON rc.role_id = r.id
            WHERE ur.user_id = $1
            ORDER BY rc.id
            "#,
        )
        .bind(user_id.as_str())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("role_claims_for_user", e))?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => StoreError::unavailable(format!(
            "database error in {}: {} (code {})",
            operation,
            db_err.message(),
            db_err.code().as_deref().unwrap_or("none")
        )),
        sqlx::Error::PoolClosed => {
            StoreError::unavailable(format!("connection pool closed in {}", operation))
        }
        sqlx::Error::PoolTimedOut => {
            StoreError::unavailable(format!("connection pool timed out in {}", operation))
        }
        other => StoreError::unavailable(format!("{} failed: {}", operation, other)),
    }
}
