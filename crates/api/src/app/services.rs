use std::sync::Arc;

use anyhow::Context;

use tessera_auth::{DecisionPoint, IdentityStore, OperationPolicy, PermissionAllowList, Requirement};
use tessera_infra::{Config, InMemoryIdentityStore, PostgresIdentityStore};

/// Guarded operation: read the role-claims granted to a user.
pub const OP_USER_ROLE_CLAIMS_READ: &str = "users.role_claims.read";

/// Guarded operation: list the configured operation policy.
pub const OP_POLICIES_READ: &str = "policies.read";

/// Shared per-process services handed to every route.
#[derive(Clone)]
pub struct AppServices {
    pub store: Arc<dyn IdentityStore>,
    pub decision_point: DecisionPoint,
    pub policy: OperationPolicy,
    pub allow_list: PermissionAllowList,
}

impl AppServices {
    pub fn new(store: Arc<dyn IdentityStore>, allow_list: PermissionAllowList, policy: OperationPolicy) -> Self {
        Self {
            decision_point: DecisionPoint::standard(store.clone(), allow_list.clone()),
            store,
            policy,
            allow_list,
        }
    }
}

/// Requirements of the routes this API serves, before any policy file is applied.
pub fn default_policy() -> OperationPolicy {
    OperationPolicy::new()
        .with_operation(OP_USER_ROLE_CLAIMS_READ, [Requirement::permission("users.read")])
        .with_operation(OP_POLICIES_READ, [Requirement::claim("permissions")])
}

/// Wire the identity store, decision point and policy from configuration.
///
/// `DATABASE_URL` selects Postgres; otherwise an in-memory store is used,
/// optionally loaded from the identity seed file.
pub async fn build_services(config: &Config) -> anyhow::Result<AppServices> {
    let store: Arc<dyn IdentityStore> = match &config.database_url {
        Some(url) => {
            let store = PostgresIdentityStore::connect(url)
                .await
                .context("failed to connect to identity database")?;
            store
                .ensure_schema()
                .await
                .context("failed to prepare identity schema")?;
            tracing::info!("using postgres identity store");
            Arc::new(store)
        }
        None => {
            let store = match config.load_seed()? {
                Some(seed) => InMemoryIdentityStore::from_seed(&seed)?,
                None => InMemoryIdentityStore::new(),
            };
            tracing::warn!("DATABASE_URL not set; using in-memory identity store");
            Arc::new(store)
        }
    };

    let policy = match config.load_policy()? {
        Some(overrides) => default_policy().merged(overrides),
        None => default_policy(),
    };
    tracing::info!(
        operations = policy.len(),
        allow_list = ?config.allow_list.tokens().collect::<Vec<_>>(),
        "authorization policy loaded"
    );

    Ok(AppServices::new(store, config.allow_list.clone(), policy))
}
