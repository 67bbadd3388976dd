use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::json;

use tessera_api::app::{build_router, services};
use tessera_auth::{
    Claim, Hs256JwtValidator, IdentityStore, PermissionAllowList, RoleClaimRecord, RoleRecord,
    StoreError, TokenClaims, UserRecord, UserRoleAssignment,
};
use tessera_core::UserId;
use tessera_infra::{IdentitySeed, InMemoryIdentityStore};

const JWT_SECRET: &str = "test-secret";

const SEED: &str = r#"{
    "users": [{ "id": "u-alice", "username": "alice" }, { "id": "u-bob", "username": "bob" }],
    "roles": [{ "name": "editor" }],
    "assignments": [{ "username": "alice", "role": "editor" }],
    "role_claims": [
        { "role": "editor", "claim_type": "permission", "claim_value": "users.read" },
        { "role": "editor", "claim_type": "permission", "claim_value": "orders.edit" }
    ]
}"#;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn_with_store(store: Arc<dyn IdentityStore>) -> Self {
        // Same router as prod, bound to an ephemeral port.
        let services = Arc::new(services::AppServices::new(
            store,
            PermissionAllowList::default(),
            services::default_policy(),
        ));
        let app = build_router(services, Arc::new(Hs256JwtValidator::new(JWT_SECRET)));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    async fn spawn() -> Self {
        let seed = IdentitySeed::from_json(SEED).unwrap();
        let store = InMemoryIdentityStore::from_seed(&seed).unwrap();
        Self::spawn_with_store(Arc::new(store)).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(secret: &str, name: &str, claims: Vec<Claim>) -> String {
    let now = Utc::now();
    let claims = TokenClaims {
        sub: format!("sub-{name}"),
        name: Some(name.to_string()),
        claims,
        issued_at: now - ChronoDuration::seconds(5),
        expires_at: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn token(name: &str) -> String {
    mint_jwt(JWT_SECRET, name, Vec::new())
}

/// Identity store whose every lookup fails.
struct DownStore;

#[async_trait]
impl IdentityStore for DownStore {
    async fn find_user_by_username(&self, _username: &str) -> Result<Option<UserRecord>, StoreError> {
        Err(StoreError::unavailable("connection refused"))
    }

    async fn list_role_assignments(&self, _user_id: &UserId) -> Result<Vec<UserRoleAssignment>, StoreError> {
        Err(StoreError::unavailable("connection refused"))
    }

    async fn list_roles(&self) -> Result<Vec<RoleRecord>, StoreError> {
        Err(StoreError::unavailable("connection refused"))
    }

    async fn list_role_claims(&self) -> Result<Vec<RoleClaimRecord>, StoreError> {
        Err(StoreError::unavailable("connection refused"))
    }
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;

    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn requests_without_token_run_as_anonymous() {
    let srv = TestServer::spawn().await;

    let res = reqwest::get(srv.url("/whoami")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["authenticated"], false);
    assert!(body["name"].is_null());
}

#[tokio::test]
async fn principal_is_derived_from_token() {
    let srv = TestServer::spawn().await;
    let token = mint_jwt(JWT_SECRET, "alice", vec![Claim::new("permissions", "read")]);

    let client = reqwest::Client::new();
    let res = client
        .get(srv.url("/whoami"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["name"], "alice");
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["claims"][0]["type"], "permissions");
}

#[tokio::test]
async fn invalid_token_is_unauthorized() {
    let srv = TestServer::spawn().await;
    let forged = mint_jwt("wrong-secret", "alice", Vec::new());

    let client = reqwest::Client::new();
    let res = client
        .get(srv.url("/whoami"))
        .bearer_auth(forged)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn role_claims_route_requires_role_permission() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    // alice's editor role grants users.read.
    let res = client
        .get(srv.url("/users/alice/role-claims"))
        .bearer_auth(token("alice"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["user"]["id"], "u-alice");
    assert_eq!(body["role_claims"].as_array().unwrap().len(), 2);

    // bob is known but has no role: explicit denial.
    let res = client
        .get(srv.url("/users/alice/role-claims"))
        .bearer_auth(token("bob"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "forbidden");
    assert!(body["message"].as_str().unwrap().contains("was denied"));

    // carol is unknown to the store: undetermined, still refused.
    let res = client
        .get(srv.url("/users/alice/role-claims"))
        .bearer_auth(token("carol"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body["message"].as_str().unwrap().contains("could not be satisfied"));

    // Anonymous callers are refused the same way.
    let res = client
        .get(srv.url("/users/alice/role-claims"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_user_lookup_is_not_found() {
    let srv = TestServer::spawn().await;

    let client = reqwest::Client::new();
    let res = client
        .get(srv.url("/users/nobody/role-claims"))
        .bearer_auth(token("alice"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn policies_route_requires_permission_claim() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let allowed = mint_jwt(JWT_SECRET, "bob", vec![Claim::new("permissions", "read create")]);
    let res = client
        .get(srv.url("/policies"))
        .bearer_auth(allowed)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(
        body["operations"]["users.role_claims.read"][0],
        json!({ "kind": "permission", "permission": "users.read" })
    );

    for value in ["approve", ""] {
        let token = mint_jwt(JWT_SECRET, "bob", vec![Claim::new("permissions", value)]);
        let res = client
            .get(srv.url("/policies"))
            .bearer_auth(token)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN, "claim value {value:?}");
    }
}

#[tokio::test]
async fn explain_reports_each_requirement() {
    let srv = TestServer::spawn().await;

    let client = reqwest::Client::new();
    let res = client
        .post(srv.url("/authz/explain"))
        .bearer_auth(token("alice"))
        .json(&json!({
            "requirements": [
                { "kind": "permission", "permission": "orders.edit" },
                { "kind": "permission", "permission": "orders.delete" }
            ]
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["principal"], "alice");
    assert_eq!(body["granted"], false);
    assert_eq!(body["evaluations"][0]["decision"], "succeed");
    assert_eq!(body["evaluations"][1]["decision"], "fail");
}

#[tokio::test]
async fn explain_expands_named_operation() {
    let srv = TestServer::spawn().await;

    let client = reqwest::Client::new();
    let res = client
        .post(srv.url("/authz/explain"))
        .bearer_auth(token("alice"))
        .json(&json!({ "operation": "users.role_claims.read" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["operation"], "users.role_claims.read");
    assert_eq!(body["granted"], true);
    assert_eq!(body["evaluations"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn explain_rejects_undeclared_operation() {
    let srv = TestServer::spawn().await;

    let client = reqwest::Client::new();
    let res = client
        .post(srv.url("/authz/explain"))
        .json(&json!({ "operation": "users.role_claims.raed" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "unknown_operation");
}

#[tokio::test]
async fn store_outage_is_a_server_error() {
    let srv = TestServer::spawn_with_store(Arc::new(DownStore)).await;

    let client = reqwest::Client::new();
    let res = client
        .get(srv.url("/users/alice/role-claims"))
        .bearer_auth(token("alice"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "store_unavailable");
}
