use axum::{
    routing::{get, post},
    Router,
};

pub mod authz;
pub mod policies;
pub mod system;
pub mod users;

/// Router for every endpoint that sees a request principal.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/authz/explain", post(authz::explain))
        .route("/users/:username/role-claims", get(users::role_claims))
        .route("/policies", get(policies::list))
}
