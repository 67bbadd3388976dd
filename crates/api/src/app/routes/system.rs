use axum::{extract::Extension, http::StatusCode, Json};

use tessera_auth::Principal;

use crate::app::dto::WhoAmIResponse;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// GET /whoami - The principal this request runs as (anonymous when no token).
pub async fn whoami(Extension(principal): Extension<Principal>) -> Json<WhoAmIResponse> {
    Json(WhoAmIResponse::from(&principal))
}
