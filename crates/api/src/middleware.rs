use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use tessera_auth::{JwtValidator, Principal};

use crate::context::RequestCancellation;

#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<dyn JwtValidator>,
}

/// Attach the request `Principal` and `RequestCancellation`.
///
/// Requests without an `Authorization` header continue as anonymous; guarded
/// routes refuse them. A present but invalid bearer token is rejected here.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let principal = match extract_bearer(req.headers())? {
        None => Principal::anonymous(),
        Some(token) => state
            .jwt
            .validate(token, Utc::now())
            .map_err(|e| {
                tracing::debug!(error = %e, "rejected bearer token");
                StatusCode::UNAUTHORIZED
            })?
            .into_principal(),
    };

    let cancellation = RequestCancellation::new();
    let _cancel_on_drop = cancellation.drop_guard();

    req.extensions_mut().insert(principal);
    req.extensions_mut().insert(cancellation);

    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Result<Option<&str>, StatusCode> {
    let Some(header) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };

    let header = header.to_str().map_err(|_| StatusCode::UNAUTHORIZED)?;

    let header = header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = header.trim();
    if token.is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(Some(token))
}
