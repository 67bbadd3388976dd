//! API-side authorization guard for operations.
//!
//! Enforces the configured operation policy before a handler does any work,
//! while keeping the handlers themselves policy-agnostic.

use axum::response::Response;

use tessera_auth::Principal;

use crate::app::{errors, services::AppServices};
use crate::context::RequestCancellation;

/// Check that `principal` may run `operation`.
///
/// Intended to be called **before** the operation runs; the error is the
/// ready-to-return HTTP response.
pub async fn authorize_operation(
    services: &AppServices,
    principal: &Principal,
    cancellation: &RequestCancellation,
    operation: &str,
) -> Result<(), Response> {
    let operation = services
        .policy
        .operation(operation)
        .map_err(errors::authz_error_to_response)?;
    services
        .decision_point
        .authorize_operation(principal, &operation, cancellation.token())
        .await
        .map_err(errors::authz_error_to_response)
}
