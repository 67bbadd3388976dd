use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use tessera_auth::{AuthzError, StoreError};

pub fn authz_error_to_response(err: AuthzError) -> axum::response::Response {
    match &err {
        AuthzError::Denied(_) | AuthzError::Undetermined(_) => {
            json_error(StatusCode::FORBIDDEN, "forbidden", err.to_string())
        }
        AuthzError::StoreUnavailable(e) => store_error_to_response(e),
        AuthzError::UnknownOperation(operation) => {
            tracing::error!(%operation, "guarded operation has no policy entry");
            json_error(StatusCode::FORBIDDEN, "forbidden", err.to_string())
        }
        AuthzError::Cancelled => {
            json_error(StatusCode::SERVICE_UNAVAILABLE, "cancelled", err.to_string())
        }
    }
}

pub fn store_error_to_response(err: &StoreError) -> axum::response::Response {
    tracing::error!(error = %err, "identity store failure");
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "store_unavailable",
        "identity store unavailable",
    )
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
