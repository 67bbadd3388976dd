use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use tessera_auth::Principal;

use crate::app::services::{AppServices, OP_POLICIES_READ};
use crate::authz;
use crate::context::RequestCancellation;

/// GET /policies - The configured operation → requirements map
pub async fn list(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Extension(cancellation): Extension<RequestCancellation>,
) -> Response {
    if let Err(res) = authz::authorize_operation(&services, &principal, &cancellation, OP_POLICIES_READ).await {
        return res;
    }

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "operations": services.policy,
            "allow_list": services.allow_list,
        })),
    )
        .into_response()
}
