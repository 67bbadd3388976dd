//! Authorization explain endpoint for transparent debugging.
//!
//! Answers "would this caller pass these requirements, and why not?" without
//! running any guarded operation.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use tessera_auth::Principal;

use crate::app::dto::{ExplainRequest, ExplainResponse};
use crate::app::{errors, services::AppServices};
use crate::context::RequestCancellation;

/// POST /authz/explain - Evaluate requirements for the current principal
pub async fn explain(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Extension(cancellation): Extension<RequestCancellation>,
    Json(request): Json<ExplainRequest>,
) -> Response {
    let mut requirements = match &request.operation {
        Some(operation) => match services.policy.requirements_for(operation) {
            Some(requirements) => requirements.to_vec(),
            None => {
                return errors::json_error(
                    StatusCode::NOT_FOUND,
                    "unknown_operation",
                    format!("operation '{operation}' is not declared"),
                );
            }
        },
        None => Vec::new(),
    };
    requirements.extend(request.requirements);

    let outcome = match services
        .decision_point
        .evaluate(&principal, &requirements, cancellation.token())
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => return errors::authz_error_to_response(e),
    };

    let body = ExplainResponse {
        principal: principal.to_string(),
        operation: request.operation,
        outcome,
    };
    (StatusCode::OK, Json(body)).into_response()
}
