use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use tessera_auth::Principal;

use crate::app::dto::UserRoleClaimsResponse;
use crate::app::services::{AppServices, OP_USER_ROLE_CLAIMS_READ};
use crate::app::errors;
use crate::authz;
use crate::context::RequestCancellation;

/// GET /users/:username/role-claims - Role-claims granted to a user through its roles
pub async fn role_claims(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Extension(cancellation): Extension<RequestCancellation>,
    Path(username): Path<String>,
) -> Response {
    if let Err(res) =
        authz::authorize_operation(&services, &principal, &cancellation, OP_USER_ROLE_CLAIMS_READ).await
    {
        return res;
    }

    let user = match services.store.find_user_by_username(&username).await {
        Ok(Some(user)) => user,
        Ok(None) => return errors::json_error(StatusCode::NOT_FOUND, "not_found", "user not found"),
        Err(e) => return errors::store_error_to_response(&e),
    };

    let role_claims = match services.store.role_claims_for_user(&user.id).await {
        Ok(claims) => claims,
        Err(e) => return errors::store_error_to_response(&e),
    };

    (StatusCode::OK, Json(UserRoleClaimsResponse { user, role_claims })).into_response()
}
