//! Request/response DTOs.

use serde::{Deserialize, Serialize};

use tessera_auth::{AuthorizationOutcome, Claim, Principal, Requirement, RoleClaimRecord, UserRecord};

/// Body of `POST /authz/explain`.
///
/// Either names a configured operation or lists ad-hoc requirements; with
/// both, the operation's requirements come first.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExplainRequest {
    #[serde(default)]
    pub operation: Option<String>,
    #[serde(default)]
    pub requirements: Vec<Requirement>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExplainResponse {
    pub principal: String,
    pub operation: Option<String>,
    #[serde(flatten)]
    pub outcome: AuthorizationOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct WhoAmIResponse {
    pub id: Option<String>,
    pub name: Option<String>,
    pub authenticated: bool,
    pub claims: Vec<Claim>,
}

impl From<&Principal> for WhoAmIResponse {
    fn from(principal: &Principal) -> Self {
        Self {
            id: principal.id().map(str::to_string),
            name: principal.name().map(str::to_string),
            authenticated: principal.is_authenticated(),
            claims: principal.claims().to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserRoleClaimsResponse {
    pub user: UserRecord,
    pub role_claims: Vec<RoleClaimRecord>,
}
