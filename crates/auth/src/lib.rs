//! `tessera-auth`: permission resolution core (zero-trust).
//!
//! Decides whether a principal may run a guarded operation, either through
//! role-derived permissions (looked up in the identity store on every call)
//! or through a permission-token claim carried by the principal.
//!
//! This crate is intentionally decoupled from HTTP and from any concrete store.

pub mod authorize;
pub mod claims;
pub mod decision;
pub mod handlers;
pub mod jwt;
pub mod permissions;
pub mod policy;
pub mod principal;
pub mod requirement;
pub mod store;

#[cfg(test)]
mod testing;

pub use authorize::{AuthorizationOutcome, AuthzError, DecisionPoint, RequirementEvaluation};
pub use claims::{Claim, TokenClaims, TokenValidationError, validate_claims};
pub use decision::{Decision, RequirementState};
pub use handlers::{AuthorizationHandler, PermissionClaimHandler, PermissionRequirementHandler};
pub use jwt::{Hs256JwtValidator, JwtValidator};
pub use permissions::{Permission, PermissionAllowList};
pub use policy::{GuardedOperation, NamedOperation, OperationPolicy};
pub use principal::{Identity, Principal};
pub use requirement::{ClaimRequirement, PermissionRequirement, Requirement};
pub use store::{
    IdentityStore, RoleClaimRecord, RoleRecord, StoreError, UserRecord, UserRoleAssignment,
};
