//! Requirements attached to guarded operations.

use serde::{Deserialize, Serialize};

use crate::Permission;

/// A named capability, resolved through the principal's persisted roles.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionRequirement {
    pub permission: Permission,
}

/// A claim type whose value is read as a space-separated list of permission tokens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClaimRequirement {
    pub claim_type: String,
}

/// Any requirement a guarded operation can declare.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Requirement {
    Permission(PermissionRequirement),
    Claim(ClaimRequirement),
}

impl Requirement {
    pub fn permission(name: impl Into<std::borrow::Cow<'static, str>>) -> Self {
        Self::Permission(PermissionRequirement {
            permission: Permission::new(name),
        })
    }

    pub fn claim(claim_type: impl Into<String>) -> Self {
        Self::Claim(ClaimRequirement {
            claim_type: claim_type.into(),
        })
    }
}

impl core::fmt::Display for Requirement {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Requirement::Permission(r) => write!(f, "permission:{}", r.permission),
            Requirement::Claim(r) => write!(f, "claim:{}", r.claim_type),
        }
    }
}
