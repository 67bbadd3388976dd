use serde::{Deserialize, Serialize};

use crate::Claim;

/// Authentication state of a principal.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Identity {
    pub name: Option<String>,

    /// Scheme that authenticated the caller; `None` means anonymous.
    pub authentication_type: Option<String>,
}

impl Identity {
    pub fn is_authenticated(&self) -> bool {
        self.authentication_type
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty())
    }
}

/// The caller of a guarded operation.
///
/// Constructed per request by the authentication layer; read-only to the
/// authorization core.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Principal {
    id: Option<String>,
    identity: Option<Identity>,
    claims: Vec<Claim>,
}

impl Principal {
    /// A caller without identity or claims.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(
        id: impl Into<String>,
        name: Option<String>,
        authentication_type: impl Into<String>,
    ) -> Self {
        Self {
            id: Some(id.into()),
            identity: Some(Identity {
                name,
                authentication_type: Some(authentication_type.into()),
            }),
            claims: Vec::new(),
        }
    }

    /// A principal with an explicit identity (authenticated or not).
    pub fn with_identity(id: Option<String>, identity: Identity) -> Self {
        Self {
            id,
            identity: Some(identity),
            claims: Vec::new(),
        }
    }

    pub fn with_claim(mut self, claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        self.claims.push(Claim::new(claim_type, value));
        self
    }

    pub fn with_claims(mut self, claims: impl IntoIterator<Item = Claim>) -> Self {
        self.claims.extend(claims);
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.as_ref().is_some_and(Identity::is_authenticated)
    }

    /// Username of an authenticated principal.
    ///
    /// `None` for anonymous/unauthenticated callers and for blank names.
    pub fn name(&self) -> Option<&str> {
        let identity = self.identity.as_ref().filter(|i| i.is_authenticated())?;
        identity.name.as_deref().filter(|n| !n.trim().is_empty())
    }

    pub fn claims(&self) -> &[Claim] {
        &self.claims
    }

    /// First claim of the given type, in the order the claims were attached.
    pub fn find_first(&self, claim_type: &str) -> Option<&Claim> {
        self.claims.iter().find(|c| c.claim_type == claim_type)
    }
}

impl core::fmt::Display for Principal {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match (self.name(), self.id()) {
            (Some(name), _) => f.write_str(name),
            (None, Some(id)) => write!(f, "id:{id}"),
            (None, None) => f.write_str("anonymous"),
        }
    }
}
