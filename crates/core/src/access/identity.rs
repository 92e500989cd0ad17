//! Verified caller identity.

use localcloud_shared::Claims;
use serde::Serialize;

/// Caller role after fail-closed mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Sees and writes every owner's files.
    Admin,
    /// Sees and writes only its own files.
    Restricted,
}

impl Role {
    /// Maps a role claim. Only the exact string `"admin"` is privileged.
    #[must_use]
    pub fn from_claim(role: &str) -> Self {
        match role {
            "admin" => Self::Admin,
            _ => Self::Restricted,
        }
    }

    /// Check if this role sees every owner.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// Identity of an authenticated caller, derived per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    /// Subject claim, used as the owner id.
    pub subject: String,
    /// Mapped role.
    pub role: Role,
}

impl CallerIdentity {
    /// Create an identity from parts.
    #[must_use]
    pub fn new(subject: impl Into<String>, role: Role) -> Self {
        Self {
            subject: subject.into(),
            role,
        }
    }

    /// Check if this caller owns records of `owner_id`.
    #[must_use]
    pub fn owns(&self, owner_id: &str) -> bool {
        self.subject == owner_id
    }
}

impl From<&Claims> for CallerIdentity {
    fn from(claims: &Claims) -> Self {
        Self::new(claims.subject(), Role::from_claim(claims.role()))
    }
}
