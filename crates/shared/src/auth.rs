//! Token claims issued by the identity provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// JWT claims carried by bearer tokens.
///
/// The role is kept as the raw claim string; mapping it onto a privilege
/// level is the access policy's job, not the token's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (caller identity).
    pub sub: String,
    /// Role claim as issued.
    pub role: String,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a subject.
    #[must_use]
    pub fn new(subject: impl Into<String>, role: &str, expires_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            sub: subject.into(),
            role: role.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the subject from claims.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.sub
    }

    /// Returns the raw role claim.
    #[must_use]
    pub fn role(&self) -> &str {
        &self.role
    }
}
