//! Access policy: who may list, read or write which files.
//!
//! Everything here is pure. Ambiguity resolves to the most restrictive
//! outcome: an unrecognized role is `Restricted`, a missing identity sees
//! nothing.

mod identity;
mod policy;

pub use identity::{CallerIdentity, Role};
pub use policy::{AccessDenied, AccessPolicy, ListScope};
