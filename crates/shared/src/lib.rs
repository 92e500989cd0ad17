//! Shared errors, configuration, and identity claims for LocalCloud.
//!
//! This crate provides common types used across all other crates:
//! - Application-wide error types
//! - Configuration management
//! - Token claims and the identity-provider service that verifies them

pub mod auth;
pub mod config;
pub mod error;
pub mod jwt;

#[cfg(test)]
mod jwt_tests;

pub use auth::Claims;
pub use config::{AppConfig, StorageProvider, StorageSettings};
pub use error::AppError;
pub use jwt::{JwtConfig, JwtError, JwtService};
