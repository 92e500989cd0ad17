//! Core gateway logic for LocalCloud.
//!
//! This crate contains the storage, transfer and access rules with ZERO web or
//! database dependencies. The metadata store is reached only through the
//! [`files::FileRepository`] trait.
//!
//! # Modules
//!
//! - `storage` - Storage classes, physical roots and raw blob I/O
//! - `transfer` - Chunked upload state machine and download read loop
//! - `access` - Caller roles and list/read/write decisions
//! - `files` - Gateway service composing the three with file records

pub mod access;
pub mod files;
pub mod storage;
pub mod transfer;
