//! Core types and shared functionality for wayside.
//!
//! This crate provides:
//! - Request/response descriptors (the interception contract)
//! - Versioned cache namespaces with a SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod request;

pub use cache::{CacheDb, NamespaceRole, StoredResponse};
pub use config::GatewayConfig;
pub use error::Error;
pub use request::{RequestDescriptor, ResourceKind, ResponseDescriptor};
