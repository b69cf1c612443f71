//! SQLite-backed cache store and versioned namespace registry.
//!
//! This module provides the persistent half of the cache engine using
//! SQLite with async access via tokio-rusqlite. It supports:
//!
//! - Versioned namespaces (`{base_version}-{role}`) with wholesale eviction
//! - Response snapshots keyed by a normalized request digest
//! - Automatic schema migrations
//! - WAL mode for concurrent access from independent request tasks

pub mod connection;
pub mod entries;
pub mod key;
pub mod migrations;
pub mod namespaces;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::StoredResponse;
pub use namespaces::NamespaceRole;
