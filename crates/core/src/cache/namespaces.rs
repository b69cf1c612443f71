//! Versioned namespace registry.
//!
//! A namespace is a logical partition of the cache store addressed by the
//! identifier `{base_version}-{role}`. The registry guarantees exactly one
//! live identifier per role: `open_namespace` always resolves to the
//! identifier for the current base version, and `purge_stale_namespaces`
//! deletes every identifier carried over from a previous deploy (entries
//! cascade with the namespace row).

use super::connection::CacheDb;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;

/// Logical role of a cache namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamespaceRole {
    /// Application shell: documents, scripts, styles, precached assets.
    Shell,
    /// Lazily cached static assets and the default catch-all.
    Runtime,
    /// Map tile responses.
    Map,
    /// API responses.
    Api,
}

impl NamespaceRole {
    pub const ALL: [NamespaceRole; 4] = [Self::Shell, Self::Runtime, Self::Map, Self::Api];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Shell => "shell",
            Self::Runtime => "runtime",
            Self::Map => "map",
            Self::Api => "api",
        }
    }

    pub fn parse(s: &str) -> Result<Self, Error> {
        match s {
            "shell" => Ok(Self::Shell),
            "runtime" => Ok(Self::Runtime),
            "map" => Ok(Self::Map),
            "api" => Ok(Self::Api),
            other => Err(Error::UnknownRole(other.to_string())),
        }
    }

    /// Storage identifier for this role under the given base version.
    pub fn identifier(self, base_version: &str) -> String {
        format!("{base_version}-{}", self.as_str())
    }
}

impl CacheDb {
    /// Open the namespace for `role` at the current base version.
    ///
    /// Registers the identifier on first use and returns it. Never resolves
    /// to a stale identifier: the returned value is always derived from
    /// `base_version`.
    pub async fn open_namespace(&self, base_version: &str, role: NamespaceRole) -> Result<String, Error> {
        let identifier = role.identifier(base_version);
        let insert_id = identifier.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO namespaces (identifier, role, created_at) VALUES (?1, ?2, ?3)",
                    params![insert_id, role.as_str(), chrono::Utc::now().to_rfc3339()],
                )?;
                Ok(())
            })
            .await?;
        Ok(identifier)
    }

    /// All storage identifiers currently registered, oldest first.
    pub async fn list_namespaces(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT identifier FROM namespaces ORDER BY created_at, identifier")?;
                let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
                let mut identifiers = Vec::new();
                for row in rows {
                    identifiers.push(row?);
                }
                Ok(identifiers)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a namespace and every snapshot inside it.
    ///
    /// Returns true if the identifier existed.
    pub async fn delete_namespace(&self, identifier: &str) -> Result<bool, Error> {
        let identifier = identifier.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM namespaces WHERE identifier = ?1", params![identifier])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every namespace whose version prefix does not match
    /// `base_version`.
    ///
    /// Returns the deleted identifiers. This is the garbage collection run
    /// during activation after a deploy bumps the base version.
    pub async fn purge_stale_namespaces(&self, base_version: &str) -> Result<Vec<String>, Error> {
        let prefix = format!("{base_version}-");
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT identifier FROM namespaces")?;
                let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

                let mut stale = Vec::new();
                for row in rows {
                    let identifier = row?;
                    if !identifier.starts_with(&prefix) {
                        stale.push(identifier);
                    }
                }

                for identifier in &stale {
                    conn.execute("DELETE FROM namespaces WHERE identifier = ?1", params![identifier])?;
                }
                Ok(stale)
            })
            .await
            .map_err(Error::from)
    }
}
