//! Install and activate phases.
//!
//! The lifecycle runs at two fixed points in the process lifetime, never
//! during request handling:
//!
//! - **Install**: open the shell namespace at the current version and
//!   populate it from the precache manifest. Each entry is fetched and
//!   stored independently; a failed entry is logged and skipped, so a
//!   partial precache still completes install. Once every attempt has
//!   settled the instance is ready to supersede a previous one without
//!   waiting for existing clients to close.
//! - **Activate**: delete every namespace whose version prefix no longer
//!   matches, then intercept requests for all currently open clients.
//!
//! Activation is only eligible after install has settled; the host runtime
//! triggers the transition.

use std::sync::Arc;

use serde::Serialize;

use crate::error::GatewayError;
use wayside_client::{Fetch, fetch::resolve_path};
use wayside_core::{CacheDb, GatewayConfig, NamespaceRole, RequestDescriptor, ResourceKind, StoredResponse};

/// Lifecycle phase of a gateway instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Installing,
    Waiting,
    Active,
}

/// Outcome of the install phase.
#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    /// Manifest entries attempted.
    pub attempted: usize,
    /// Entries fetched and stored.
    pub stored: usize,
    /// Paths that failed to precache; never fatal.
    pub failed: Vec<String>,
}

/// Outcome of the activate phase.
#[derive(Debug, Clone, Serialize)]
pub struct ActivateReport {
    /// Stale storage identifiers that were deleted.
    pub removed: Vec<String>,
}

/// Orchestrates install-time precache and activate-time eviction.
pub struct Lifecycle<F> {
    cache: CacheDb,
    fetcher: Arc<F>,
    config: GatewayConfig,
    phase: Phase,
}

impl<F: Fetch + 'static> Lifecycle<F> {
    pub fn new(cache: CacheDb, fetcher: Arc<F>, config: GatewayConfig) -> Self {
        Self { cache, fetcher, config, phase: Phase::Installing }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Run the install phase: precache the shell namespace, best-effort.
    ///
    /// Every manifest entry is attempted regardless of earlier failures;
    /// install completes once all attempts have settled, even if some (or
    /// all) failed.
    pub async fn install(&mut self) -> Result<InstallReport, GatewayError> {
        if self.phase != Phase::Installing {
            return Err(GatewayError::AlreadyInstalled);
        }

        let origin = url::Url::parse(&self.config.origin).map_err(|e| GatewayError::Origin(e.to_string()))?;
        let namespace = self
            .cache
            .open_namespace(&self.config.base_version, NamespaceRole::Shell)
            .await?;

        tracing::info!("installing: precaching {} entries into {namespace}", self.config.precache.len());

        let mut report =
            InstallReport { attempted: self.config.precache.len(), stored: 0, failed: Vec::new() };

        for path in &self.config.precache {
            match self.precache_entry(&origin, &namespace, path).await {
                Ok(()) => report.stored += 1,
                Err(reason) => {
                    tracing::warn!("precache of {path} failed: {reason}");
                    report.failed.push(path.clone());
                }
            }
        }

        tracing::info!("install settled: {}/{} entries stored", report.stored, report.attempted);
        self.phase = Phase::Waiting;
        Ok(report)
    }

    /// Run the activate phase: evict stale namespaces, then take over
    /// interception for all open clients.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotInstalled`] if install has not settled.
    pub async fn activate(&mut self) -> Result<ActivateReport, GatewayError> {
        match self.phase {
            Phase::Installing => return Err(GatewayError::NotInstalled),
            Phase::Active => return Err(GatewayError::AlreadyActive),
            Phase::Waiting => {}
        }

        let removed = self.cache.purge_stale_namespaces(&self.config.base_version).await?;
        for identifier in &removed {
            tracing::info!("removed stale namespace {identifier}");
        }

        self.phase = Phase::Active;
        tracing::info!("active: intercepting for all clients");
        Ok(ActivateReport { removed })
    }

    /// Fetch and store one manifest entry. The error is a human-readable
    /// reason; the caller logs and moves on.
    async fn precache_entry(&self, origin: &url::Url, namespace: &str, path: &str) -> Result<(), String> {
        let url = resolve_path(origin, path).map_err(|e| e.to_string())?;
        let request = RequestDescriptor::get(url, kind_for_path(path));

        let response = self.fetcher.fetch(&request).await.map_err(|e| e.to_string())?;
        if !response.is_cacheable() {
            return Err(format!("status {}", response.status));
        }

        let snapshot = StoredResponse::capture(namespace, &request, &response).map_err(|e| e.to_string())?;
        self.cache.put_entry(&snapshot).await.map_err(|e| e.to_string())
    }
}

/// Declared resource kind for a precache manifest path.
fn kind_for_path(path: &str) -> ResourceKind {
    match path.rsplit_once('.').map(|(_, ext)| ext) {
        None => ResourceKind::Document,
        Some("html") => ResourceKind::Document,
        Some("js") => ResourceKind::Script,
        Some("css") => ResourceKind::Style,
        Some("woff" | "woff2" | "ttf") => ResourceKind::Font,
        Some("jpg" | "png" | "gif" | "svg") => ResourceKind::Image,
        Some(_) => ResourceKind::Data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::testing::{FakeFetcher, FakeOutcome};

    fn config(base_version: &str, precache: &[&str]) -> GatewayConfig {
        GatewayConfig {
            base_version: base_version.into(),
            origin: "https://app.example.com".into(),
            precache: precache.iter().map(|p| p.to_string()).collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_install_populates_shell_namespace() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let fetcher = Arc::new(FakeFetcher::respond(200, "asset"));
        let mut lifecycle = Lifecycle::new(cache.clone(), fetcher, config("v1", &["/", "/index.html", "/app.css"]));

        let report = lifecycle.install().await.unwrap();
        assert_eq!(report.attempted, 3);
        assert_eq!(report.stored, 3);
        assert!(report.failed.is_empty());
        assert_eq!(lifecycle.phase(), Phase::Waiting);
        assert_eq!(cache.count_entries("v1-shell").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_install_is_best_effort_per_entry() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let fetcher = Arc::new(FakeFetcher::scripted(vec![
            FakeOutcome::Respond(200, "ok"),
            FakeOutcome::Fail,
            FakeOutcome::Respond(200, "ok"),
        ]));
        let mut lifecycle = Lifecycle::new(cache.clone(), fetcher, config("v1", &["/", "/missing.css", "/app.js"]));

        let report = lifecycle.install().await.unwrap();
        assert_eq!(report.stored, 2);
        assert_eq!(report.failed, vec!["/missing.css".to_string()]);
        assert_eq!(lifecycle.phase(), Phase::Waiting);
        assert_eq!(cache.count_entries("v1-shell").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_install_with_network_down_still_settles() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let fetcher = Arc::new(FakeFetcher::failing());
        let mut lifecycle = Lifecycle::new(cache, fetcher, config("v1", &["/", "/index.html"]));

        let report = lifecycle.install().await.unwrap();
        assert_eq!(report.stored, 0);
        assert_eq!(report.failed.len(), 2);
        assert_eq!(lifecycle.phase(), Phase::Waiting);
    }

    #[tokio::test]
    async fn test_install_skips_non_200_entries() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let fetcher = Arc::new(FakeFetcher::respond(404, "not here"));
        let mut lifecycle = Lifecycle::new(cache.clone(), fetcher, config("v1", &["/gone.css"]));

        let report = lifecycle.install().await.unwrap();
        assert_eq!(report.stored, 0);
        assert_eq!(report.failed, vec!["/gone.css".to_string()]);
        assert_eq!(cache.count_entries("v1-shell").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_activate_requires_settled_install() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let fetcher = Arc::new(FakeFetcher::respond(200, "ok"));
        let mut lifecycle = Lifecycle::new(cache, fetcher, config("v1", &[]));

        assert!(matches!(lifecycle.activate().await, Err(GatewayError::NotInstalled)));

        lifecycle.install().await.unwrap();
        lifecycle.activate().await.unwrap();
        assert_eq!(lifecycle.phase(), Phase::Active);

        assert!(matches!(lifecycle.activate().await, Err(GatewayError::AlreadyActive)));
    }

    #[tokio::test]
    async fn test_activate_evicts_stale_versions_only() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        cache.open_namespace("v1", NamespaceRole::Shell).await.unwrap();
        cache.open_namespace("v2", NamespaceRole::Runtime).await.unwrap();

        let fetcher = Arc::new(FakeFetcher::respond(200, "ok"));
        let mut lifecycle = Lifecycle::new(cache.clone(), fetcher, config("v2", &["/"]));
        lifecycle.install().await.unwrap();

        let report = lifecycle.activate().await.unwrap();
        assert_eq!(report.removed, vec!["v1-shell".to_string()]);

        let mut remaining = cache.list_namespaces().await.unwrap();
        remaining.sort();
        assert_eq!(remaining, vec!["v2-runtime".to_string(), "v2-shell".to_string()]);
    }

    #[tokio::test]
    async fn test_install_twice_is_rejected() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let fetcher = Arc::new(FakeFetcher::respond(200, "ok"));
        let mut lifecycle = Lifecycle::new(cache, fetcher, config("v1", &[]));

        lifecycle.install().await.unwrap();
        assert!(matches!(lifecycle.install().await, Err(GatewayError::AlreadyInstalled)));
    }

    #[test]
    fn test_kind_for_path() {
        assert_eq!(kind_for_path("/"), ResourceKind::Document);
        assert_eq!(kind_for_path("/index.html"), ResourceKind::Document);
        assert_eq!(kind_for_path("/app.js"), ResourceKind::Script);
        assert_eq!(kind_for_path("/app.css"), ResourceKind::Style);
        assert_eq!(kind_for_path("/font.woff2"), ResourceKind::Font);
        assert_eq!(kind_for_path("/logo.svg"), ResourceKind::Image);
        assert_eq!(kind_for_path("/manifest.json"), ResourceKind::Data);
    }
}
