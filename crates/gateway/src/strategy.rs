//! Freshness strategies.
//!
//! Each strategy composes the same three primitives (network fetch, cache
//! read, cache write) into one resolved response. The shared cacheability
//! rule is exact: only status 200 is ever persisted. Cache writes happen on
//! detached tasks so response delivery never waits on them; the returned
//! handle exists so callers that need determinism (tests, the CLI) can
//! await the write, while an embedding host discards it.
//!
//! Strategies cannot fail. Network failure falls back to the cache, a cache
//! miss falls back to the offline document, and cache-write failures are
//! logged and swallowed.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::offline;
use wayside_client::Fetch;
use wayside_core::cache::key;
use wayside_core::{CacheDb, NamespaceRole, RequestDescriptor, ResponseDescriptor, StoredResponse};

/// The ordered combination of network and cache operations used to resolve
/// one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Live response preferred; cached snapshot on network failure.
    NetworkFirst,
    /// Cached snapshot preferred; network only on a miss.
    CacheFirst,
    /// Cached snapshot served immediately, refreshed in the background.
    StaleWhileRevalidate,
}

/// One resolved request.
#[derive(Debug)]
pub struct Resolved {
    /// The response delivered to the caller.
    pub response: ResponseDescriptor,
    /// Detached cache-population task, if one was started. Delivery does not
    /// wait on it; await it only when write completion must be observable.
    pub revalidation: Option<JoinHandle<()>>,
}

impl Resolved {
    fn done(response: ResponseDescriptor) -> Self {
        Self { response, revalidation: None }
    }
}

/// Executes strategies against the cache store and a network fetcher.
pub struct StrategyEngine<F> {
    cache: CacheDb,
    fetcher: Arc<F>,
    base_version: String,
}

impl<F: Fetch + 'static> StrategyEngine<F> {
    pub fn new(cache: CacheDb, fetcher: Arc<F>, base_version: impl Into<String>) -> Self {
        Self { cache, fetcher, base_version: base_version.into() }
    }

    /// Resolve one request under the given strategy and namespace role.
    pub async fn resolve(&self, strategy: Strategy, role: NamespaceRole, request: &RequestDescriptor) -> Resolved {
        match strategy {
            Strategy::NetworkFirst => self.network_first(role, request).await,
            Strategy::CacheFirst => self.cache_first(role, request).await,
            Strategy::StaleWhileRevalidate => self.stale_while_revalidate(role, request).await,
        }
    }

    async fn network_first(&self, role: NamespaceRole, request: &RequestDescriptor) -> Resolved {
        match self.fetcher.fetch(request).await {
            Ok(response) => {
                let revalidation = self.write_through(role, request, &response);
                Resolved { response, revalidation }
            }
            Err(e) => {
                tracing::debug!("network failed for {}: {e}; trying cache", request.url);
                match self.read_cached(role, request).await {
                    Some(cached) => Resolved::done(cached),
                    None => Resolved::done(offline::offline_response()),
                }
            }
        }
    }

    async fn cache_first(&self, role: NamespaceRole, request: &RequestDescriptor) -> Resolved {
        if let Some(cached) = self.read_cached(role, request).await {
            return Resolved::done(cached);
        }

        match self.fetcher.fetch(request).await {
            Ok(response) => {
                let revalidation = self.write_through(role, request, &response);
                Resolved { response, revalidation }
            }
            Err(e) => {
                tracing::debug!("network failed for {} with no cached copy: {e}", request.url);
                Resolved::done(offline::offline_response())
            }
        }
    }

    async fn stale_while_revalidate(&self, role: NamespaceRole, request: &RequestDescriptor) -> Resolved {
        match self.read_cached(role, request).await {
            Some(cached) => {
                // Serve stale now; the refresh lands for the next request.
                let revalidation = self.spawn_revalidate(role, request.clone());
                Resolved { response: cached, revalidation: Some(revalidation) }
            }
            None => match self.fetcher.fetch(request).await {
                Ok(response) => {
                    let revalidation = self.write_through(role, request, &response);
                    Resolved { response, revalidation }
                }
                Err(e) => {
                    tracing::debug!("network failed for {} with no cached copy: {e}", request.url);
                    Resolved::done(offline::offline_response())
                }
            },
        }
    }

    /// Read the cached snapshot for this request, if any.
    ///
    /// Store failures and corrupt snapshots degrade to a miss: a broken
    /// cache must never block resolving the request some other way.
    async fn read_cached(&self, role: NamespaceRole, request: &RequestDescriptor) -> Option<ResponseDescriptor> {
        let namespace = role.identifier(&self.base_version);
        let request_key = key::request_key(&request.method, &request.url);

        match self.cache.get_entry(&namespace, &request_key).await {
            Ok(Some(snapshot)) => match snapshot.into_response() {
                Ok(response) => {
                    tracing::debug!("cache hit for {} in {namespace}", request.url);
                    Some(response)
                }
                Err(e) => {
                    tracing::warn!("discarding unreadable snapshot for {}: {e}", request.url);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("cache read failed for {}: {e}", request.url);
                None
            }
        }
    }

    /// Persist a cacheable response on a detached task.
    fn write_through(
        &self, role: NamespaceRole, request: &RequestDescriptor, response: &ResponseDescriptor,
    ) -> Option<JoinHandle<()>> {
        if !response.is_cacheable() {
            return None;
        }

        let cache = self.cache.clone();
        let base_version = self.base_version.clone();
        let request = request.clone();
        let response = response.clone();
        Some(tokio::spawn(async move {
            store_snapshot(&cache, &base_version, role, &request, &response).await;
        }))
    }

    /// Fetch in the background and persist the result if it is cacheable.
    fn spawn_revalidate(&self, role: NamespaceRole, request: RequestDescriptor) -> JoinHandle<()> {
        let fetcher = Arc::clone(&self.fetcher);
        let cache = self.cache.clone();
        let base_version = self.base_version.clone();
        tokio::spawn(async move {
            match fetcher.fetch(&request).await {
                Ok(response) if response.is_cacheable() => {
                    store_snapshot(&cache, &base_version, role, &request, &response).await;
                }
                Ok(response) => {
                    tracing::debug!("revalidation for {} returned {}; not stored", request.url, response.status);
                }
                Err(e) => {
                    tracing::debug!("revalidation fetch failed for {}: {e}", request.url);
                }
            }
        })
    }
}

/// Open the namespace and store one snapshot, swallowing failures.
///
/// A cache-write failure must not block delivering a response, so every
/// failure mode here is logged and dropped.
async fn store_snapshot(
    cache: &CacheDb, base_version: &str, role: NamespaceRole, request: &RequestDescriptor,
    response: &ResponseDescriptor,
) {
    let namespace = match cache.open_namespace(base_version, role).await {
        Ok(namespace) => namespace,
        Err(e) => {
            tracing::warn!("cache write skipped for {}: {e}", request.url);
            return;
        }
    };

    let snapshot = match StoredResponse::capture(&namespace, request, response) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::warn!("cache write skipped for {}: {e}", request.url);
            return;
        }
    };

    if let Err(e) = cache.put_entry(&snapshot).await {
        tracing::warn!("cache write failed for {}: {e}", request.url);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Fake network fetcher for strategy and lifecycle tests.

    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use bytes::Bytes;

    use wayside_client::{Fetch, FetchError};
    use wayside_core::{RequestDescriptor, ResponseDescriptor};

    /// Scripted fetch outcome.
    #[derive(Debug, Clone)]
    pub enum FakeOutcome {
        Respond(u16, &'static str),
        Fail,
    }

    /// Programmable [`Fetch`] implementation.
    ///
    /// Pops scripted outcomes in order and repeats the last one once the
    /// script is exhausted; counts every call.
    pub struct FakeFetcher {
        script: Mutex<Vec<FakeOutcome>>,
        calls: AtomicUsize,
    }

    impl FakeFetcher {
        pub fn respond(status: u16, body: &'static str) -> Self {
            Self::scripted(vec![FakeOutcome::Respond(status, body)])
        }

        pub fn failing() -> Self {
            Self::scripted(vec![FakeOutcome::Fail])
        }

        pub fn scripted(outcomes: Vec<FakeOutcome>) -> Self {
            assert!(!outcomes.is_empty(), "script must have at least one outcome");
            Self { script: Mutex::new(outcomes), calls: AtomicUsize::new(0) }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Fetch for FakeFetcher {
        async fn fetch(&self, _request: &RequestDescriptor) -> Result<ResponseDescriptor, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut script = self.script.lock().unwrap();
            let outcome = if script.len() > 1 { script.remove(0) } else { script[0].clone() };
            match outcome {
                FakeOutcome::Respond(status, body) => {
                    let mut headers = BTreeMap::new();
                    headers.insert("content-type".to_string(), "text/plain".to_string());
                    Ok(ResponseDescriptor { status, headers, body: Bytes::from_static(body.as_bytes()) })
                }
                FakeOutcome::Fail => Err(FetchError::Network("connection refused".to_string())),
            }
        }
    }
}
