//! Interception facade.
//!
//! This is the boundary the host runtime's interception hook calls: one
//! request descriptor in, exactly one decision out: either a resolved
//! response or an explicit decline to intercept.

use std::sync::Arc;

use crate::error::GatewayError;
use crate::routes::{RouteDecision, RouteTable};
use crate::strategy::{Resolved, StrategyEngine};
use wayside_client::Fetch;
use wayside_core::{CacheDb, GatewayConfig, RequestDescriptor};

/// Disposition of one intercepted request.
#[derive(Debug)]
pub enum Outcome {
    /// Not intercepted; the host runtime sends the request to the network
    /// directly and the cache store is untouched.
    Passthrough,
    /// Resolved by a strategy (live, cached, or offline fallback).
    Handled(Resolved),
}

/// Routes incoming requests through the classifier and strategy engine.
pub struct Gateway<F> {
    routes: RouteTable,
    engine: StrategyEngine<F>,
}

impl<F: Fetch + 'static> Gateway<F> {
    /// Build a gateway from configuration, a cache store, and a fetcher.
    pub fn new(config: &GatewayConfig, cache: CacheDb, fetcher: Arc<F>) -> Result<Self, GatewayError> {
        let routes = RouteTable::from_config(config)?;
        let engine = StrategyEngine::new(cache, fetcher, config.base_version.clone());
        Ok(Self { routes, engine })
    }

    /// Handle one intercepted request.
    ///
    /// Infallible by design: classification always lands on a rule, and
    /// every strategy bottoms out in the offline fallback.
    pub async fn intercept(&self, request: &RequestDescriptor) -> Outcome {
        match self.routes.classify(request) {
            RouteDecision::Passthrough => {
                tracing::debug!("passthrough for {} {}", request.method, request.url);
                Outcome::Passthrough
            }
            RouteDecision::Handle(matched) => {
                let resolved = self.engine.resolve(matched.strategy, matched.role, request).await;
                Outcome::Handled(resolved)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::testing::FakeFetcher;
    use wayside_core::ResourceKind;

    fn config() -> GatewayConfig {
        GatewayConfig {
            base_version: "wayside-v1".into(),
            origin: "https://app.example.com".into(),
            ..Default::default()
        }
    }

    fn get(url: &str, kind: ResourceKind) -> RequestDescriptor {
        RequestDescriptor::get(url::Url::parse(url).unwrap(), kind)
    }

    async fn handled(outcome: Outcome) -> wayside_core::ResponseDescriptor {
        match outcome {
            Outcome::Handled(resolved) => {
                if let Some(handle) = resolved.revalidation {
                    handle.await.unwrap();
                }
                resolved.response
            }
            Outcome::Passthrough => panic!("expected the request to be handled"),
        }
    }

    #[tokio::test]
    async fn test_offline_document_with_cold_cache_is_503() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let gateway = Gateway::new(&config(), cache, Arc::new(FakeFetcher::failing())).unwrap();

        let request = get("https://app.example.com/index.html", ResourceKind::Document);
        let response = handled(gateway.intercept(&request).await).await;

        assert_eq!(response.status, 503);
        let body = std::str::from_utf8(&response.body).unwrap();
        assert!(body.contains("You are offline"));
    }

    #[tokio::test]
    async fn test_image_survives_network_loss() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let request = get("https://app.example.com/logo.png", ResourceKind::Image);

        let online = Gateway::new(&config(), cache.clone(), Arc::new(FakeFetcher::respond(200, "png"))).unwrap();
        let first = handled(online.intercept(&request).await).await;
        assert_eq!(first.status, 200);
        assert_eq!(first.body.as_ref(), b"png");

        let offline = Gateway::new(&config(), cache, Arc::new(FakeFetcher::failing())).unwrap();
        let second = handled(offline.intercept(&request).await).await;
        assert_eq!(second.status, 200);
        assert_eq!(second.body.as_ref(), b"png");
    }

    #[tokio::test]
    async fn test_non_get_never_touches_the_store() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let fetcher = Arc::new(FakeFetcher::respond(200, "ok"));
        let gateway = Gateway::new(&config(), cache.clone(), Arc::clone(&fetcher)).unwrap();

        let request = RequestDescriptor {
            method: "POST".to_string(),
            url: url::Url::parse("https://app.example.com/api/sites").unwrap(),
            kind: ResourceKind::Data,
        };

        assert!(matches!(gateway.intercept(&request).await, Outcome::Passthrough));
        assert_eq!(fetcher.calls(), 0);
        assert!(cache.list_namespaces().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_untrusted_cross_origin_passes_through() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let gateway = Gateway::new(&config(), cache, Arc::new(FakeFetcher::respond(200, "ok"))).unwrap();

        let request = get("https://tracker.example.net/pixel.gif", ResourceKind::Image);
        assert!(matches!(gateway.intercept(&request).await, Outcome::Passthrough));
    }
}
