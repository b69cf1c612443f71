//! Route classification.
//!
//! Maps one intercepted request to a namespace role and freshness strategy,
//! or declines to intercept. Rules are evaluated first-match-wins:
//!
//! 1. Non-GET methods pass through
//! 2. Cross-origin hosts outside the trusted CDN allowlist pass through
//! 3. Map tiles: network-first in the map namespace
//! 4. API paths: network-first in the api namespace
//! 5. Fonts and images: cache-first in the runtime namespace
//! 6. Documents, scripts, styles: network-first in the shell namespace
//! 7. Everything else: stale-while-revalidate in the runtime namespace
//!
//! Classification is pure and deterministic; all patterns are compiled once
//! at construction and no rule can fail at request time, so every eligible
//! request is always assigned a strategy.

use regex::Regex;
use url::Origin;

use crate::strategy::Strategy;
use wayside_core::{GatewayConfig, NamespaceRole, RequestDescriptor};

/// Error type for route table construction failures.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("invalid origin {url:?}: {reason}")]
    Origin { url: String, reason: String },

    #[error("invalid pattern {pattern:?}: {reason}")]
    Pattern { pattern: String, reason: String },
}

/// Classification result for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// Not intercepted; the host runtime sends it to the network directly.
    Passthrough,
    /// Intercepted and assigned to a namespace and strategy.
    Handle(RouteMatch),
}

/// Namespace and strategy assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteMatch {
    pub role: NamespaceRole,
    pub strategy: Strategy,
}

impl RouteMatch {
    fn new(role: NamespaceRole, strategy: Strategy) -> RouteDecision {
        RouteDecision::Handle(Self { role, strategy })
    }
}

/// Compiled routing rules.
pub struct RouteTable {
    origin: Origin,
    trusted_hosts: Vec<String>,
    map_pattern: Regex,
    api_pattern: Regex,
    static_extensions: Vec<String>,
}

impl RouteTable {
    /// Compile the routing rules from configuration.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, RouteError> {
        let origin = url::Url::parse(&config.origin)
            .map_err(|e| RouteError::Origin { url: config.origin.clone(), reason: e.to_string() })?
            .origin();

        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| RouteError::Pattern { pattern: pattern.to_string(), reason: e.to_string() })
        };

        Ok(Self {
            origin,
            trusted_hosts: config.trusted_hosts.clone(),
            map_pattern: compile(&config.map_pattern)?,
            api_pattern: compile(&config.api_pattern)?,
            static_extensions: config.static_extensions.clone(),
        })
    }

    /// Classify one request. Pure; no side effects.
    pub fn classify(&self, request: &RequestDescriptor) -> RouteDecision {
        if !request.is_read() {
            return RouteDecision::Passthrough;
        }

        let host = request.url.host_str().unwrap_or("");
        let cross_origin = request.url.origin() != self.origin;
        if cross_origin && !self.is_trusted(host) {
            return RouteDecision::Passthrough;
        }

        let path = request.url.path();
        if self.map_pattern.is_match(host) || self.map_pattern.is_match(path) {
            return RouteMatch::new(NamespaceRole::Map, Strategy::NetworkFirst);
        }

        if self.api_pattern.is_match(path) {
            return RouteMatch::new(NamespaceRole::Api, Strategy::NetworkFirst);
        }

        if let Some(ext) = path_extension(path)
            && self.static_extensions.iter().any(|known| known == ext)
        {
            return RouteMatch::new(NamespaceRole::Runtime, Strategy::CacheFirst);
        }

        if request.kind.is_shell() {
            return RouteMatch::new(NamespaceRole::Shell, Strategy::NetworkFirst);
        }

        RouteMatch::new(NamespaceRole::Runtime, Strategy::StaleWhileRevalidate)
    }

    fn is_trusted(&self, host: &str) -> bool {
        self.trusted_hosts.iter().any(|trusted| host.contains(trusted.as_str()))
    }
}

/// Extension of the final path segment, if any.
fn path_extension(path: &str) -> Option<&str> {
    let file = path.rsplit('/').next().unwrap_or(path);
    file.rsplit_once('.').map(|(_, ext)| ext)
}
