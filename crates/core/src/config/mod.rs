//! Gateway configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (WAYSIDE_*)
//! 2. TOML config file (if WAYSIDE_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! There are no process-wide singletons: the loaded struct is passed into
//! the engine at construction, which is what makes the engine testable with
//! injected fake network and store primitives.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Gateway configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (WAYSIDE_*)
/// 2. TOML config file (if WAYSIDE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Cache version prefix, e.g. "wayside-v1".
    ///
    /// Namespace identifiers are `{base_version}-{role}`. Bumping this on
    /// deploy is the sole mechanism for invalidating previously cached
    /// content in bulk: activation deletes every namespace carrying an old
    /// prefix.
    #[serde(default = "default_base_version")]
    pub base_version: String,

    /// Origin the gateway fronts, e.g. "https://app.example.com".
    ///
    /// Same-origin requests are always eligible for interception; precache
    /// manifest paths are resolved against this origin.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Path to the SQLite cache store.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for upstream HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per upstream response.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Upstream request timeout in milliseconds.
    ///
    /// This is the only timeout in the system; strategy fallback relies on
    /// the fetch client's own failure signaling.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Trusted third-party asset hosts (font/style/tile CDNs).
    ///
    /// Matched as substrings of the request host. Cross-origin requests to
    /// hosts not listed here pass through to the network uncached.
    #[serde(default = "default_trusted_hosts")]
    pub trusted_hosts: Vec<String>,

    /// Regex matched against host + path to detect map tile requests.
    #[serde(default = "default_map_pattern")]
    pub map_pattern: String,

    /// Regex matched against the URL path to detect API requests.
    #[serde(default = "default_api_pattern")]
    pub api_pattern: String,

    /// File extensions cached cache-first in the runtime namespace.
    #[serde(default = "default_static_extensions")]
    pub static_extensions: Vec<String>,

    /// Precache manifest: absolute paths guaranteed present in the shell
    /// namespace after install, best-effort per entry.
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,

    /// Optional cap on snapshots per namespace, enforced only by the purge
    /// command. Unset means unbounded.
    #[serde(default)]
    pub max_namespace_entries: Option<usize>,
}

fn default_base_version() -> String {
    "wayside-v1".into()
}

fn default_origin() -> String {
    "http://localhost:8080".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./wayside-cache.sqlite")
}

fn default_user_agent() -> String {
    "wayside/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_trusted_hosts() -> Vec<String> {
    ["unpkg.com", "cdn.jsdelivr.net", "fonts.googleapis.com", "fonts.gstatic.com", "cartocdn.com", "tile"]
        .map(String::from)
        .to_vec()
}

fn default_map_pattern() -> String {
    "tile|carto|openstreetmap|basemaps|arcgisonline".into()
}

fn default_api_pattern() -> String {
    "/api(/|$)|/functions/".into()
}

fn default_static_extensions() -> Vec<String> {
    ["woff", "woff2", "ttf", "jpg", "png", "gif", "svg"].map(String::from).to_vec()
}

fn default_precache() -> Vec<String> {
    ["/", "/index.html", "/app.css", "/app.js", "/manifest.json"].map(String::from).to_vec()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_version: default_base_version(),
            origin: default_origin(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            trusted_hosts: default_trusted_hosts(),
            map_pattern: default_map_pattern(),
            api_pattern: default_api_pattern(),
            static_extensions: default_static_extensions(),
            precache: default_precache(),
            max_namespace_entries: None,
        }
    }
}

impl GatewayConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `WAYSIDE_`
    /// 2. TOML file from `WAYSIDE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("WAYSIDE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("WAYSIDE_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
