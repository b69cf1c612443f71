//! wayside entry point.
//!
//! CLI driver around the cache engine: runs the lifecycle phases, resolves
//! individual requests, and inspects or trims the store. Logging goes to
//! stderr so reports on stdout stay machine-readable.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use wayside_client::{FetchConfig, HttpFetcher, fetch::canonicalize};
use wayside_core::{CacheDb, GatewayConfig, NamespaceRole, RequestDescriptor, ResourceKind};
use wayside_gateway::{Gateway, Lifecycle, Outcome};

#[derive(Parser, Debug)]
#[command(name = "wayside", about = "Offline-first request-interception cache gateway", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the install phase: precache the shell namespace from the manifest.
    Install,
    /// Run install followed by activation: precache, then evict every
    /// namespace left over from a previous version.
    Activate,
    /// Resolve one request through the cache engine and report the outcome.
    Resolve {
        /// Absolute URL to resolve.
        url: String,

        /// Declared resource kind: document, script, style, image, font, data.
        #[arg(long, default_value = "data")]
        kind: String,

        /// HTTP method.
        #[arg(long, default_value = "GET")]
        method: String,
    },
    /// Trim current-version namespaces down to a snapshot cap.
    Purge {
        /// Cap per namespace; defaults to max_namespace_entries from config.
        #[arg(long)]
        max_entries: Option<usize>,
    },
    /// List live storage identifiers.
    Namespaces,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();
    let config = GatewayConfig::load()?;
    let cache = CacheDb::open(&config.db_path)
        .await
        .with_context(|| format!("opening cache store at {}", config.db_path.display()))?;

    let fetch_config = FetchConfig {
        user_agent: config.user_agent.clone(),
        max_bytes: config.max_bytes,
        timeout: config.timeout(),
        ..FetchConfig::default()
    };
    let fetcher = Arc::new(HttpFetcher::new(fetch_config)?);

    match cli.command {
        Command::Install => {
            let mut lifecycle = Lifecycle::new(cache, fetcher, config);
            let report = lifecycle.install().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Activate => {
            let mut lifecycle = Lifecycle::new(cache, fetcher, config);
            let install = lifecycle.install().await?;
            let activate = lifecycle.activate().await?;
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({ "install": install, "activate": activate }))?
            );
        }
        Command::Resolve { url, kind, method } => {
            let request = RequestDescriptor {
                method: method.to_uppercase(),
                url: canonicalize(&url).map_err(|e| anyhow::anyhow!("{e}"))?,
                kind: ResourceKind::parse(&kind.to_lowercase())?,
            };

            let gateway = Gateway::new(&config, cache, fetcher)?;
            match gateway.intercept(&request).await {
                Outcome::Passthrough => {
                    println!("{}", serde_json::to_string_pretty(&json!({ "disposition": "passthrough" }))?);
                }
                Outcome::Handled(resolved) => {
                    let report = json!({
                        "disposition": "handled",
                        "status": resolved.response.status,
                        "content_type": resolved.response.header("content-type"),
                        "body_bytes": resolved.response.body.len(),
                    });
                    println!("{}", serde_json::to_string_pretty(&report)?);

                    // One-shot process: wait for the detached write so the
                    // snapshot is durable before exit.
                    if let Some(handle) = resolved.revalidation {
                        let _ = handle.await;
                    }
                }
            }
        }
        Command::Purge { max_entries } => {
            let Some(cap) = max_entries.or(config.max_namespace_entries) else {
                bail!("no snapshot cap given; pass --max-entries or set max_namespace_entries");
            };

            let mut deleted = serde_json::Map::new();
            for role in NamespaceRole::ALL {
                let identifier = role.identifier(&config.base_version);
                let count = cache.trim_namespace(&identifier, cap).await?;
                deleted.insert(identifier, json!(count));
            }
            println!("{}", serde_json::to_string_pretty(&json!({ "deleted": deleted }))?);
        }
        Command::Namespaces => {
            let identifiers = cache.list_namespaces().await?;
            println!("{}", serde_json::to_string_pretty(&identifiers)?);
        }
    }

    Ok(())
}
