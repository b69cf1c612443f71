//! Offline-first request-interception cache gateway.
//!
//! A host runtime's interception hook hands each outbound request to the
//! [`handler::Gateway`]; the route classifier assigns a namespace and
//! freshness strategy, the strategy engine resolves it against the cache
//! store, and the offline fallback catches total failure. The lifecycle
//! manager runs at install and activate, never during request handling.

pub mod error;
pub mod handler;
pub mod lifecycle;
pub mod offline;
pub mod routes;
pub mod strategy;

pub use error::GatewayError;
pub use handler::{Gateway, Outcome};
pub use lifecycle::{ActivateReport, InstallReport, Lifecycle, Phase};
pub use routes::{RouteDecision, RouteTable};
pub use strategy::{Resolved, Strategy, StrategyEngine};
