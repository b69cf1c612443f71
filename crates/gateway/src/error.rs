//! Structured errors for the gateway.

use crate::routes::RouteError;

/// Errors surfaced by gateway construction and lifecycle orchestration.
///
/// Request resolution itself never fails: every strategy bottoms out in the
/// offline fallback, so there is no per-request error variant.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Activate was requested before install settled.
    #[error("install has not settled; activation is not eligible")]
    NotInstalled,

    /// Install was requested twice.
    #[error("install already completed")]
    AlreadyInstalled,

    /// Activate was requested twice.
    #[error("already active")]
    AlreadyActive,

    /// The configured origin could not be parsed.
    #[error("invalid origin: {0}")]
    Origin(String),

    /// A configured route pattern could not be compiled.
    #[error(transparent)]
    Route(#[from] RouteError),

    /// The cache store failed outside of request handling.
    #[error(transparent)]
    Store(#[from] wayside_core::Error),
}
