//! Request and response descriptors.
//!
//! These are the closed contract the route classifier and strategy engine
//! operate over: one [`RequestDescriptor`] in, one [`ResponseDescriptor`]
//! out. The host runtime's interception hook converts its own request
//! objects into this shape at the boundary.

use std::collections::BTreeMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::Error;

/// Declared resource kind of an intercepted request.
///
/// Mirrors the request destination reported by the host runtime. Requests
/// with no meaningful destination use [`ResourceKind::Data`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Document,
    Script,
    Style,
    Image,
    Font,
    Data,
}

impl ResourceKind {
    /// Parse a resource kind from its lowercase wire name.
    pub fn parse(s: &str) -> Result<Self, Error> {
        match s {
            "document" => Ok(Self::Document),
            "script" => Ok(Self::Script),
            "style" => Ok(Self::Style),
            "image" => Ok(Self::Image),
            "font" => Ok(Self::Font),
            "data" => Ok(Self::Data),
            other => Err(Error::UnknownKind(other.to_string())),
        }
    }

    /// Whether this kind belongs to the application shell (markup and the
    /// code/styles that render it).
    pub fn is_shell(self) -> bool {
        matches!(self, Self::Document | Self::Script | Self::Style)
    }
}

/// One intercepted outbound request.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    /// Uppercase HTTP method.
    pub method: String,
    /// Absolute request URL, query included.
    pub url: Url,
    /// Declared resource kind.
    pub kind: ResourceKind,
}

impl RequestDescriptor {
    /// Build a GET request descriptor, the only method the engine caches.
    pub fn get(url: Url, kind: ResourceKind) -> Self {
        Self { method: "GET".to_string(), url, kind }
    }

    /// Whether this is a read request eligible for interception.
    pub fn is_read(&self) -> bool {
        self.method == "GET"
    }
}

/// One resolved response, delivered back through the interception boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseDescriptor {
    /// HTTP status code.
    pub status: u16,
    /// Response headers, ordered by name.
    pub headers: BTreeMap<String, String>,
    /// Response body bytes.
    pub body: Bytes,
}

impl ResponseDescriptor {
    /// Whether this response may be persisted to a cache namespace.
    ///
    /// Only exact 200s are cacheable. Redirects, partial content, and error
    /// statuses are delivered to the caller but never stored, so a transient
    /// failure can never poison a namespace.
    pub fn is_cacheable(&self) -> bool {
        self.status == 200
    }

    /// Look up a header value by name (exact match).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}
