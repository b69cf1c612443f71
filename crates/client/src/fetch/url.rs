//! URL canonicalization for consistent cache keys.
//!
//! Every URL crossing the interception boundary is canonicalized once so
//! that the same resource always produces the same request key: fragments
//! never reach the cache, the query string is preserved verbatim, and only
//! http(s) schemes are accepted.

/// Error type for URL canonicalization failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Canonicalize an absolute URL string.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Default scheme to https:// if missing
/// 3. Remove fragment (#...)
/// 4. Keep query string intact (do not reorder)
///
/// Host lowercasing comes with URL parsing itself.
pub fn canonicalize(input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let url_str = if trimmed.contains("://") { trimmed.to_string() } else { format!("https://{trimmed}") };

    let mut parsed = url::Url::parse(&url_str).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

/// Resolve a precache manifest path against the configured origin.
///
/// Manifest entries are absolute paths ("/index.html"); joining keeps the
/// origin's scheme and host and replaces the path.
pub fn resolve_path(origin: &url::Url, path: &str) -> Result<url::Url, UrlError> {
    origin.join(path).map_err(|e| UrlError::InvalidUrl(e.to_string()))
}
