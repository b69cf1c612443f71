//! Normalized request key generation.
//!
//! A stored snapshot is addressed by a digest of the request method and
//! absolute URL. The query string participates in the key; the fragment
//! never does (it is client-side only and would split cache entries for
//! the same resource).

use sha2::{Digest, Sha256};
use url::Url;

/// Compute the cache key for a request.
pub fn request_key(method: &str, url: &Url) -> String {
    let mut normalized = url.clone();
    normalized.set_fragment(None);

    let mut hasher = Sha256::new();
    hasher.update(method.as_bytes());
    hasher.update(b"\n");
    hasher.update(normalized.as_str().as_bytes());
    hex::encode(hasher.finalize())
}
