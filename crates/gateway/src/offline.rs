//! Offline fallback document.
//!
//! The terminal fallback when both network and cache are unavailable for a
//! request. Takes no arguments, performs no I/O, and cannot fail; the
//! document is self-contained and renders with zero network access.

use std::collections::BTreeMap;

use bytes::Bytes;

use wayside_core::ResponseDescriptor;

const OFFLINE_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Offline</title>
<style>
body{font-family:system-ui;background:#f5f7fa;color:#1e293b;padding:40px 20px;text-align:center}
h1{font-size:32px;margin-bottom:16px}
p{color:#64748b;margin-bottom:24px}
button{background:#10b981;color:white;border:none;padding:12px 24px;border-radius:8px;cursor:pointer}
button:hover{background:#0f5538}
</style>
</head>
<body>
<h1>You are offline</h1>
<p>This page is not available right now. Try again once you are connected.</p>
<button onclick="location.reload()">Retry</button>
</body>
</html>
"#;

/// Build the synthesized degraded response: a fixed 503 document with a
/// retry affordance.
pub fn offline_response() -> ResponseDescriptor {
    let mut headers = BTreeMap::new();
    headers.insert("content-type".to_string(), "text/html; charset=utf-8".to_string());
    ResponseDescriptor { status: 503, headers, body: Bytes::from_static(OFFLINE_PAGE.as_bytes()) }
}
