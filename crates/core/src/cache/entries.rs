//! Stored response snapshots.
//!
//! Provides capture, upsert, lookup, and trim operations for the response
//! snapshots held inside a cache namespace.

use std::collections::BTreeMap;

use super::connection::CacheDb;
use super::key;
use crate::Error;
use crate::request::{RequestDescriptor, ResponseDescriptor};
use bytes::Bytes;
use tokio_rusqlite::params;

/// A persisted response snapshot.
///
/// Snapshots round-trip to [`ResponseDescriptor`] with byte-identical
/// status, headers, and body; `url` and `fetched_at` are kept for
/// inspection and trim ordering.
#[derive(Debug, Clone)]
pub struct StoredResponse {
    pub request_key: String,
    pub namespace: String,
    pub url: String,
    pub status: u16,
    pub headers_json: String,
    pub body: Vec<u8>,
    pub fetched_at: String,
}

impl StoredResponse {
    /// Capture a network response for storage under `namespace`.
    pub fn capture(
        namespace: &str, request: &RequestDescriptor, response: &ResponseDescriptor,
    ) -> Result<Self, Error> {
        let request_key = key::request_key(&request.method, &request.url);
        let headers_json = serde_json::to_string(&response.headers)
            .map_err(|e| Error::CorruptSnapshot { key: request_key.clone(), reason: e.to_string() })?;

        Ok(Self {
            request_key,
            namespace: namespace.to_string(),
            url: request.url.to_string(),
            status: response.status,
            headers_json,
            body: response.body.to_vec(),
            fetched_at: chrono::Utc::now().to_rfc3339(),
        })
    }

    /// Reconstruct the response this snapshot was captured from.
    pub fn into_response(self) -> Result<ResponseDescriptor, Error> {
        let headers: BTreeMap<String, String> = serde_json::from_str(&self.headers_json)
            .map_err(|e| Error::CorruptSnapshot { key: self.request_key.clone(), reason: e.to_string() })?;

        Ok(ResponseDescriptor { status: self.status, headers, body: Bytes::from(self.body) })
    }
}

impl CacheDb {
    /// Insert or overwrite a snapshot.
    ///
    /// Uses UPSERT semantics on (namespace, request_key): a later capture of
    /// the same request replaces the earlier one.
    pub async fn put_entry(&self, snapshot: &StoredResponse) -> Result<(), Error> {
        let snapshot = snapshot.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO entries (
                        namespace, request_key, url, status, headers_json, body, fetched_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                    ON CONFLICT(namespace, request_key) DO UPDATE SET
                        url = excluded.url,
                        status = excluded.status,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        fetched_at = excluded.fetched_at",
                    params![
                        &snapshot.namespace,
                        &snapshot.request_key,
                        &snapshot.url,
                        snapshot.status as i64,
                        &snapshot.headers_json,
                        &snapshot.body,
                        &snapshot.fetched_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get a snapshot by namespace and request key.
    ///
    /// Returns None on a cache miss.
    pub async fn get_entry(&self, namespace: &str, request_key: &str) -> Result<Option<StoredResponse>, Error> {
        let namespace = namespace.to_string();
        let request_key = request_key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<StoredResponse>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT namespace, request_key, url, status, headers_json, body, fetched_at
                     FROM entries WHERE namespace = ?1 AND request_key = ?2",
                )?;

                let result = stmt.query_row(params![namespace, request_key], |row| {
                    Ok(StoredResponse {
                        namespace: row.get(0)?,
                        request_key: row.get(1)?,
                        url: row.get(2)?,
                        status: row.get::<_, i64>(3)? as u16,
                        headers_json: row.get(4)?,
                        body: row.get(5)?,
                        fetched_at: row.get(6)?,
                    })
                });

                match result {
                    Ok(s) => Ok(Some(s)),
                    Err(tokio_rusqlite::rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Number of snapshots held in a namespace.
    pub async fn count_entries(&self, namespace: &str) -> Result<u64, Error> {
        let namespace = namespace.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM entries WHERE namespace = ?1",
                    params![namespace],
                    |row| row.get(0),
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete oldest-captured snapshots until the namespace holds at most
    /// `max_entries`.
    ///
    /// Returns the number of deleted snapshots. Never runs implicitly; the
    /// engine's strategies do not bound namespace growth on the write path.
    pub async fn trim_namespace(&self, namespace: &str, max_entries: usize) -> Result<u64, Error> {
        let namespace = namespace.to_string();
        let max = max_entries as i64;
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM entries WHERE namespace = ?1",
                    params![namespace],
                    |row| row.get(0),
                )?;
                if count <= max {
                    return Ok(0);
                }

                let to_delete = count - max;
                let deleted = conn.execute(
                    "DELETE FROM entries WHERE namespace = ?1 AND request_key IN (
                        SELECT request_key FROM entries WHERE namespace = ?1
                        ORDER BY fetched_at ASC LIMIT ?2
                    )",
                    params![namespace, to_delete],
                )?;
                Ok(deleted as u64)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::namespaces::NamespaceRole;
    use crate::request::ResourceKind;
    use url::Url;

    async fn open_runtime(db: &CacheDb) -> String {
        db.open_namespace("v1", NamespaceRole::Runtime).await.unwrap()
    }

    fn make_request(url: &str) -> RequestDescriptor {
        RequestDescriptor::get(Url::parse(url).unwrap(), ResourceKind::Image)
    }

    fn make_response(body: &str) -> ResponseDescriptor {
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), "image/png".to_string());
        headers.insert("etag".to_string(), "\"abc\"".to_string());
        ResponseDescriptor { status: 200, headers, body: Bytes::from(body.as_bytes().to_vec()) }
    }

    #[tokio::test]
    async fn test_round_trip_is_byte_identical() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let namespace = open_runtime(&db).await;

        let request = make_request("https://example.com/logo.png");
        let response = make_response("png-bytes");
        let snapshot = StoredResponse::capture(&namespace, &request, &response).unwrap();

        db.put_entry(&snapshot).await.unwrap();

        let read_back = db
            .get_entry(&namespace, &snapshot.request_key)
            .await
            .unwrap()
            .unwrap()
            .into_response()
            .unwrap();
        assert_eq!(read_back, response);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let namespace = open_runtime(&db).await;
        let result = db.get_entry(&namespace, "nonexistent").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let namespace = open_runtime(&db).await;
        let request = make_request("https://example.com/logo.png");

        let first = StoredResponse::capture(&namespace, &request, &make_response("old")).unwrap();
        db.put_entry(&first).await.unwrap();

        let second = StoredResponse::capture(&namespace, &request, &make_response("new")).unwrap();
        db.put_entry(&second).await.unwrap();

        assert_eq!(db.count_entries(&namespace).await.unwrap(), 1);
        let read_back = db
            .get_entry(&namespace, &first.request_key)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(read_back.body, b"new");
    }

    #[tokio::test]
    async fn test_trim_keeps_newest() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let namespace = open_runtime(&db).await;

        for (i, fetched_at) in ["2026-01-01T00:00:00Z", "2026-01-02T00:00:00Z", "2026-01-03T00:00:00Z"]
            .iter()
            .enumerate()
        {
            let request = make_request(&format!("https://example.com/tile-{i}.png"));
            let mut snapshot = StoredResponse::capture(&namespace, &request, &make_response("tile")).unwrap();
            snapshot.fetched_at = fetched_at.to_string();
            db.put_entry(&snapshot).await.unwrap();
        }

        let deleted = db.trim_namespace(&namespace, 1).await.unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(db.count_entries(&namespace).await.unwrap(), 1);

        let request = make_request("https://example.com/tile-2.png");
        let survivor_key = key::request_key(&request.method, &request.url);
        assert!(db.get_entry(&namespace, &survivor_key).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_trim_under_cap_is_noop() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let namespace = open_runtime(&db).await;

        let request = make_request("https://example.com/logo.png");
        let snapshot = StoredResponse::capture(&namespace, &request, &make_response("x")).unwrap();
        db.put_entry(&snapshot).await.unwrap();

        assert_eq!(db.trim_namespace(&namespace, 5).await.unwrap(), 0);
        assert_eq!(db.count_entries(&namespace).await.unwrap(), 1);
    }
}
