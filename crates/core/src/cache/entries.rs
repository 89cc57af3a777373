//! Entry CRUD operations within a store.
//!
//! Entries are keyed by [`compute_entry_key`] of the request. Each record
//! carries the time it was written as an explicit field rather than as a
//! response header, so it cannot collide with anything the server sends.

use super::hash::compute_entry_key;
use super::stores::Store;
use crate::Error;
use crate::http::{Headers, Request};
use bytes::Bytes;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A response as persisted in a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: Headers,
    pub body: Bytes,
    /// Epoch milliseconds at which the entry was written. `None` means the
    /// age is unknown.
    pub cached_at_ms: Option<i64>,
}

/// Listing row for an entry, without the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EntryInfo {
    pub method: String,
    pub url: String,
    pub status: u16,
    pub body_len: u64,
    pub cached_at_ms: Option<i64>,
}

impl Store {
    /// Insert or replace the entry for `request`.
    pub async fn put(&self, request: &Request, response: &StoredResponse) -> Result<(), Error> {
        let store = self.name.clone();
        let key = compute_entry_key(&request.method, &request.url);
        let method = request.method.to_ascii_uppercase();
        let url = request.url.to_string();
        let headers_json = serde_json::to_string(&response.headers)?;
        let response = response.clone();

        self.storage
            .conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO entries (
                    store, key_hash, method, url, status, status_text,
                    headers_json, body, cached_at_ms
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                ON CONFLICT(store, key_hash) DO UPDATE SET
                    method = excluded.method,
                    url = excluded.url,
                    status = excluded.status,
                    status_text = excluded.status_text,
                    headers_json = excluded.headers_json,
                    body = excluded.body,
                    cached_at_ms = excluded.cached_at_ms",
                    params![
                        store,
                        key,
                        method,
                        url,
                        response.status,
                        response.status_text,
                        headers_json,
                        response.body.as_ref(),
                        response.cached_at_ms,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up the entry for `request`.
    ///
    /// Returns None if the store holds nothing for it.
    pub async fn match_request(&self, request: &Request) -> Result<Option<StoredResponse>, Error> {
        let store = self.name.clone();
        let key = compute_entry_key(&request.method, &request.url);
        self.storage
            .conn
            .call(move |conn| -> Result<Option<StoredResponse>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT status, status_text, headers_json, body, cached_at_ms
                FROM entries WHERE store = ?1 AND key_hash = ?2",
                )?;

                let result = stmt.query_row(params![store, key], |row| {
                    Ok((
                        row.get::<_, u16>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Vec<u8>>(3)?,
                        row.get::<_, Option<i64>>(4)?,
                    ))
                });

                match result {
                    Ok((status, status_text, headers_json, body, cached_at_ms)) => Ok(Some(StoredResponse {
                        status,
                        status_text,
                        headers: serde_json::from_str(&headers_json)?,
                        body: Bytes::from(body),
                        cached_at_ms,
                    })),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Remove the entry for `request`. Returns false if there was none.
    pub async fn delete(&self, request: &Request) -> Result<bool, Error> {
        let store = self.name.clone();
        let key = compute_entry_key(&request.method, &request.url);
        self.storage
            .conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute(
                    "DELETE FROM entries WHERE store = ?1 AND key_hash = ?2",
                    params![store, key],
                )?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// List the store's entries ordered by URL.
    pub async fn keys(&self) -> Result<Vec<EntryInfo>, Error> {
        let store = self.name.clone();
        self.storage
            .conn
            .call(move |conn| -> Result<Vec<EntryInfo>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT method, url, status, length(body), cached_at_ms
                FROM entries WHERE store = ?1 ORDER BY url, method",
                )?;
                let rows = stmt
                    .query_map(params![store], |row| {
                        Ok(EntryInfo {
                            method: row.get(0)?,
                            url: row.get(1)?,
                            status: row.get(2)?,
                            body_len: row.get::<_, i64>(3)? as u64,
                            cached_at_ms: row.get(4)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(Error::from)
    }
}
