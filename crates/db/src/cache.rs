use std::fmt::Write;
use std::path::Path;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::helpers::validate_identifier;

const CACHE_SCHEMA: &str = include_str!("../migrations/0001_response_cache.sql");

/// A response body stored for a request URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    pub status: u16,
    pub body: String,
}

/// SQLite-backed HTTP response cache. Each namespace is its own database
/// file, `<namespace>.sqlite`, under the cache directory.
pub struct ResponseCache {
    conn: Connection,
    namespace: String,
}

impl ResponseCache {
    pub fn open(dir: impl AsRef<Path>, namespace: &str) -> Result<Self> {
        validate_identifier(namespace)?;
        let path = dir.as_ref().join(format!("{namespace}.sqlite"));
        Self::init(Connection::open(path)?, namespace)
    }

    pub fn open_in_memory(namespace: &str) -> Result<Self> {
        validate_identifier(namespace)?;
        Self::init(Connection::open_in_memory()?, namespace)
    }

    fn init(conn: Connection, namespace: &str) -> Result<Self> {
        conn.execute_batch(CACHE_SCHEMA)?;
        Ok(Self {
            conn,
            namespace: namespace.to_string(),
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn get(&self, key: &str) -> Result<Option<CachedResponse>> {
        let cached = self
            .conn
            .query_row(
                "SELECT status, body FROM http_response WHERE cache_key = ?1",
                params![key],
                |row| {
                    Ok(CachedResponse {
                        status: row.get(0)?,
                        body: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(cached)
    }

    pub fn put(&self, key: &str, url: &str, response: &CachedResponse) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO http_response (cache_key, url, status, body, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(cache_key) DO UPDATE SET
              status = excluded.status,
              body = excluded.body,
              created_at = excluded.created_at
            "#,
            params![
                key,
                url,
                response.status as i64,
                response.body,
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(())
    }

    pub fn len(&self) -> Result<usize> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM http_response", [], |row| row.get(0))?;
        Ok(count.max(0) as usize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Removes every stored response and returns how many were dropped.
    pub fn clear(&self) -> Result<usize> {
        Ok(self.conn.execute("DELETE FROM http_response", [])?)
    }
}

/// Cache key for a fully built request URL.
pub fn cache_key(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(&mut out, "{:02x}", byte);
    }
    out
}
