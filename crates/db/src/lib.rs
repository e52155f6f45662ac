mod cache;
mod error;
mod helpers;
mod rows;
mod schema;

use std::path::Path;

use rusqlite::Connection;

pub use cache::{CachedResponse, ResponseCache, cache_key};
pub use error::{DbError, Result};
pub use helpers::validate_identifier;

/// Handle to the destination database that chart rows are appended to.
pub struct Db {
    conn: Connection,
}

impl Db {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "temp_store", "MEMORY")?;
        Ok(Self { conn })
    }

    /// Makes `schema` addressable by attaching `path` under that name.
    /// `main` and `temp` always exist and are left alone.
    pub fn attach_schema(&self, schema: &str, path: impl AsRef<Path>) -> Result<()> {
        validate_identifier(schema)?;
        if schema == "main" || schema == "temp" || self.schema_attached(schema)? {
            return Ok(());
        }
        let path = path.as_ref().to_string_lossy().to_string();
        self.conn.execute(
            &format!("ATTACH DATABASE ?1 AS {}", helpers::quote_ident(schema)),
            [path],
        )?;
        Ok(())
    }

    fn schema_attached(&self, schema: &str) -> Result<bool> {
        let mut stmt = self.conn.prepare("PRAGMA database_list")?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let name: String = row.get(1)?;
            if name == schema {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, err)| DbError::Sqlite(err))
    }
}
