use std::collections::HashSet;

use chart_core::{PersistedRow, RecordShape};
use rusqlite::params_from_iter;
use rusqlite::types::Value;

use crate::Db;
use crate::error::{DbError, Result};
use crate::helpers::{qualified_table, sql_value};

impl Db {
    /// Appends `rows` to `schema.table_name` in one transaction and returns
    /// the number of rows written. Rows repeating an identity already in the
    /// batch are dropped; nothing is checked against rows already stored.
    pub fn load_rows(
        &mut self,
        schema: &str,
        table_name: &str,
        rows: &[PersistedRow],
    ) -> Result<usize> {
        let batch = dedup_batch(rows);
        if batch.is_empty() {
            return Ok(0);
        }
        let shape = RecordShape::for_table(table_name)
            .ok_or_else(|| DbError::UnknownTable(table_name.to_string()))?;
        let columns: Vec<&str> = shape.column_names().collect();
        let placeholders = (1..=columns.len())
            .map(|index| format!("?{index}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            qualified_table(schema, table_name)?,
            columns.join(", "),
            placeholders
        );

        let tx = self.conn.transaction()?;
        let mut inserted = 0usize;
        {
            let mut stmt = tx.prepare(&sql)?;
            for row in &batch {
                let values = columns
                    .iter()
                    .map(|column| row.get(column).map(sql_value).unwrap_or(Value::Null));
                inserted += stmt.execute(params_from_iter(values))?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    pub fn count_rows(&self, schema: &str, table_name: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", qualified_table(schema, table_name)?),
            [],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as usize)
    }

    /// Identities stored in `schema.table_name`, in insertion order.
    pub fn list_identities(&self, schema: &str, table_name: &str) -> Result<Vec<String>> {
        let shape = RecordShape::for_table(table_name)
            .ok_or_else(|| DbError::UnknownTable(table_name.to_string()))?;
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM {} ORDER BY rowid ASC",
            shape.identity,
            qualified_table(schema, table_name)?
        ))?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }
}

fn dedup_batch(rows: &[PersistedRow]) -> Vec<&PersistedRow> {
    let mut seen = HashSet::with_capacity(rows.len());
    rows.iter()
        .filter(|row| seen.insert(row.identity.as_str()))
        .collect()
}
