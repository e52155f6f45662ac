use chart_core::RecordShape;
use rusqlite::params;

use crate::Db;
use crate::error::{DbError, Result};
use crate::helpers::{qualified_table, quote_ident, validate_identifier};

impl Db {
    pub fn table_exists(&self, schema: &str, table_name: &str) -> Result<bool> {
        validate_identifier(schema)?;
        let count: i64 = self.conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM {}.sqlite_master WHERE type = 'table' AND name = ?1",
                quote_ident(schema)
            ),
            params![table_name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Creates `schema.table_name` with the chart columns for that table when
    /// it is missing. Returns whether the table was created by this call.
    pub fn ensure_table(&self, schema: &str, table_name: &str) -> Result<bool> {
        let shape = RecordShape::for_table(table_name)
            .ok_or_else(|| DbError::UnknownTable(table_name.to_string()))?;
        if self.table_exists(schema, table_name)? {
            return Ok(false);
        }
        self.conn.execute_batch(&create_table_sql(schema, shape)?)?;
        Ok(true)
    }
}

fn create_table_sql(schema: &str, shape: &RecordShape) -> Result<String> {
    let columns = shape
        .columns
        .iter()
        .map(|column| format!("  {} {}", column.name, column.column_type.sql_type()))
        .collect::<Vec<_>>()
        .join(",\n");
    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {} (\n{}\n);",
        qualified_table(schema, shape.table_name)?,
        columns
    ))
}
