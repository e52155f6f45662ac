use chart_core::FieldValue;
use rusqlite::types::Value;

use crate::error::{DbError, Result};

/// Schema, table and cache namespace names are spliced into SQL and file
/// names, so they are restricted to ASCII word characters.
pub fn validate_identifier(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && !name.starts_with(|ch: char| ch.is_ascii_digit())
        && name.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
    if valid {
        Ok(())
    } else {
        Err(DbError::InvalidIdentifier(name.to_string()))
    }
}

pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub(crate) fn qualified_table(schema: &str, table: &str) -> Result<String> {
    validate_identifier(schema)?;
    validate_identifier(table)?;
    Ok(format!("{}.{}", quote_ident(schema), quote_ident(table)))
}

pub(crate) fn sql_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Null => Value::Null,
        FieldValue::Text(text) => Value::Text(text.clone()),
        FieldValue::Integer(number) => Value::Integer(*number),
        FieldValue::Date(date) => Value::Text(date.format("%Y-%m-%d").to_string()),
    }
}
