use std::collections::HashSet;

use chart_core::{ColumnType, FieldValue, PersistedRow, RecordShape};
use chrono::NaiveDate;
use serde_json::Value;

use crate::types::{IngestError, Result};

/// Identities already transformed during the current run. Lives for one run
/// only, so rows stored by earlier runs are not consulted.
#[derive(Debug, Clone, Default)]
pub struct SeenIdentities {
    identities: HashSet<String>,
}

impl SeenIdentities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.identities.contains(identity)
    }

    /// Returns false when the identity was already present.
    pub fn insert(&mut self, identity: impl Into<String>) -> bool {
        self.identities.insert(identity.into())
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}

/// Maps raw chart items to rows, skipping items whose identity is already in
/// `seen` and recording the identities of the rows it returns. Output keeps
/// the input order.
pub fn transform(
    shape: &RecordShape,
    items: &[Value],
    seen: &mut SeenIdentities,
    extract_date: NaiveDate,
) -> Result<Vec<PersistedRow>> {
    let mut rows = Vec::new();
    for item in items {
        let identity = item
            .get(shape.identity)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                IngestError::MalformedRecord(format!(
                    "{} item without `{}`: {}",
                    shape.table_name, shape.identity, item
                ))
            })?;
        if seen.contains(identity) {
            continue;
        }
        let mut values = Vec::with_capacity(shape.columns.len());
        for column in shape.columns {
            let value = match column.column_type {
                ColumnType::Date => FieldValue::Date(extract_date),
                ColumnType::Integer => {
                    let raw = item.get(column.name);
                    let number = raw.and_then(coerce_integer).ok_or_else(|| {
                        IngestError::MalformedRecord(format!(
                            "`{}` is not an integer for {}: {}",
                            column.name,
                            identity,
                            raw.map(Value::to_string)
                                .unwrap_or_else(|| "missing".to_string())
                        ))
                    })?;
                    FieldValue::Integer(number)
                }
                ColumnType::Text => text_value(item.get(column.name)),
            };
            values.push((column.name, value));
        }
        seen.insert(identity);
        rows.push(PersistedRow {
            identity: identity.to_string(),
            values,
        });
    }
    Ok(rows)
}

/// The API sends counts either as JSON numbers or numeric strings. Floats
/// must be integral and fit in an `i64`.
pub fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|float| {
                    float.fract() == 0.0
                        && *float >= i64::MIN as f64
                        && *float < i64::MAX as f64
                })
                .map(|float| float as i64)
        }),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn text_value(value: Option<&Value>) -> FieldValue {
    match value {
        None | Some(Value::Null) => FieldValue::Null,
        Some(Value::String(text)) => FieldValue::Text(text.clone()),
        Some(other) => FieldValue::Text(other.to_string()),
    }
}
