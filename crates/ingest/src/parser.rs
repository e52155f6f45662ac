use chart_core::RecordShape;
use serde_json::Value;

use crate::types::{IngestError, Result};

/// Items of one chart page, e.g. `artists.artist[]`. A page without an item
/// list yields no items; a single object is treated as a one-item list.
pub fn chart_items<'a>(shape: &RecordShape, body: &'a Value) -> Result<&'a [Value]> {
    let collection = body.get(shape.collection_key).ok_or_else(|| {
        IngestError::MalformedResponse(format!(
            "missing `{}` in {} response",
            shape.collection_key, shape.api_method
        ))
    })?;
    match collection.get(shape.item_key) {
        Some(Value::Array(items)) => Ok(items.as_slice()),
        Some(item @ Value::Object(_)) => Ok(std::slice::from_ref(item)),
        Some(Value::Null) | None => Ok(&[]),
        Some(other) => Err(IngestError::MalformedResponse(format!(
            "`{}.{}` is not a list: {}",
            shape.collection_key, shape.item_key, other
        ))),
    }
}

/// `@attr.totalPages` of a chart page, when present and numeric.
pub fn total_pages(shape: &RecordShape, body: &Value) -> Option<u32> {
    let value = body
        .get(shape.collection_key)?
        .get("@attr")?
        .get("totalPages")?;
    match value {
        Value::Number(number) => number.as_u64().and_then(|pages| u32::try_from(pages).ok()),
        Value::String(text) => text.trim().parse::<u32>().ok(),
        _ => None,
    }
}
