//! Handlers shipped with the crate.
//!
//! Additional fields of pages (`Map`, `Images`, `DefaultHandler`), sheet
//! geometry in its model-backed, related and independent flavours, and a
//! scalar `PlainText`.

pub mod default_handler;
pub mod images;
pub mod map;
pub mod sheet;
pub mod text;

pub use default_handler::DefaultHandler;
pub use images::{Image, Images};
pub use map::Map;
pub use sheet::{IndependentSingleType, Margins, RollPaperType, SingleType};
pub use text::PlainText;

use serde_json::Value as JsonValue;

use crate::core::EntityArray;

pub(crate) fn int_field(array: &EntityArray, key: &str) -> Option<i64> {
    match array.get(key)? {
        JsonValue::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float as i64)),
        JsonValue::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn text_field(array: &EntityArray, key: &str) -> Option<String> {
    match array.get(key)? {
        JsonValue::String(text) => Some(text.clone()),
        JsonValue::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

pub(crate) fn bool_field(array: &EntityArray, key: &str) -> Option<bool> {
    match array.get(key)? {
        JsonValue::Bool(flag) => Some(*flag),
        JsonValue::Number(number) => number.as_i64().map(|n| n != 0),
        _ => None,
    }
}

pub(crate) fn list_field(array: &EntityArray, key: &str) -> Vec<JsonValue> {
    match array.get(key) {
        Some(JsonValue::Array(items)) => items.clone(),
        _ => Vec::new(),
    }
}
