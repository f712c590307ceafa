//! Lenient readers over extracted JSON objects.
//!
//! Evaluation serializes configuration values with every optional field
//! skipped, so absence is the common case and never an error. Readers
//! return defaults for missing or differently typed fields; only the
//! handful of structural checks in [`ShapeError`] are strict.
//!
//! [`ShapeError`]: crate::error::ShapeError

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::error::ShapeError;

/// The field set of one extracted declaration.
pub(crate) type Fields = Map<String, Value>;

/// Extracted data must be a JSON object before any field can be read.
pub(crate) fn object_root(data: &Value) -> Result<&Fields, ShapeError> {
    data.as_object().ok_or(ShapeError::NotAnObject)
}

/// String field, empty when absent.
pub(crate) fn string(fields: &Fields, key: &str) -> String {
    fields
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// String field, `None` when absent.
pub(crate) fn opt_string(fields: &Fields, key: &str) -> Option<String> {
    fields.get(key).and_then(Value::as_str).map(str::to_string)
}

pub(crate) fn boolean(fields: &Fields, key: &str) -> Option<bool> {
    fields.get(key).and_then(Value::as_bool)
}

/// Unsigned integer field. Whole-valued doubles are accepted because
/// numbers may round-trip through readers that only know doubles.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::float_cmp)]
pub(crate) fn unsigned(fields: &Fields, key: &str) -> Option<u32> {
    match fields.get(key)? {
        Value::Number(number) => {
            if let Some(whole) = number.as_u64() {
                return u32::try_from(whole).ok();
            }
            let double = number.as_f64()?;
            if double >= 0.0 && double <= f64::from(u32::MAX) && double.fract() == 0.0 {
                Some(double as u32)
            } else {
                None
            }
        }
        _ => None,
    }
}

/// String array field; elements of any other type are dropped.
pub(crate) fn string_list(fields: &Fields, key: &str) -> Vec<String> {
    fields
        .get(key)
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// String-to-string object field. Keys come out in the JSON object's
/// sorted order, which keeps rendered output stable.
pub(crate) fn string_map(fields: &Fields, key: &str) -> IndexMap<String, String> {
    let mut map = IndexMap::new();
    if let Some(Value::Object(entries)) = fields.get(key) {
        for (name, value) in entries {
            if let Some(text) = value.as_str() {
                map.insert(name.clone(), text.to_string());
            }
        }
    }
    map
}
