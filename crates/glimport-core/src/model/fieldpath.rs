// ── Dotted field paths into unstructured objects ──
//
// `spec.forProvider.path` style access over `serde_json::Value`. Segments
// are split on `.`; annotation keys (which contain dots) go through the
// dedicated annotation accessors instead.

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("{path} is not set")]
    Missing { path: String },

    #[error("{path} is not {expected}")]
    WrongType {
        path: String,
        expected: &'static str,
    },

    #[error("cannot write {path}: {segment} is not an object")]
    NotAnObject { path: String, segment: String },
}

pub(crate) fn get<'a>(object: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(object, |current, segment| current.as_object()?.get(segment))
}

pub(crate) fn get_integer(object: &Value, path: &str) -> Result<i64, FieldError> {
    let value = get(object, path).ok_or_else(|| FieldError::Missing { path: path.into() })?;
    as_integer(value).ok_or_else(|| FieldError::WrongType {
        path: path.into(),
        expected: "an integer",
    })
}

pub(crate) fn get_string<'a>(object: &'a Value, path: &str) -> Result<&'a str, FieldError> {
    let value = get(object, path).ok_or_else(|| FieldError::Missing { path: path.into() })?;
    value.as_str().ok_or_else(|| FieldError::WrongType {
        path: path.into(),
        expected: "a string",
    })
}

/// Integers may arrive as doubles (protobuf `Struct` has no integer type).
#[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
fn as_integer(value: &Value) -> Option<i64> {
    let Value::Number(number) = value else {
        return None;
    };
    if let Some(i) = number.as_i64() {
        return Some(i);
    }
    let f = number.as_f64()?;
    let in_range = f >= -9_007_199_254_740_992.0 && f <= 9_007_199_254_740_992.0;
    (f.fract().abs() < f64::EPSILON && in_range).then_some(f as i64)
}

/// Write `value` at `path`, creating intermediate objects as needed.
pub(crate) fn set(object: &mut Value, path: &str, value: Value) -> Result<(), FieldError> {
    let segments: Vec<&str> = path.split('.').collect();
    let Some((last, parents)) = segments.split_last() else {
        return Err(FieldError::Missing { path: path.into() });
    };

    let mut current = object;
    let mut walked = String::new();
    for segment in parents {
        if !walked.is_empty() {
            walked.push('.');
        }
        walked.push_str(segment);

        let map = current
            .as_object_mut()
            .ok_or_else(|| not_an_object(path, &walked))?;
        current = map
            .entry((*segment).to_owned())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    let map = current
        .as_object_mut()
        .ok_or_else(|| not_an_object(path, &walked))?;
    map.insert((*last).to_owned(), value);
    Ok(())
}

fn not_an_object(path: &str, segment: &str) -> FieldError {
    FieldError::NotAnObject {
        path: path.into(),
        segment: if segment.is_empty() {
            "<root>".into()
        } else {
            segment.into()
        },
    }
}
