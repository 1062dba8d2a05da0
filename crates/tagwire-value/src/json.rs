//! Bridge between [`Variant`] and `serde_json::Value`.
//!
//! The mapping is lossy in both directions: JSON has no Invalid tag and no
//! byte-strings, and `Variant` has no integers wider than 32 bits.

use bytes::Bytes;
use serde_json::{Number, Value};

use crate::variant::Variant;

impl Variant {
    /// Render as JSON. Invalid and Null both become `null`, non-finite reals
    /// become `null`, and non-UTF-8 strings are replaced lossily.
    pub fn to_json(&self) -> Value {
        match self {
            Variant::Invalid | Variant::Null => Value::Null,
            Variant::Boolean(value) => Value::Bool(*value),
            Variant::Integer(value) => Value::from(*value),
            Variant::Real(value) => Number::from_f64(*value)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Variant::String(value) => Value::String(String::from_utf8_lossy(value).into_owned()),
            Variant::List(items) => Value::Array(items.iter().map(Variant::to_json).collect()),
            Variant::Map(map) => Value::Object(
                map.iter()
                    .map(|(key, value)| (String::from_utf8_lossy(key).into_owned(), value.to_json()))
                    .collect(),
            ),
        }
    }

    /// Build from JSON. Numbers that fit `i32` become Integer, everything
    /// else numeric becomes Real.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Variant::Null,
            Value::Bool(value) => Variant::Boolean(*value),
            Value::Number(number) => match number.as_i64().and_then(|n| i32::try_from(n).ok()) {
                Some(n) => Variant::Integer(n),
                None => Variant::Real(number.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(value) => Variant::String(Bytes::from(value.clone())),
            Value::Array(items) => Variant::List(items.iter().map(Variant::from_json).collect()),
            Value::Object(map) => Variant::Map(
                map.iter()
                    .map(|(key, value)| {
                        (Bytes::copy_from_slice(key.as_bytes()), Variant::from_json(value))
                    })
                    .collect(),
            ),
        }
    }
}
