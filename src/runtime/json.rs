//! Exchange of template values with serde and JSON callers.
//!
//! Everything goes through `serde_json::Value`, so both directions share one
//! number policy: integers that fit in an `i64` become `Int`, every other number
//! (including unsigned values above `i64::MAX`) becomes `Double`. Non-finite
//! doubles have no JSON form and arrive as `Null`.

use crate::error::LiquidError;
use crate::runtime::value::Value;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Number;

/// Converts any `Serialize` type into a template [`Value`].
///
/// Structs and maps become objects (map keys must be strings or integers),
/// sequences, tuples and byte strings become lists, unit and `None` become null.
pub fn to_value<T: ?Sized + Serialize>(value: &T) -> Result<Value, LiquidError> {
    serde_json::to_value(value)
        .map(Value::from)
        .map_err(json_error)
}

fn json_error(e: serde_json::Error) -> LiquidError {
    LiquidError::Serialization(e.to_string())
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::Double(d) => serializer.serialize_f64(*d),
            Value::Str(s) => serializer.serialize_str(s),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Object(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (k, v) in fields {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Value::Ref(r) => match r.get() {
                Some(target) => target.as_ref().serialize(serializer),
                None => serializer.serialize_unit(),
            },
            // Host objects are opaque outside the process.
            Value::Host(_) => serializer.serialize_unit(),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => number_to_value(&n),
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(fields) => Value::Object(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

fn number_to_value(n: &Number) -> Value {
    if let Some(i) = n.as_i64() {
        Value::Int(i)
    } else {
        Value::Double(n.as_f64().unwrap_or(f64::NAN))
    }
}

impl Value {
    pub fn from_json(json: serde_json::Value) -> Value {
        Value::from(json)
    }

    /// Parses JSON text into a value.
    pub fn from_json_str(text: &str) -> Result<Value, LiquidError> {
        serde_json::from_str::<serde_json::Value>(text)
            .map(Value::from)
            .map_err(json_error)
    }

    pub fn to_json(&self) -> Result<serde_json::Value, LiquidError> {
        serde_json::to_value(self).map_err(json_error)
    }
}
