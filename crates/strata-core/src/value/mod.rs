//! Decoded and constructed values.
//!
//! Values are plain data: they do not remember the layout that produced
//! them. Arrays keep one row-major backing store and hand out borrowed views
//! for sub-arrays; structures keep their members in declaration order.

mod array;
mod structure;

use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;

pub use array::{ArrayValue, ArrayView, Element};
pub use structure::{StructKind, StructValue};

/// A value of some layout.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    UInt(u64),
    Int(i64),
    Float(f64),
    Array(ArrayValue),
    Structure(StructValue),
}

impl Value {
    /// Non-negative integers as `u64`.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::UInt(u) => Some(*u),
            Value::Int(i) => u64::try_from(*i).ok(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::UInt(u) => i64::try_from(*u).ok(),
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::UInt(u) => Some(*u as f64),
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayValue> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut ArrayValue> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_structure(&self) -> Option<&StructValue> {
        match self {
            Value::Structure(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_structure_mut(&mut self) -> Option<&mut StructValue> {
        match self {
            Value::Structure(s) => Some(s),
            _ => None,
        }
    }

    /// Short name of the variant, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::UInt(_) => "unsigned integer",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Array(_) => "array",
            Value::Structure(_) => "structure",
        }
    }

    /// Convert to plain nested data.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::UInt(u) => JsonValue::from(*u),
            Value::Int(i) => JsonValue::from(*i),
            Value::Float(f) => JsonValue::from(*f),
            Value::Array(a) => a.to_json(),
            Value::Structure(s) => s.to_json(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::UInt(u) => write!(f, "{u}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Array(_) | Value::Structure(_) => write!(f, "{}", self.to_json()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl From<u64> for Value {
    fn from(u: u64) -> Self {
        Value::UInt(u)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<ArrayValue> for Value {
    fn from(a: ArrayValue) -> Self {
        Value::Array(a)
    }
}

impl From<StructValue> for Value {
    fn from(s: StructValue) -> Self {
        Value::Structure(s)
    }
}

impl PartialEq<JsonValue> for Value {
    fn eq(&self, other: &JsonValue) -> bool {
        json_eq(self, other)
    }
}

/// Structural comparison against plain data, ignoring type identity.
pub(crate) fn json_eq(value: &Value, json: &JsonValue) -> bool {
    match value {
        Value::UInt(u) => json.as_u64() == Some(*u),
        Value::Int(i) => json.as_i64() == Some(*i),
        Value::Float(f) => json.as_f64() == Some(*f),
        Value::Array(a) => a == json,
        Value::Structure(s) => s == json,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_accessors_cross_signedness() {
        assert_eq!(Value::Int(5).as_u64(), Some(5));
        assert_eq!(Value::Int(-5).as_u64(), None);
        assert_eq!(Value::UInt(u64::MAX).as_i64(), None);
        assert_eq!(Value::UInt(3).as_f64(), Some(3.0));
    }

    #[test]
    fn compares_with_plain_numbers() {
        assert_eq!(Value::UInt(256), json!(256));
        assert_eq!(Value::Int(-1), json!(-1));
        assert_ne!(Value::UInt(1), json!("1"));
    }

    #[test]
    fn display_leaves() {
        assert_eq!(Value::UInt(257).to_string(), "257");
        assert_eq!(Value::Float(1.5).to_string(), "1.5");
    }
}
