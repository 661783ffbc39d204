//! Schemaless JSON-like values for tool schemas and tool input.
//!
//! Converse carries tool input schemas and tool-call arguments as documents
//! rather than typed structures. On the wire a document is plain JSON.

use crate::error::{InferenceError, RequestError};
use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// A generic tagged value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Document {
    /// JSON null.
    #[default]
    Null,
    /// Boolean.
    Bool(bool),
    /// Number, keeping integer and float apart.
    Number(Number),
    /// String.
    String(String),
    /// Ordered list.
    List(Vec<Document>),
    /// String-keyed map.
    Object(BTreeMap<String, Document>),
}

/// Numeric document value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// Non-negative integer.
    PosInt(u64),
    /// Negative integer.
    NegInt(i64),
    /// Floating point.
    Float(f64),
}

impl Number {
    /// Value as f64, possibly lossy for large integers.
    pub fn as_f64(&self) -> f64 {
        match *self {
            Number::PosInt(v) => v as f64,
            Number::NegInt(v) => v as f64,
            Number::Float(v) => v,
        }
    }

    fn to_json(self) -> Value {
        match self {
            Number::PosInt(v) => Value::from(v),
            Number::NegInt(v) => Value::from(v),
            // Non-finite floats have no JSON form and become null.
            Number::Float(v) => serde_json::Number::from_f64(v)
                .map(Value::Number)
                .unwrap_or(Value::Null),
        }
    }
}

impl From<&serde_json::Number> for Number {
    fn from(n: &serde_json::Number) -> Self {
        if let Some(v) = n.as_u64() {
            Number::PosInt(v)
        } else if let Some(v) = n.as_i64() {
            Number::NegInt(v)
        } else {
            Number::Float(n.as_f64().unwrap_or(f64::NAN))
        }
    }
}

impl Document {
    /// Convert a JSON value, recursing into arrays and objects.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Null => Document::Null,
            Value::Bool(b) => Document::Bool(b),
            Value::Number(n) => Document::Number(Number::from(&n)),
            Value::String(s) => Document::String(s),
            Value::Array(items) => Document::List(items.into_iter().map(Self::from_value).collect()),
            Value::Object(map) => Document::Object(
                map.into_iter()
                    .map(|(k, v)| (k, Self::from_value(v)))
                    .collect(),
            ),
        }
    }

    /// Convert any serializable value.
    ///
    /// Fails with `UnsupportedValue` when the value has no JSON form, such as
    /// a map keyed by something other than strings.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, InferenceError> {
        serde_json::to_value(value)
            .map(Self::from_value)
            .map_err(|e| {
                InferenceError::Request(RequestError::UnsupportedValue {
                    type_name: format!("{} ({})", std::any::type_name::<T>(), e),
                })
            })
    }

    /// Parse a JSON string into a document.
    pub fn from_json_str(json: &str) -> Result<Self, InferenceError> {
        serde_json::from_str::<Value>(json)
            .map(Self::from_value)
            .map_err(|e| {
                InferenceError::Request(RequestError::InvalidParameter {
                    parameter: "document".to_string(),
                    message: format!("Invalid JSON: {}", e),
                })
            })
    }

    /// Convert back to a JSON value.
    pub fn to_value(&self) -> Value {
        match self {
            Document::Null => Value::Null,
            Document::Bool(b) => Value::Bool(*b),
            Document::Number(n) => n.to_json(),
            Document::String(s) => Value::String(s.clone()),
            Document::List(items) => Value::Array(items.iter().map(Self::to_value).collect()),
            Document::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_value()))
                    .collect(),
            ),
        }
    }

    /// The string value, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Document::String(s) => Some(s),
            _ => None,
        }
    }

    /// The map, if this is an object.
    pub fn as_object(&self) -> Option<&BTreeMap<String, Document>> {
        match self {
            Document::Object(map) => Some(map),
            _ => None,
        }
    }

    /// The items, if this is a list.
    pub fn as_list(&self) -> Option<&[Document]> {
        match self {
            Document::List(items) => Some(items),
            _ => None,
        }
    }

    /// Look up a key in an object.
    pub fn get(&self, key: &str) -> Option<&Document> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// Whether this is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Document::Null)
    }
}

impl std::fmt::Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_value())
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Document::Null => serializer.serialize_unit(),
            Document::Bool(b) => serializer.serialize_bool(*b),
            Document::Number(Number::PosInt(v)) => serializer.serialize_u64(*v),
            Document::Number(Number::NegInt(v)) => serializer.serialize_i64(*v),
            Document::Number(Number::Float(v)) if v.is_finite() => serializer.serialize_f64(*v),
            Document::Number(Number::Float(_)) => serializer.serialize_unit(),
            Document::String(s) => serializer.serialize_str(s),
            Document::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Document::Object(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_value)
    }
}

impl From<Value> for Document {
    fn from(value: Value) -> Self {
        Self::from_value(value)
    }
}

impl From<&str> for Document {
    fn from(value: &str) -> Self {
        Document::String(value.to_string())
    }
}

impl From<String> for Document {
    fn from(value: String) -> Self {
        Document::String(value)
    }
}

impl From<bool> for Document {
    fn from(value: bool) -> Self {
        Document::Bool(value)
    }
}

impl From<u64> for Document {
    fn from(value: u64) -> Self {
        Document::Number(Number::PosInt(value))
    }
}

impl From<i64> for Document {
    fn from(value: i64) -> Self {
        if value >= 0 {
            Document::Number(Number::PosInt(value as u64))
        } else {
            Document::Number(Number::NegInt(value))
        }
    }
}

impl From<f64> for Document {
    fn from(value: f64) -> Self {
        Document::Number(Number::Float(value))
    }
}

impl From<Vec<Document>> for Document {
    fn from(items: Vec<Document>) -> Self {
        Document::List(items)
    }
}

impl From<BTreeMap<String, Document>> for Document {
    fn from(map: BTreeMap<String, Document>) -> Self {
        Document::Object(map)
    }
}
