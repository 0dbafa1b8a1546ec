//! Configuration value types
//!
//! Represents evaluated configuration values. Values can be scalars
//! (string, int, float, bool, null), sequences (arrays), or mappings
//! (objects). They are what variables resolve to and what block bodies
//! evaluate into before being decoded into typed configs.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A fully evaluated configuration value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
#[derive(Default)]
pub enum Value {
    /// Null value
    #[default]
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Integer(i64),
    /// Floating point value
    Float(f64),
    /// String value
    String(String),
    /// Sequence of values
    Sequence(Vec<Value>),
    /// Mapping of string keys to values
    Mapping(IndexMap<String, Value>),
}

impl Value {
    /// Get as i64 if this is an Integer
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as str if this is a String
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as mapping if this is a Mapping
    pub fn as_mapping(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Get the type name of this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Sequence(_) => "sequence",
            Value::Mapping(_) => "mapping",
        }
    }

    /// Convert to the value model understood by the HCL evaluator
    pub fn to_hcl(&self) -> hcl::Value {
        match self {
            Value::Null => hcl::Value::Null,
            Value::Bool(b) => hcl::Value::Bool(*b),
            Value::Integer(i) => hcl::Value::Number(hcl::Number::from(*i)),
            Value::Float(f) => hcl::Number::from_f64(*f)
                .map(hcl::Value::Number)
                .unwrap_or(hcl::Value::Null),
            Value::String(s) => hcl::Value::String(s.clone()),
            Value::Sequence(seq) => hcl::Value::Array(seq.iter().map(Value::to_hcl).collect()),
            Value::Mapping(map) => hcl::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_hcl()))
                    .collect(),
            ),
        }
    }

    /// Convert to serde_json::Value for schema validation and typed decoding
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Integer(i) => serde_json::Value::Number((*i).into()),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Sequence(seq) => serde_json::Value::Array(seq.iter().map(Value::to_json).collect()),
            Value::Mapping(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl From<hcl::Value> for Value {
    fn from(value: hcl::Value) -> Self {
        match value {
            hcl::Value::Null => Value::Null,
            hcl::Value::Bool(b) => Value::Bool(b),
            hcl::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
            },
            hcl::Value::String(s) => Value::String(s),
            hcl::Value::Array(items) => Value::Sequence(items.into_iter().map(Value::from).collect()),
            hcl::Value::Object(map) => Value::Mapping(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::Sequence(seq) => {
                write!(f, "[")?;
                for (i, v) in seq.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
            Value::Mapping(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

// Convenient From implementations
impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Sequence(v.into_iter().map(Into::into).collect())
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(m: IndexMap<String, Value>) -> Self {
        Value::Mapping(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_hcl_scalars() {
        assert_eq!(Value::from(hcl::Value::Null), Value::Null);
        assert_eq!(Value::from(hcl::Value::Bool(true)), Value::Bool(true));
        assert_eq!(
            Value::from(hcl::Value::Number(hcl::Number::from(5i64))),
            Value::Integer(5)
        );
        assert_eq!(
            Value::from(hcl::Value::String("eu-west-1".into())),
            Value::String("eu-west-1".into())
        );
    }

    #[test]
    fn test_from_hcl_float() {
        let n = hcl::Number::from_f64(1.5).unwrap();
        assert_eq!(Value::from(hcl::Value::Number(n)), Value::Float(1.5));
    }

    #[test]
    fn test_nested_hcl_conversion_keeps_order() {
        let mut map = IndexMap::new();
        map.insert("zones".to_string(), Value::from(vec!["a", "b"]));
        map.insert("count".to_string(), Value::Integer(2));
        let value = Value::Mapping(map);

        let back = Value::from(value.to_hcl());
        assert_eq!(back, value);
        let keys: Vec<_> = back.as_mapping().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["zones".to_string(), "count".to_string()]);
    }

    #[test]
    fn test_to_json() {
        let mut map = IndexMap::new();
        map.insert("controller_count".to_string(), Value::Integer(3));
        map.insert("name".to_string(), Value::from("main"));

        let json = Value::Mapping(map).to_json();
        assert_eq!(
            json,
            serde_json::json!({"controller_count": 3, "name": "main"})
        );
    }

    #[test]
    fn test_type_name() {
        assert_eq!(Value::Integer(1).type_name(), "integer");
        assert_eq!(Value::from("x").type_name(), "string");
        assert_eq!(Value::Mapping(IndexMap::new()).type_name(), "mapping");
    }

    #[test]
    fn test_display() {
        let value = Value::from(vec![Value::Integer(1), Value::from("two")]);
        assert_eq!(value.to_string(), "[1, two]");
    }
}
