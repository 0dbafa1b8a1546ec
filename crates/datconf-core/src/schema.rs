//! Attribute shapes for block bodies
//!
//! Each decodable block (the cluster and every component type) describes
//! the attributes it accepts as a JSON Schema object. A body is evaluated
//! first and the resulting mapping is checked against the shape, so that
//! every missing, mistyped or unknown attribute is reported at once.

use std::sync::Arc;

use jsonschema::error::ValidationErrorKind;

use crate::error::{Diagnostics, Error, Result};
use crate::value::Value;

/// Compiled attribute shape for one kind of block
#[derive(Debug, Clone)]
pub struct Shape {
    /// The JSON Schema as a serde_json::Value
    schema: serde_json::Value,
    /// Compiled JSON Schema validator (wrapped in Arc for Clone)
    compiled: Arc<jsonschema::Validator>,
}

impl Shape {
    /// Compile a shape from a JSON Schema describing an object
    pub fn new(schema: serde_json::Value) -> Result<Self> {
        let compiled = jsonschema::validator_for(&schema)
            .map_err(|e| Error::internal(format!("Invalid attribute shape: {}", e)))?;
        Ok(Self {
            schema,
            compiled: Arc::new(compiled),
        })
    }

    /// Shape of a block that accepts no attributes
    pub fn empty() -> Self {
        Self::new(serde_json::json!({
            "type": "object",
            "additionalProperties": false
        }))
        .expect("the empty shape is a valid schema")
    }

    /// Check evaluated attributes, collecting every violation
    pub fn check(&self, block_path: &str, attributes: &Value) -> Diagnostics {
        let json_value = attributes.to_json();

        self.compiled
            .iter_errors(&json_value)
            .flat_map(|e| {
                let pointer = e.instance_path.to_string();
                let attribute = pointer
                    .trim_start_matches('/')
                    .split('/')
                    .next()
                    .unwrap_or_default()
                    .to_string();

                match &e.kind {
                    ValidationErrorKind::Required { property } => {
                        let name = property
                            .as_str()
                            .map(str::to_string)
                            .unwrap_or_else(|| property.to_string());
                        vec![Error::missing_attribute(block_path, name)]
                    }
                    ValidationErrorKind::AdditionalProperties { unexpected } => unexpected
                        .iter()
                        .map(|name| Error::unsupported_attribute(block_path, name.as_str()))
                        .collect(),
                    ValidationErrorKind::Type { .. } => vec![Error::type_mismatch(
                        block_path,
                        attribute.as_str(),
                        self.expected_type(&attribute),
                        json_type_name(&e.instance),
                    )],
                    _ => {
                        let path = if attribute.is_empty() {
                            block_path.to_string()
                        } else {
                            format!("{}.{}", block_path, attribute)
                        };
                        vec![Error::validation(path, e.to_string())]
                    }
                }
            })
            .collect()
    }

    /// Names of the attributes this shape declares
    pub fn attribute_names(&self) -> Vec<&str> {
        self.schema
            .get("properties")
            .and_then(|p| p.as_object())
            .map(|p| p.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Names of the attributes this shape requires
    pub fn required(&self) -> Vec<&str> {
        self.schema
            .get("required")
            .and_then(|r| r.as_array())
            .map(|r| r.iter().filter_map(|v| v.as_str()).collect())
            .unwrap_or_default()
    }

    /// Names of the declared attributes that may be left out
    pub fn optional(&self) -> Vec<&str> {
        let required = self.required();
        self.attribute_names()
            .into_iter()
            .filter(|name| !required.contains(name))
            .collect()
    }

    /// Convert primitive attribute values to the type the shape declares
    ///
    /// Numbers and booleans become strings where a string is expected, and
    /// strings holding a number or boolean become that type where one is
    /// expected. Anything that does not convert is left for [`Shape::check`]
    /// to report.
    pub fn coerce(&self, attributes: &Value) -> Value {
        let Some(map) = attributes.as_mapping() else {
            return attributes.clone();
        };

        Value::Mapping(
            map.iter()
                .map(|(name, value)| {
                    let converted = match self.declared_type(name) {
                        Some(target) => convert(value, target),
                        None => value.clone(),
                    };
                    (name.clone(), converted)
                })
                .collect(),
        )
    }

    fn declared_type(&self, attribute: &str) -> Option<&str> {
        self.schema
            .get("properties")?
            .get(attribute)?
            .get("type")?
            .as_str()
    }

    fn expected_type(&self, attribute: &str) -> String {
        match self
            .schema
            .get("properties")
            .and_then(|p| p.get(attribute))
            .and_then(|p| p.get("type"))
        {
            Some(serde_json::Value::String(t)) => article(t),
            Some(serde_json::Value::Array(types)) => types
                .iter()
                .filter_map(|t| t.as_str())
                .map(article)
                .collect::<Vec<_>>()
                .join(" or "),
            _ => "a different type".to_string(),
        }
    }
}

fn convert(value: &Value, target: &str) -> Value {
    let converted = match (target, value) {
        ("string", Value::Integer(_) | Value::Float(_) | Value::Bool(_)) => {
            Some(Value::String(value.to_string()))
        }
        ("integer", Value::String(s)) => s.trim().parse::<i64>().ok().map(Value::Integer),
        ("integer", Value::Float(f)) if f.fract() == 0.0 => Some(Value::Integer(*f as i64)),
        ("number", Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .map(Value::Integer)
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(Value::Float))
        }
        ("boolean", Value::String(s)) => match s.as_str() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        _ => None,
    };
    converted.unwrap_or_else(|| value.clone())
}

fn article(type_name: &str) -> String {
    match type_name {
        "integer" => "an integer".to_string(),
        "object" => "an object".to_string(),
        "array" => "an array".to_string(),
        "null" => "null".to_string(),
        other => format!("a {}", other),
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        serde_json::Value::Number(_) => "float",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "sequence",
        serde_json::Value::Object(_) => "mapping",
    }
}
