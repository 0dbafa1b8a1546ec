//! Built-in component types

use serde::Deserialize;

use crate::component::{Component, ComponentConfig, ComponentRegistry};
use crate::error::{Error, Result};

/// `component "foo" { foo = "..." }`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FooComponentConfig {
    pub foo: Option<String>,
}

impl ComponentConfig for FooComponentConfig {
    fn describe(&self) -> String {
        match &self.foo {
            Some(foo) => format!("Foo: {}", foo),
            None => "Foo: (unset)".to_string(),
        }
    }
}

impl Component for FooComponentConfig {
    const TYPE_NAME: &'static str = "foo";

    fn shape() -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "foo": {"type": "string"}
            },
            "additionalProperties": false
        })
    }
}

/// `component "bar" { bar = "..." }`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BarComponentConfig {
    pub bar: String,
}

impl ComponentConfig for BarComponentConfig {
    fn describe(&self) -> String {
        format!("Bar: {}", self.bar)
    }

    fn validate(&self) -> Result<()> {
        if self.bar.trim().is_empty() {
            return Err(Error::validation("", "bar must not be empty"));
        }
        Ok(())
    }
}

impl Component for BarComponentConfig {
    const TYPE_NAME: &'static str = "bar";

    fn shape() -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "required": ["bar"],
            "properties": {
                "bar": {"type": "string"}
            },
            "additionalProperties": false
        })
    }
}

pub(crate) fn register_builtins(registry: &mut ComponentRegistry) {
    registry
        .register_type::<FooComponentConfig>()
        .expect("foo component shape is valid");
    registry
        .register_type::<BarComponentConfig>()
        .expect("bar component shape is valid");
}
