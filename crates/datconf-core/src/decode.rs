//! Decoding block bodies into typed configs
//!
//! Decoding runs in three steps, each collecting every problem before
//! failing: evaluate all attributes against the context, convert and check
//! the resulting mapping against the block's [`Shape`], then build the typed
//! value through serde.

use hcl::{Body, Structure};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;

use crate::context::EvaluationContext;
use crate::error::{Diagnostics, Error};
use crate::schema::Shape;
use crate::value::Value;

/// Evaluate every attribute of a flat body
///
/// Nested blocks are not part of any decodable shape and are reported as
/// unsupported.
pub fn evaluate_body(
    body: &Body,
    ctx: &EvaluationContext,
    block_path: &str,
) -> Result<Value, Diagnostics> {
    let mut attributes = IndexMap::new();
    let mut diagnostics = Diagnostics::new();

    for structure in body.iter() {
        match structure {
            Structure::Attribute(attr) => {
                let name = attr.key.as_str();
                if attributes.contains_key(name) {
                    diagnostics.push(
                        Error::duplicate("attribute", name)
                            .with_path(format!("{}.{}", block_path, name)),
                    );
                    continue;
                }
                match ctx.evaluate(&attr.expr, &format!("{}.{}", block_path, name)) {
                    Ok(value) => {
                        attributes.insert(name.to_string(), value);
                    }
                    Err(errors) => diagnostics.extend(errors),
                }
            }
            Structure::Block(block) => {
                diagnostics.push(Error::unsupported_block(block_path, block.identifier.as_str()));
            }
        }
    }

    diagnostics.into_result(Value::Mapping(attributes))
}

/// Evaluate, check and deserialize a body into `T`
///
/// Returns the typed value together with the evaluated attributes.
pub fn decode_body<T: DeserializeOwned>(
    body: &Body,
    ctx: &EvaluationContext,
    shape: &Shape,
    block_path: &str,
) -> Result<(T, Value), Diagnostics> {
    let attributes = shape.coerce(&evaluate_body(body, ctx, block_path)?);
    let typed = build(shape, &attributes, block_path)?;
    Ok((typed, attributes))
}

/// Check evaluated attributes against `shape` and deserialize them
pub fn build<T: DeserializeOwned>(
    shape: &Shape,
    attributes: &Value,
    block_path: &str,
) -> Result<T, Diagnostics> {
    shape.check(block_path, attributes).into_result(())?;

    serde_json::from_value(attributes.to_json())
        .map_err(|e| Error::validation(block_path, e.to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::variables::ResolvedVariables;
    use pretty_assertions::assert_eq;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Panel {
        width: i64,
        label: Option<String>,
    }

    fn shape() -> Shape {
        Shape::new(serde_json::json!({
            "type": "object",
            "required": ["width"],
            "properties": {
                "width": {"type": "integer"},
                "label": {"type": "string"}
            },
            "additionalProperties": false
        }))
        .unwrap()
    }

    fn body(src: &str) -> Body {
        hcl::parse(src).unwrap()
    }

    fn ctx() -> EvaluationContext {
        let mut vars = ResolvedVariables::new();
        vars.insert("w".into(), Value::Integer(4));
        EvaluationContext::build(&vars)
    }

    #[test]
    fn test_decode_with_variables() {
        let (typed, attributes): (Panel, Value) = decode_body(
            &body("width = var.w * 2\nlabel = \"w${var.w}\""),
            &ctx(),
            &shape(),
            "component.sized",
        )
        .unwrap();

        assert_eq!(
            typed,
            Panel {
                width: 8,
                label: Some("w4".into())
            }
        );
        assert_eq!(
            attributes.as_mapping().unwrap().get("width"),
            Some(&Value::Integer(8))
        );
    }

    #[test]
    fn test_interpolated_values_take_the_declared_type() {
        let (typed, attributes): (Panel, Value) = decode_body(
            &body("width = \"${var.w}\"\nlabel = var.w"),
            &ctx(),
            &shape(),
            "component.sized",
        )
        .unwrap();

        assert_eq!(
            typed,
            Panel {
                width: 4,
                label: Some("4".into())
            }
        );
        assert_eq!(
            attributes.as_mapping().unwrap().get("label"),
            Some(&Value::from("4"))
        );
    }

    #[test]
    fn test_optional_attribute_may_be_absent() {
        let (typed, _): (Panel, Value) =
            decode_body(&body("width = 1"), &ctx(), &shape(), "component.sized").unwrap();
        assert_eq!(typed.label, None);
    }

    #[test]
    fn test_evaluation_errors_are_collected() {
        let diags = decode_body::<Panel>(
            &body("width = var.missing\nlabel = var.other"),
            &ctx(),
            &shape(),
            "component.sized",
        )
        .unwrap_err();

        let paths: Vec<_> = diags.iter().filter_map(|e| e.path.clone()).collect();
        assert!(paths.contains(&"component.sized.width".to_string()));
        assert!(paths.contains(&"component.sized.label".to_string()));
    }

    #[test]
    fn test_shape_violations_reported_after_evaluation() {
        let diags = decode_body::<Panel>(
            &body("label = 3"),
            &ctx(),
            &shape(),
            "component.sized",
        )
        .unwrap_err();

        let kinds: Vec<_> = diags.iter().map(|e| e.kind.clone()).collect();
        assert!(kinds.contains(&ErrorKind::MissingRequiredAttribute {
            attribute: "width".into()
        }));
        assert!(kinds
            .iter()
            .any(|k| matches!(k, ErrorKind::TypeMismatch { attribute, .. } if attribute == "label")));
    }

    #[test]
    fn test_nested_blocks_are_unsupported() {
        let diags = evaluate_body(&body("width = 1\ninner {}"), &ctx(), "component.sized")
            .unwrap_err();
        assert_eq!(
            diags.iter().next().unwrap().kind,
            ErrorKind::UnsupportedBlock {
                kind: "inner".into()
            }
        );
    }
}
