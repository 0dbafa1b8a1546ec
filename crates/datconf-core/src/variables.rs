//! Variable declarations and resolution
//!
//! A `variable "name" { default = ... }` block declares a variable. The
//! resolver picks, for each declaration, the override from the values file
//! if there is one, otherwise the evaluated default. A variable with neither
//! is simply left out; any expression that later references it fails with
//! an undefined-variable diagnostic.

use hcl::{Block, Expression, Structure};
use indexmap::IndexMap;

use crate::context::EvaluationContext;
use crate::error::{Diagnostics, Error, Outcome};
use crate::value::Value;
use crate::values::Overrides;

/// Final variable values keyed by name, in declaration order
pub type ResolvedVariables = IndexMap<String, Value>;

/// A declared variable
#[derive(Debug, Clone)]
pub struct VariableDeclaration {
    pub name: String,
    pub default: Option<Expression>,
    pub description: Option<String>,
    /// File the declaration came from
    pub origin: String,
}

impl VariableDeclaration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
            description: None,
            origin: String::new(),
        }
    }

    pub fn with_default(mut self, default: Expression) -> Self {
        self.default = Some(default);
        self
    }

    /// Decode a `variable` block whose label has already been checked
    ///
    /// Only `default` and `description` are accepted in the body.
    pub fn from_block(name: &str, block: &Block, origin: &str) -> Result<Self, Diagnostics> {
        let path = format!("variable.{}", name);
        let mut decl = Self {
            name: name.to_string(),
            default: None,
            description: None,
            origin: origin.to_string(),
        };
        let mut diagnostics = Diagnostics::new();

        for structure in block.body.iter() {
            match structure {
                Structure::Attribute(attr) => match attr.key.as_str() {
                    "default" => decl.default = Some(attr.expr.clone()),
                    "description" => {
                        let attr_path = format!("{}.description", path);
                        match EvaluationContext::empty().evaluate(&attr.expr, &attr_path) {
                            Ok(Value::String(s)) => decl.description = Some(s),
                            Ok(other) => diagnostics.push(
                                Error::type_mismatch(&path, "description", "a string", other.type_name())
                                    .in_file(origin),
                            ),
                            Err(errors) => {
                                diagnostics.extend(errors.into_iter().map(|e| e.in_file(origin)))
                            }
                        }
                    }
                    other => {
                        diagnostics.push(Error::unsupported_attribute(&path, other).in_file(origin))
                    }
                },
                Structure::Block(nested) => diagnostics.push(
                    Error::unsupported_block(&path, nested.identifier.as_str()).in_file(origin),
                ),
            }
        }

        diagnostics.into_result(decl)
    }
}

/// Resolve every declaration against the overrides
///
/// Defaults are evaluated with an empty context, so defaults cannot refer to
/// other variables. Failures are collected for all declarations.
pub fn resolve_variables(
    declarations: &[VariableDeclaration],
    overrides: &Overrides,
) -> Outcome<ResolvedVariables> {
    let mut resolved = ResolvedVariables::new();
    let mut diagnostics = Diagnostics::new();
    let empty = EvaluationContext::empty();

    for decl in declarations {
        if let Some(value) = overrides.get(&decl.name) {
            log::debug!("variable '{}' set from values file", decl.name);
            resolved.insert(decl.name.clone(), value.clone());
            continue;
        }

        let Some(default) = &decl.default else {
            log::debug!("variable '{}' has no value", decl.name);
            continue;
        };

        let path = format!("variable.{}.default", decl.name);
        match empty.evaluate(default, &path) {
            Ok(value) => {
                resolved.insert(decl.name.clone(), value);
            }
            Err(errors) => {
                let origin = decl.origin.as_str();
                diagnostics.extend(errors.into_iter().map(|e| {
                    if origin.is_empty() {
                        e
                    } else {
                        e.in_file(origin)
                    }
                }));
            }
        }
    }

    for name in overrides.keys() {
        if !declarations.iter().any(|d| &d.name == name) {
            log::warn!("value '{}' does not match any declared variable; ignoring it", name);
        }
    }

    Outcome::new(resolved, diagnostics)
}
