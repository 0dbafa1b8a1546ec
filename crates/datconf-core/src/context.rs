//! Evaluation context shared by every decode in a resolution pass
//!
//! The context exposes resolved variables under the reserved `var`
//! namespace, so `var.controller_count` or `"${var.region}"` evaluate to the
//! value chosen by the variable resolver. It is built once per pass and
//! never modified afterwards.

use std::fmt;

use hcl::eval::{Context, Evaluate};
use hcl::Expression;
use indexmap::IndexMap;

use crate::error::Error;
use crate::value::Value;
use crate::variables::ResolvedVariables;

/// Namespace under which resolved variables are visible to expressions
pub const VAR_NAMESPACE: &str = "var";

/// Immutable snapshot of the values visible to expressions
pub struct EvaluationContext {
    namespaces: IndexMap<String, IndexMap<String, Value>>,
    inner: Context<'static>,
}

impl EvaluationContext {
    /// A context with nothing in scope
    ///
    /// Used for the values file and for variable defaults, neither of which
    /// may reference variables.
    pub fn empty() -> Self {
        Self {
            namespaces: IndexMap::new(),
            inner: Context::new(),
        }
    }

    /// Expose `variables` under the `var` namespace
    pub fn build(variables: &ResolvedVariables) -> Self {
        let vars: IndexMap<String, Value> = variables
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        let object: hcl::Map<String, hcl::Value> = vars
            .iter()
            .map(|(name, value)| (name.clone(), value.to_hcl()))
            .collect();

        let mut inner = Context::new();
        inner.declare_var(VAR_NAMESPACE, hcl::Value::Object(object));

        let mut namespaces = IndexMap::new();
        namespaces.insert(VAR_NAMESPACE.to_string(), vars);

        Self { namespaces, inner }
    }

    /// Look up a value by namespace and name
    pub fn get(&self, namespace: &str, name: &str) -> Option<&Value> {
        self.namespaces.get(namespace)?.get(name)
    }

    /// The variables visible under `var`, if any were declared
    pub fn variables(&self) -> Option<&IndexMap<String, Value>> {
        self.namespaces.get(VAR_NAMESPACE)
    }

    /// Evaluate an expression, turning an evaluator error into a diagnostic for `path`
    pub fn evaluate(&self, expr: &Expression, path: &str) -> Result<Value, Vec<Error>> {
        log::trace!("evaluating {}", path);
        expr.evaluate(&self.inner)
            .map(Value::from)
            .map_err(|e| vec![self.evaluation_error(&e, path)])
    }

    fn evaluation_error(&self, err: &hcl::eval::Error, path: &str) -> Error {
        let message = err.to_string();
        match err.kind() {
            hcl::eval::ErrorKind::NoSuchKey(key) if self.is_missing_variable(key) => {
                Error::evaluation(path, message, Some(key.to_string()))
            }
            hcl::eval::ErrorKind::UndefinedVar(ident) if ident.as_str() == VAR_NAMESPACE => {
                Error::evaluation(path, message, None).with_help(
                    "Variables cannot be referenced in the values file or in variable defaults",
                )
            }
            hcl::eval::ErrorKind::UndefinedVar(ident) => Error::evaluation(path, message, None)
                .with_help(format!(
                    "`{}` is not defined; variables are referenced as `var.{}`",
                    ident, ident
                )),
            _ => Error::evaluation(path, message, None),
        }
    }

    /// A missing key on the `var` object means an unresolved variable
    fn is_missing_variable(&self, key: &str) -> bool {
        self.variables()
            .is_some_and(|vars| !vars.contains_key(key))
    }
}

impl Default for EvaluationContext {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for EvaluationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluationContext")
            .field("namespaces", &self.namespaces)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn expr(src: &str) -> Expression {
        let body = hcl::parse(&format!("v = {}", src)).unwrap();
        body.attributes().next().unwrap().expr.clone()
    }

    fn vars(pairs: &[(&str, Value)]) -> ResolvedVariables {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_build_exposes_var_namespace() {
        let ctx = EvaluationContext::build(&vars(&[("controller_count", Value::Integer(3))]));

        assert_eq!(
            ctx.get(VAR_NAMESPACE, "controller_count"),
            Some(&Value::Integer(3))
        );
        assert_eq!(
            ctx.evaluate(&expr("var.controller_count"), "cluster.main.controller_count")
                .unwrap(),
            Value::Integer(3)
        );
    }

    #[test]
    fn test_template_interpolation() {
        let ctx = EvaluationContext::build(&vars(&[("region", Value::from("eu"))]));
        let value = ctx
            .evaluate(&expr(r#""zone-${var.region}""#), "component.foo.foo")
            .unwrap();
        assert_eq!(value, Value::from("zone-eu"));
    }

    #[test]
    fn test_undefined_variable_is_reported() {
        let ctx = EvaluationContext::build(&ResolvedVariables::new());
        let errors = ctx
            .evaluate(&expr(r#""${var.x}""#), "component.foo.foo")
            .unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].kind,
            ErrorKind::Evaluation {
                variable: Some("x".into())
            }
        );
        assert_eq!(errors[0].path.as_deref(), Some("component.foo.foo"));
    }

    #[test]
    fn test_empty_context_rejects_variables() {
        let ctx = EvaluationContext::empty();
        assert!(ctx.variables().is_none());

        let errors = ctx.evaluate(&expr("var.x"), "x").unwrap_err();
        assert_eq!(errors[0].kind, ErrorKind::Evaluation { variable: None });
        assert!(errors[0]
            .help
            .as_deref()
            .unwrap()
            .contains("cannot be referenced"));
    }

    #[test]
    fn test_bare_identifier_is_not_a_missing_variable() {
        let ctx = EvaluationContext::build(&vars(&[("region", Value::from("eu"))]));
        let errors = ctx.evaluate(&expr("region"), "component.foo.foo").unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::Evaluation { variable: None });
        assert!(errors[0].help.as_deref().unwrap().contains("var.region"));
    }

    #[test]
    fn test_declared_variable_is_never_reported_missing() {
        let mut settings = IndexMap::new();
        settings.insert("zone".to_string(), Value::from("a"));
        let ctx = EvaluationContext::build(&vars(&[
            ("region", Value::from("eu")),
            ("settings", Value::Mapping(settings)),
        ]));
        let errors = ctx
            .evaluate(&expr("var.settings.region"), "component.foo.foo")
            .unwrap_err();

        assert_eq!(errors[0].kind, ErrorKind::Evaluation { variable: None });
    }

    #[test]
    fn test_empty_context_evaluates_literals() {
        let ctx = EvaluationContext::empty();
        assert_eq!(ctx.evaluate(&expr("2 + 3"), "x").unwrap(), Value::Integer(5));
    }
}
