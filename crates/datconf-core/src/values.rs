//! Values file loading
//!
//! The values file (`dat.vars` by default) holds flat `name = value`
//! overrides for declared variables. It is not itself parameterized: every
//! expression is evaluated with an empty context, so a `var.*` reference is
//! an evaluation error. A missing file is the same as an empty one.

use std::path::Path;

use hcl::Structure;
use indexmap::IndexMap;

use crate::context::EvaluationContext;
use crate::document::parse_error;
use crate::error::{Diagnostics, Error, Outcome};
use crate::value::Value;

/// Default name of the values file
pub const DEFAULT_VALUES_FILE: &str = "dat.vars";

/// Variable overrides keyed by variable name, in file order
pub type Overrides = IndexMap<String, Value>;

/// Load overrides from `path`; a missing file yields an empty mapping
pub fn load_values(path: impl AsRef<Path>) -> Outcome<Overrides> {
    let path = path.as_ref();
    if !path.exists() {
        log::debug!("no values file at {}", path.display());
        return Outcome::ok(Overrides::new());
    }

    match std::fs::read_to_string(path) {
        Ok(content) => parse_values(&path.display().to_string(), &content),
        Err(e) => Outcome::new(
            Overrides::new(),
            Error::io(path.display().to_string(), e.to_string()).into(),
        ),
    }
}

/// Parse and evaluate a values source
///
/// Evaluation failures are collected per attribute; every other attribute
/// is still evaluated and returned.
pub fn parse_values(origin: &str, source: &str) -> Outcome<Overrides> {
    let mut overrides = Overrides::new();
    let mut diagnostics = Diagnostics::new();

    let body = match hcl::parse(source) {
        Ok(body) => body,
        Err(e) => return Outcome::new(overrides, parse_error(origin, e).into()),
    };

    let ctx = EvaluationContext::empty();
    for structure in body.iter() {
        match structure {
            Structure::Attribute(attr) => {
                let name = attr.key.as_str();
                if overrides.contains_key(name) {
                    diagnostics.push(Error::duplicate("value", name).in_file(origin));
                    continue;
                }
                match ctx.evaluate(&attr.expr, name) {
                    Ok(value) => {
                        overrides.insert(name.to_string(), value);
                    }
                    Err(errors) => {
                        diagnostics.extend(errors.into_iter().map(|e| e.in_file(origin)));
                    }
                }
            }
            Structure::Block(block) => {
                diagnostics.push(
                    Error::unsupported_block("", block.identifier.as_str())
                        .with_help("Blocks are not allowed in a values file; use `name = value`")
                        .in_file(origin),
                );
            }
        }
    }

    Outcome::new(overrides, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_flat_values() {
        let outcome = parse_values(
            "dat.vars",
            r#"
controller_count = 5
region = "eu-west-1"
zones = ["a", "b"]
"#,
        );

        assert!(outcome.is_ok());
        let values = outcome.value;
        assert_eq!(values.get("controller_count"), Some(&Value::Integer(5)));
        assert_eq!(values.get("region"), Some(&Value::from("eu-west-1")));
        assert_eq!(values.get("zones"), Some(&Value::from(vec!["a", "b"])));
    }

    #[test]
    fn test_pure_expressions_are_evaluated() {
        let outcome = parse_values("dat.vars", "workers = 2 * 4");
        assert_eq!(outcome.value.get("workers"), Some(&Value::Integer(8)));
    }

    #[test]
    fn test_variable_reference_fails_but_others_load() {
        let outcome = parse_values(
            "dat.vars",
            r#"
a = 1
b = var.a
c = "three"
"#,
        );

        assert_eq!(outcome.diagnostics.len(), 1);
        let err = outcome.diagnostics.iter().next().unwrap();
        assert!(matches!(err.kind, ErrorKind::Evaluation { .. }));
        assert_eq!(err.path.as_deref(), Some("b"));
        assert_eq!(err.source_location.as_ref().unwrap().file, "dat.vars");

        assert_eq!(outcome.value.len(), 2);
        assert!(outcome.value.contains_key("a"));
        assert!(outcome.value.contains_key("c"));
    }

    #[test]
    fn test_blocks_are_rejected() {
        let outcome = parse_values("dat.vars", "a = 1\nnested { b = 2 }\n");

        assert_eq!(outcome.value.get("a"), Some(&Value::Integer(1)));
        let err = outcome.diagnostics.iter().next().unwrap();
        assert_eq!(
            err.kind,
            ErrorKind::UnsupportedBlock {
                kind: "nested".into()
            }
        );
    }

    #[test]
    fn test_empty_source() {
        let outcome = parse_values("dat.vars", "");
        assert!(outcome.is_ok());
        assert!(outcome.value.is_empty());
    }

    #[test]
    fn test_syntax_error() {
        let outcome = parse_values("dat.vars", "a = 1\nb = ");
        assert_eq!(outcome.diagnostics.len(), 1);
        let err = outcome.diagnostics.iter().next().unwrap();
        assert_eq!(err.kind, ErrorKind::Parse);

        let location = err.source_location.as_ref().unwrap();
        assert_eq!(location.file, "dat.vars");
        assert_eq!(location.line, Some(2));
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = load_values(dir.path().join(DEFAULT_VALUES_FILE));
        assert!(outcome.is_ok());
        assert!(outcome.value.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_VALUES_FILE);
        std::fs::write(&path, "controller_count = 7\n").unwrap();

        let outcome = load_values(&path);
        assert!(outcome.is_ok());
        assert_eq!(outcome.value.get("controller_count"), Some(&Value::Integer(7)));
    }
}
