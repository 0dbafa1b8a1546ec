//! Top-level structure of the merged configuration
//!
//! The merged body may contain exactly one `cluster` block, any number of
//! `component` blocks and any number of `variable` blocks, each with a
//! single label. Nothing is evaluated here; block bodies are kept for the
//! later stages that have an evaluation context.

use std::collections::HashSet;

use hcl::Block;

use crate::cluster::ClusterSpec;
use crate::component::ComponentSpec;
use crate::document::MergedBody;
use crate::error::{Diagnostics, Error};
use crate::variables::VariableDeclaration;

const CLUSTER: &str = "cluster";
const COMPONENT: &str = "component";
const VARIABLE: &str = "variable";

/// The declared blocks of a configuration, in file order
#[derive(Debug, Clone)]
pub struct ConfigRoot {
    pub cluster: ClusterSpec,
    pub components: Vec<ComponentSpec>,
    pub variables: Vec<VariableDeclaration>,
}

impl ConfigRoot {
    /// Split the merged body into cluster, components and variables
    ///
    /// Every structural problem is collected before returning.
    pub fn decode(body: &MergedBody) -> Result<Self, Diagnostics> {
        let mut diagnostics = Diagnostics::new();
        let mut clusters = Vec::new();
        let mut components = Vec::new();
        let mut variables: Vec<VariableDeclaration> = Vec::new();
        let mut variable_names = HashSet::new();

        for attr in body.attributes() {
            diagnostics.push(Error::unsupported_attribute("", attr.item.key.as_str()).in_file(&attr.origin));
        }

        for block in body.blocks() {
            let origin: &str = &block.origin;
            let kind = block.item.identifier.as_str();

            let label = match kind {
                CLUSTER | COMPONENT | VARIABLE => match single_label(block.item) {
                    Some(label) => label,
                    None => {
                        diagnostics.push(Error::invalid_labels(kind, block.item.labels.len()).in_file(origin));
                        continue;
                    }
                },
                other => {
                    diagnostics.push(Error::unsupported_block("", other).in_file(origin));
                    continue;
                }
            };

            match kind {
                CLUSTER => clusters.push(ClusterSpec {
                    name: label.to_string(),
                    body: block.item.body.clone(),
                    origin: origin.to_string(),
                }),
                COMPONENT => components.push(ComponentSpec {
                    type_name: label.to_string(),
                    body: block.item.body.clone(),
                    origin: origin.to_string(),
                }),
                _ => {
                    if !variable_names.insert(label.to_string()) {
                        diagnostics.push(Error::duplicate(VARIABLE, label).in_file(origin));
                        continue;
                    }
                    match VariableDeclaration::from_block(label, block.item, origin) {
                        Ok(decl) => variables.push(decl),
                        Err(errors) => diagnostics.extend(errors),
                    }
                }
            }
        }

        let mut clusters = clusters.into_iter();
        let cluster = clusters.next();
        for extra in clusters {
            diagnostics.push(
                Error::duplicate(CLUSTER, &extra.name)
                    .with_help("Exactly one `cluster` block is allowed across all configuration files")
                    .in_file(&extra.origin),
            );
        }

        match cluster {
            Some(cluster) if diagnostics.is_empty() => Ok(Self {
                cluster,
                components,
                variables,
            }),
            Some(_) => Err(diagnostics),
            None => {
                diagnostics.push(Error::missing_block(CLUSTER));
                Err(diagnostics)
            }
        }
    }
}

fn single_label(block: &Block) -> Option<&str> {
    match block.labels.as_slice() {
        [label] => Some(label.as_str()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;

    fn merged(files: &[(&str, &str)]) -> MergedBody {
        MergedBody::merge(
            files
                .iter()
                .map(|(name, src)| Document::parse(*name, src).unwrap()),
        )
    }

    fn kinds(diags: &Diagnostics) -> Vec<ErrorKind> {
        diags.iter().map(|e| e.kind.clone()).collect()
    }

    #[test]
    fn test_decode_root_across_files() {
        let body = merged(&[
            (
                "a.datcfg",
                r#"
variable "controller_count" { default = 3 }
cluster "main" { controller_count = var.controller_count }
"#,
            ),
            (
                "b.datcfg",
                r#"
component "foo" { foo = "x" }
component "bar" { bar = "y" }
variable "region" {}
"#,
            ),
        ]);

        let root = ConfigRoot::decode(&body).unwrap();
        assert_eq!(root.cluster.name, "main");
        assert_eq!(root.cluster.origin, "a.datcfg");

        let types: Vec<_> = root.components.iter().map(|c| c.type_name.as_str()).collect();
        assert_eq!(types, vec!["foo", "bar"]);
        assert_eq!(root.components[1].origin, "b.datcfg");

        let names: Vec<_> = root.variables.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["controller_count", "region"]);
        assert!(root.variables[1].default.is_none());
    }

    #[test]
    fn test_missing_cluster() {
        let diags = ConfigRoot::decode(&merged(&[("a.datcfg", r#"component "foo" {}"#)])).unwrap_err();
        assert_eq!(
            kinds(&diags),
            vec![ErrorKind::MissingBlock {
                kind: "cluster".into()
            }]
        );
    }

    #[test]
    fn test_two_clusters_across_files_is_an_error() {
        let diags = ConfigRoot::decode(&merged(&[
            ("a.datcfg", r#"cluster "one" {}"#),
            ("b.datcfg", r#"cluster "two" {}"#),
        ]))
        .unwrap_err();

        assert_eq!(diags.len(), 1);
        let err = diags.iter().next().unwrap();
        assert_eq!(
            err.kind,
            ErrorKind::DuplicateDeclaration {
                kind: "cluster".into(),
                name: "two".into()
            }
        );
        assert_eq!(err.source_location.as_ref().unwrap().file, "b.datcfg");
    }

    #[test]
    fn test_duplicate_variable_is_an_error() {
        let diags = ConfigRoot::decode(&merged(&[
            ("a.datcfg", "cluster \"c\" {}\nvariable \"x\" { default = 1 }"),
            ("b.datcfg", r#"variable "x" { default = 2 }"#),
        ]))
        .unwrap_err();

        assert_eq!(
            kinds(&diags),
            vec![ErrorKind::DuplicateDeclaration {
                kind: "variable".into(),
                name: "x".into()
            }]
        );
    }

    #[test]
    fn test_structural_errors_are_collected() {
        let diags = ConfigRoot::decode(&merged(&[(
            "a.datcfg",
            r#"
stray = 1
cluster {}
module "m" {}
component "foo" "extra" {}
"#,
        )]))
        .unwrap_err();

        assert_eq!(
            kinds(&diags),
            vec![
                ErrorKind::UnsupportedAttribute {
                    attribute: "stray".into()
                },
                ErrorKind::InvalidLabels {
                    kind: "cluster".into()
                },
                ErrorKind::UnsupportedBlock {
                    kind: "module".into()
                },
                ErrorKind::InvalidLabels {
                    kind: "component".into()
                },
                ErrorKind::MissingBlock {
                    kind: "cluster".into()
                },
            ]
        );
    }

    #[test]
    fn test_merge_order_does_not_matter_without_conflicts() {
        let a = ("a.datcfg", r#"cluster "main" { worker_count = 1 }"#);
        let b = ("b.datcfg", "variable \"v\" { default = 1 }");

        let ab = ConfigRoot::decode(&merged(&[a, b])).unwrap();
        let ba = ConfigRoot::decode(&merged(&[b, a])).unwrap();
        assert_eq!(ab.cluster.name, ba.cluster.name);
        assert_eq!(ab.cluster.body, ba.cluster.body);
        assert_eq!(ab.variables.len(), ba.variables.len());
    }
}
