//! Configuration documents and the merged body
//!
//! A [`Document`] is one parsed `.datcfg` file. Several documents are merged
//! into a [`MergedBody`], a read-only view that answers block and attribute
//! queries as though every file had been concatenated in the order supplied.
//! The merge never fails; structural problems surface later while decoding.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use hcl::{Attribute, Block, Body, Structure};

use crate::error::{Diagnostics, Error, Result, SourceLocation};

/// Default glob pattern for configuration files
pub const DEFAULT_PATTERN: &str = "*.datcfg";

/// A single parsed configuration source
#[derive(Debug, Clone)]
pub struct Document {
    origin: Arc<str>,
    body: Body,
}

impl Document {
    /// Parse HCL source text. `origin` names the source in diagnostics.
    pub fn parse(origin: impl Into<String>, source: &str) -> Result<Self> {
        let origin: String = origin.into();
        let body = hcl::parse(source).map_err(|e| parse_error(&origin, e))?;
        Ok(Self {
            origin: Arc::from(origin),
            body,
        })
    }

    /// Read and parse a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::io(path.display().to_string(), e.to_string()))?;
        Self::parse(path.display().to_string(), &content)
    }

    /// Name of the source this document was parsed from
    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn body(&self) -> &Body {
        &self.body
    }
}

/// Turn an HCL parse error into a diagnostic pointing at `origin`
pub(crate) fn parse_error(origin: &str, err: hcl::Error) -> Error {
    let mut location = SourceLocation::file(origin);
    if let hcl::Error::Parse(parse) = &err {
        location.line = Some(parse.location().line());
        location.column = Some(parse.location().column());
    }
    Error::parse(err.to_string()).with_source_location(location)
}

/// Parse every file, collecting all parse errors instead of stopping at the first
pub fn parse_all<P: AsRef<Path>>(paths: &[P]) -> std::result::Result<Vec<Document>, Diagnostics> {
    let mut documents = Vec::with_capacity(paths.len());
    let mut diagnostics = Diagnostics::new();

    for path in paths {
        match Document::load(path) {
            Ok(doc) => documents.push(doc),
            Err(e) => diagnostics.push(e),
        }
    }

    diagnostics.into_result(documents)
}

/// Find configuration files matching `pattern` inside `base_dir`
///
/// Paths are returned in lexicographic order so that merging is deterministic.
pub fn discover(base_dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let full_pattern = base_dir.join(pattern);
    let full_pattern = full_pattern.to_string_lossy();

    let entries = glob::glob(&full_pattern)
        .map_err(|e| Error::io(full_pattern.to_string(), format!("Invalid glob pattern: {}", e)))?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| Error::io(e.path().display().to_string(), e.to_string()))?;
        if path.is_file() {
            log::debug!("discovered configuration file {}", path.display());
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// A top-level structure together with the file it came from
#[derive(Debug, Clone)]
pub struct Sourced<T> {
    pub origin: Arc<str>,
    pub item: T,
}

/// Read-only view over the top-level structures of several documents
#[derive(Debug, Clone, Default)]
pub struct MergedBody {
    structures: Vec<Sourced<Structure>>,
}

impl MergedBody {
    /// Merge documents in the order given
    pub fn merge(documents: impl IntoIterator<Item = Document>) -> Self {
        let structures = documents
            .into_iter()
            .flat_map(|doc| {
                let origin = doc.origin;
                doc.body.into_inner().into_iter().map(move |item| Sourced {
                    origin: Arc::clone(&origin),
                    item,
                })
            })
            .collect();
        Self { structures }
    }

    /// Every top-level attribute across all files
    pub fn attributes(&self) -> impl Iterator<Item = Sourced<&Attribute>> {
        self.structures.iter().filter_map(|s| match &s.item {
            Structure::Attribute(attr) => Some(Sourced {
                origin: Arc::clone(&s.origin),
                item: attr,
            }),
            Structure::Block(_) => None,
        })
    }

    /// Every top-level block across all files, in file order
    pub fn blocks(&self) -> impl Iterator<Item = Sourced<&Block>> {
        self.structures.iter().filter_map(|s| match &s.item {
            Structure::Block(block) => Some(Sourced {
                origin: Arc::clone(&s.origin),
                item: block,
            }),
            Structure::Attribute(_) => None,
        })
    }

    /// Blocks whose identifier is `kind`
    pub fn blocks_of<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = Sourced<&'a Block>> + 'a {
        self.blocks()
            .filter(move |b| b.item.identifier.as_str() == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.structures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn labels(body: &MergedBody, kind: &str) -> Vec<String> {
        body.blocks_of(kind)
            .map(|b| b.item.labels[0].as_str().to_string())
            .collect()
    }

    #[test]
    fn test_parse_document() {
        let doc = Document::parse("a.datcfg", r#"cluster "main" { worker_count = 2 }"#).unwrap();
        assert_eq!(doc.origin(), "a.datcfg");
        assert_eq!(doc.body().blocks().count(), 1);
    }

    #[test]
    fn test_parse_error_names_file() {
        let err = Document::parse("broken.datcfg", "cluster \"main\" {").unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Parse);
        assert_eq!(err.source_location.unwrap().file, "broken.datcfg");
    }

    #[test]
    fn test_parse_error_has_line_and_column() {
        let err = Document::parse("broken.datcfg", "cluster \"a\" {\n  a = \n}").unwrap_err();
        let location = err.source_location.unwrap();
        assert_eq!(location.line, Some(2));
        assert!(location.column.is_some());
    }

    #[test]
    fn test_merge_keeps_repeated_blocks_in_file_order() {
        let a = Document::parse("a.datcfg", r#"component "foo" { foo = "1" }"#).unwrap();
        let b = Document::parse(
            "b.datcfg",
            r#"
component "bar" { bar = "2" }
component "foo" { foo = "3" }
"#,
        )
        .unwrap();

        let merged = MergedBody::merge(vec![a, b]);
        assert_eq!(labels(&merged, "component"), vec!["foo", "bar", "foo"]);

        let origins: Vec<_> = merged
            .blocks_of("component")
            .map(|b| b.origin.to_string())
            .collect();
        assert_eq!(origins, vec!["a.datcfg", "b.datcfg", "b.datcfg"]);
    }

    #[test]
    fn test_merge_of_nothing_is_empty() {
        let merged = MergedBody::merge(Vec::new());
        assert!(merged.is_empty());
        assert_eq!(merged.blocks().count(), 0);
    }

    #[test]
    fn test_attributes_across_files() {
        let a = Document::parse("a.datcfg", "x = 1").unwrap();
        let b = Document::parse("b.datcfg", "y = 2").unwrap();
        let merged = MergedBody::merge(vec![a, b]);
        let keys: Vec<_> = merged.attributes().map(|a| a.item.key.to_string()).collect();
        assert_eq!(keys, vec!["x", "y"]);
    }

    #[test]
    fn test_discover_sorts_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.datcfg"), "").unwrap();
        std::fs::write(dir.path().join("a.datcfg"), "").unwrap();
        std::fs::write(dir.path().join("dat.vars"), "").unwrap();

        let found = discover(dir.path(), DEFAULT_PATTERN).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.datcfg", "b.datcfg"]);
    }

    #[test]
    fn test_parse_all_collects_every_failure() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.datcfg");
        let bad1 = dir.path().join("bad1.datcfg");
        let bad2 = dir.path().join("bad2.datcfg");
        std::fs::write(&good, r#"cluster "c" {}"#).unwrap();
        std::fs::write(&bad1, "cluster {").unwrap();
        std::fs::write(&bad2, "= 3").unwrap();

        let diags = parse_all(&[bad1, good, bad2]).unwrap_err();
        assert_eq!(diags.len(), 2);
    }
}
