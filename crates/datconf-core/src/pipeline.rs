//! Resolution pipeline
//!
//! One resolution pass runs these stages in order:
//!
//! ```text
//! Discover → ParseAll → LoadOverrides → DecodeRoot → ResolveVariables
//!          → BuildContext → DecodeCluster → DecodeComponents → Done
//! ```
//!
//! A stage that ends with any diagnostics stops the pass and reports all of
//! them as a [`PipelineFailure`]; nothing half-resolved is returned. Every
//! pass builds its own overrides, variables and context.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::cluster::Cluster;
use crate::component::{ComponentRegistry, ResolvedComponent};
use crate::context::EvaluationContext;
use crate::document::{self, Document, MergedBody, DEFAULT_PATTERN};
use crate::error::Diagnostics;
use crate::root::ConfigRoot;
use crate::value::Value;
use crate::values::{self, Overrides, DEFAULT_VALUES_FILE};
use crate::variables::{resolve_variables, ResolvedVariables};

/// Where a pass looks for its inputs
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Directory searched for configuration files
    pub base_dir: PathBuf,
    /// Glob pattern, relative to `base_dir`
    pub pattern: String,
    /// Values file; relative paths are resolved against `base_dir`
    pub values_file: PathBuf,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            pattern: DEFAULT_PATTERN.to_string(),
            values_file: PathBuf::from(DEFAULT_VALUES_FILE),
        }
    }
}

impl PipelineOptions {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    pub fn with_values_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.values_file = path.into();
        self
    }

    /// The values file path with `base_dir` applied
    pub fn values_path(&self) -> PathBuf {
        if self.values_file.is_absolute() {
            self.values_file.clone()
        } else {
            self.base_dir.join(&self.values_file)
        }
    }
}

/// Stages of a resolution pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Discover,
    ParseAll,
    LoadOverrides,
    DecodeRoot,
    ResolveVariables,
    BuildContext,
    DecodeCluster,
    DecodeComponents,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Discover => "discover",
            Stage::ParseAll => "parse",
            Stage::LoadOverrides => "load values",
            Stage::DecodeRoot => "decode root",
            Stage::ResolveVariables => "resolve variables",
            Stage::BuildContext => "build context",
            Stage::DecodeCluster => "decode cluster",
            Stage::DecodeComponents => "decode components",
            Stage::Done => "done",
        };
        write!(f, "{}", name)
    }
}

/// A pass that stopped at `stage` with every diagnostic collected there
#[derive(Debug, Clone, thiserror::Error)]
#[error("{stage} failed with {} diagnostic(s)\n{diagnostics}", .diagnostics.len())]
pub struct PipelineFailure {
    pub stage: Stage,
    pub diagnostics: Diagnostics,
}

impl PipelineFailure {
    fn new(stage: Stage, diagnostics: Diagnostics) -> Self {
        log::debug!("{} failed with {} diagnostic(s)", stage, diagnostics.len());
        Self { stage, diagnostics }
    }
}

/// Resolved variables from a pass that stopped after variable resolution
#[derive(Debug, Clone)]
pub struct VariablePass {
    pub files: Vec<PathBuf>,
    pub overrides: Overrides,
    pub variables: ResolvedVariables,
}

/// Everything a successful pass produces
#[derive(Debug)]
pub struct Resolution {
    /// Configuration files, in merge order
    pub files: Vec<PathBuf>,
    pub variables: ResolvedVariables,
    pub cluster: Cluster,
    /// Components in document order
    pub components: Vec<ResolvedComponent>,
}

impl Resolution {
    /// Serializable view of the resolution
    pub fn summary(&self) -> ResolutionSummary {
        ResolutionSummary {
            files: self
                .files
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
            variables: self.variables.clone(),
            cluster: ClusterSummary {
                name: self.cluster.name.clone(),
                controller_count: self.cluster.config.controller_count,
                worker_count: self.cluster.config.worker_count,
            },
            components: self
                .components
                .iter()
                .map(|c| ComponentSummary {
                    type_name: c.type_name.clone(),
                    attributes: c.attributes.clone(),
                    description: c.describe(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionSummary {
    pub files: Vec<String>,
    pub variables: ResolvedVariables,
    pub cluster: ClusterSummary,
    pub components: Vec<ComponentSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterSummary {
    pub name: String,
    pub controller_count: i64,
    pub worker_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentSummary {
    #[serde(rename = "type")]
    pub type_name: String,
    pub attributes: Value,
    pub description: String,
}

/// Runs resolution passes against a fixed component registry
#[derive(Debug, Clone)]
pub struct Pipeline {
    options: PipelineOptions,
    registry: Arc<ComponentRegistry>,
}

impl Pipeline {
    pub fn new(options: PipelineOptions, registry: Arc<ComponentRegistry>) -> Self {
        Self { options, registry }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Run a full pass over the files on disk
    pub fn run(&self) -> Result<Resolution, PipelineFailure> {
        let files = self.discover()?;
        let documents = self.parse_all(&files)?;
        let overrides = self.load_overrides()?;

        let mut resolution = self.resolve(documents, &overrides)?;
        resolution.files = files;
        Ok(resolution)
    }

    /// Run a pass over the files on disk, stopping after variable resolution
    pub fn run_variables(&self) -> Result<VariablePass, PipelineFailure> {
        let files = self.discover()?;
        let documents = self.parse_all(&files)?;
        let overrides = self.load_overrides()?;
        let root = decode_root(documents)?;
        let variables = resolve_stage(&root, &overrides)?;

        Ok(VariablePass {
            files,
            overrides,
            variables,
        })
    }

    /// Resolve already-parsed documents with the given overrides
    ///
    /// This is the part of a pass after all input has been read; `files`
    /// in the result is left empty.
    pub fn resolve(
        &self,
        documents: Vec<Document>,
        overrides: &Overrides,
    ) -> Result<Resolution, PipelineFailure> {
        let root = decode_root(documents)?;
        let variables = resolve_stage(&root, overrides)?;

        log::debug!("building evaluation context with {} variable(s)", variables.len());
        let ctx = EvaluationContext::build(&variables);

        log::debug!("decoding cluster '{}'", root.cluster.name);
        let cluster = root
            .cluster
            .decode(&ctx)
            .map_err(|d| PipelineFailure::new(Stage::DecodeCluster, d))?;

        let mut components = Vec::with_capacity(root.components.len());
        for spec in &root.components {
            log::debug!("decoding component '{}'", spec.type_name);
            let component = self
                .registry
                .decode(spec, &ctx)
                .map_err(|d| PipelineFailure::new(Stage::DecodeComponents, d))?;
            components.push(component);
        }

        log::debug!("resolution complete");
        Ok(Resolution {
            files: Vec::new(),
            variables,
            cluster,
            components,
        })
    }

    fn discover(&self) -> Result<Vec<PathBuf>, PipelineFailure> {
        log::debug!(
            "discovering '{}' in {}",
            self.options.pattern,
            self.options.base_dir.display()
        );
        document::discover(&self.options.base_dir, &self.options.pattern)
            .map_err(|e| PipelineFailure::new(Stage::Discover, e.into()))
    }

    fn parse_all(&self, files: &[PathBuf]) -> Result<Vec<Document>, PipelineFailure> {
        document::parse_all(files).map_err(|d| PipelineFailure::new(Stage::ParseAll, d))
    }

    fn load_overrides(&self) -> Result<Overrides, PipelineFailure> {
        load_overrides_from(&self.options.values_path())
    }
}

fn load_overrides_from(path: &Path) -> Result<Overrides, PipelineFailure> {
    values::load_values(path)
        .into_result()
        .map_err(|d| PipelineFailure::new(Stage::LoadOverrides, d))
}

fn decode_root(documents: Vec<Document>) -> Result<ConfigRoot, PipelineFailure> {
    let merged = MergedBody::merge(documents);
    ConfigRoot::decode(&merged).map_err(|d| PipelineFailure::new(Stage::DecodeRoot, d))
}

fn resolve_stage(
    root: &ConfigRoot,
    overrides: &Overrides,
) -> Result<ResolvedVariables, PipelineFailure> {
    resolve_variables(&root.variables, overrides)
        .into_result()
        .map_err(|d| PipelineFailure::new(Stage::ResolveVariables, d))
}
