//! datconf-core: declarative cluster configuration
//!
//! Loads a set of HCL configuration files, resolves their `variable`
//! declarations against a values file, and decodes the `cluster` block and
//! every `component` block through a fixed registry of component types.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use datconf_core::{ComponentRegistry, Document, Overrides, Pipeline, PipelineOptions};
//!
//! let doc = Document::parse("main.datcfg", r#"
//! variable "controller_count" {
//!   default = 3
//! }
//!
//! cluster "main" {
//!   controller_count = var.controller_count
//!   worker_count     = 2
//! }
//!
//! component "foo" {
//!   foo = "controllers: ${var.controller_count}"
//! }
//! "#).unwrap();
//!
//! let pipeline = Pipeline::new(
//!     PipelineOptions::default(),
//!     Arc::new(ComponentRegistry::with_builtins()),
//! );
//! let resolution = pipeline.resolve(vec![doc], &Overrides::new()).unwrap();
//!
//! assert_eq!(resolution.cluster.config.controller_count, 3);
//! assert_eq!(resolution.components[0].describe(), "Foo: controllers: 3");
//! ```

pub mod cluster;
pub mod component;
pub mod context;
pub mod decode;
pub mod document;
pub mod error;
pub mod pipeline;
pub mod root;
pub mod schema;
pub mod value;
pub mod values;
pub mod variables;

mod builtin;

pub use builtin::{BarComponentConfig, FooComponentConfig};
pub use cluster::{Cluster, ClusterConfig};
pub use component::{
    global_registry, init_global_registry, Component, ComponentConfig, ComponentFactory,
    ComponentRegistry, ResolvedComponent,
};
pub use context::EvaluationContext;
pub use document::Document;
pub use error::{Diagnostics, Error, ErrorKind, Outcome, Result};
pub use pipeline::{Pipeline, PipelineFailure, PipelineOptions, Resolution, Stage};
pub use schema::Shape;
pub use value::Value;
pub use values::Overrides;
pub use variables::ResolvedVariables;
