//! The cluster block

use hcl::Body;
use serde::{Deserialize, Serialize};

use crate::component::ComponentConfig;
use crate::context::EvaluationContext;
use crate::decode::decode_body;
use crate::error::Diagnostics;
use crate::schema::Shape;
use crate::value::Value;

/// Decoded body of `cluster "<name>" { ... }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterConfig {
    pub controller_count: i64,
    pub worker_count: i64,
}

impl ClusterConfig {
    pub fn shape() -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "required": ["controller_count", "worker_count"],
            "properties": {
                "controller_count": {"type": "integer", "minimum": 0},
                "worker_count": {"type": "integer", "minimum": 0}
            },
            "additionalProperties": false
        })
    }
}

impl ComponentConfig for ClusterConfig {
    fn describe(&self) -> String {
        format!(
            "Controllers: {}\nWorkers: {}",
            self.controller_count, self.worker_count
        )
    }
}

/// The cluster block as declared, not yet decoded
#[derive(Debug, Clone)]
pub struct ClusterSpec {
    pub name: String,
    pub body: Body,
    /// File the block came from
    pub origin: String,
}

impl ClusterSpec {
    pub fn path(&self) -> String {
        format!("cluster.{}", self.name)
    }

    /// Decode the body against the pass's context
    pub fn decode(&self, ctx: &EvaluationContext) -> Result<Cluster, Diagnostics> {
        let shape = Shape::new(ClusterConfig::shape()).map_err(Diagnostics::from)?;
        let (config, attributes) = decode_body::<ClusterConfig>(&self.body, ctx, &shape, &self.path())
            .map_err(|diags| {
                if self.origin.is_empty() {
                    diags
                } else {
                    diags.in_file(&self.origin)
                }
            })?;

        Ok(Cluster {
            name: self.name.clone(),
            config,
            attributes,
        })
    }
}

/// A fully decoded cluster
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub name: String,
    pub config: ClusterConfig,
    /// Evaluated attributes, as written
    pub attributes: Value,
}
