// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! YAML pipeline configuration.
//!
//! A pipeline config names stages by id, ties each id to a registered stage
//! instance, and wires ids together with `feeds`. Stages themselves carry
//! closures and file paths, so they are constructed in code and looked up
//! through a [`StageRegistry`](crate::config::StageRegistry); the config only
//! decides the wiring and the delivery policies.
//!
//! # Example
//! ```yaml
//! stages:
//!   - id: reader
//!     feeds: [workday]
//!   - id: workday
//!     uses: classify_workday
//!     feeds: [split]
//!   - id: split
//!     feeds: [merge]
//!   - id: merge
//!     spawn: true
//!     feeds: [show]
//!   - id: show
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::config::StageRegistry;
use crate::errors::BuildError;
use crate::graph::{Graph, GraphBuilder, NodeOptions};

/// One pipeline: an ordered list of stage entries. The first entry is the
/// root the run starts from.
#[derive(Debug, Deserialize, PartialEq)]
pub struct PipelineConfig {
    pub stages: Vec<StageConfig>,
}

/// One stage entry.
///
/// # Fields
/// * `id` - unique name of this node in the pipeline
/// * `uses` - registry key of the stage instance (defaults to `id`)
/// * `spawn` - deliveries into this node run on their own task
/// * `isolate` - deliveries into this node always get a deep copy
/// * `wait` - this node joins each branch it spawns before moving on
/// * `feeds` - ids of the downstream nodes
#[derive(Debug, Deserialize, PartialEq)]
pub struct StageConfig {
    pub id: String,
    #[serde(default)]
    pub uses: Option<String>,
    #[serde(default)]
    pub spawn: bool,
    #[serde(default)]
    pub isolate: bool,
    #[serde(default)]
    pub wait: bool,
    #[serde(default)]
    pub feeds: Vec<String>,
}

impl StageConfig {
    fn registry_key(&self) -> &str {
        self.uses.as_deref().unwrap_or(&self.id)
    }
}

/// Load a pipeline config from a YAML file.
pub fn load_config(path: impl AsRef<Path>) -> Result<PipelineConfig, BuildError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|e| BuildError::ConfigIo {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    serde_yaml::from_str(&raw).map_err(|e| BuildError::ConfigParse {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Resolve a config against a registry and build the graph.
///
/// Checks run in order (duplicate ids, unresolved registry references,
/// unresolved `feeds` targets) before cycle detection in
/// [`GraphBuilder::build`], so the error for a malformed config names the
/// actual problem rather than a downstream symptom.
pub fn build_graph(
    config: &PipelineConfig,
    registry: &StageRegistry,
) -> Result<Graph, BuildError> {
    if config.stages.is_empty() {
        return Err(BuildError::EmptyGraph);
    }

    let mut builder = GraphBuilder::new();
    let mut nodes = HashMap::new();

    for entry in &config.stages {
        if nodes.contains_key(entry.id.as_str()) {
            return Err(BuildError::DuplicateStageId {
                id: entry.id.clone(),
            });
        }
        let stage = registry.get(entry.registry_key()).ok_or_else(|| {
            BuildError::UnregisteredStage {
                id: entry.id.clone(),
                uses: entry.registry_key().to_string(),
            }
        })?;
        let node = builder.add_with(
            Arc::clone(stage),
            NodeOptions {
                spawn: entry.spawn,
                isolate: entry.isolate,
                wait: entry.wait,
            },
        );
        nodes.insert(entry.id.as_str(), node);
    }

    for entry in &config.stages {
        let from = nodes[entry.id.as_str()];
        for target in &entry.feeds {
            let to = nodes.get(target.as_str()).ok_or_else(|| {
                BuildError::UnknownStage {
                    id: entry.id.clone(),
                    missing: target.clone(),
                }
            })?;
            builder.connect(from, *to);
        }
    }

    builder.build()
}
