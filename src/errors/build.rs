// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised while assembling a graph, before anything runs.

use std::fmt;

/// Errors that can occur while building or loading a stage graph
#[derive(Debug, Clone, PartialEq)]
pub enum BuildError {
    /// The graph has no stages
    EmptyGraph,

    /// A cycle was detected in the stage graph
    CyclicGraph {
        /// The cycle path, by stage name
        cycle: Vec<String>,
    },

    /// Two pipeline config entries share an id
    DuplicateStageId { id: String },

    /// A config entry feeds a stage id that doesn't exist
    UnknownStage {
        id: String,
        missing: String,
    },

    /// A config entry references a registry key with no registered stage
    UnregisteredStage {
        id: String,
        uses: String,
    },

    /// The config file could not be read
    ConfigIo { path: String, reason: String },

    /// The config file could not be parsed as pipeline YAML
    ConfigParse { path: String, reason: String },
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::EmptyGraph => {
                write!(f, "Pipeline graph has no stages")
            }
            BuildError::CyclicGraph { cycle } => {
                write!(f, "Cycle detected in stage graph: {}", cycle.join(" -> "))
            }
            BuildError::DuplicateStageId { id } => {
                write!(f, "Duplicate stage id: '{}'", id)
            }
            BuildError::UnknownStage { id, missing } => {
                write!(
                    f,
                    "Stage '{}' feeds '{}' which does not exist",
                    id, missing
                )
            }
            BuildError::UnregisteredStage { id, uses } => {
                write!(
                    f,
                    "Stage '{}' uses '{}' but no such stage is registered",
                    id, uses
                )
            }
            BuildError::ConfigIo { path, reason } => {
                write!(f, "Failed to read pipeline config '{}': {}", path, reason)
            }
            BuildError::ConfigParse { path, reason } => {
                write!(f, "Failed to parse pipeline config '{}': {}", path, reason)
            }
        }
    }
}

impl std::error::Error for BuildError {}
