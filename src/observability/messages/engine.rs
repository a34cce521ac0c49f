// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for pipeline lifecycle and dispatch events.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};

/// A pipeline run has started from its root stage.
///
/// # Log Level
/// `info!` - Important operational event
pub struct PipelineStarted<'a> {
    pub root: &'a str,
    pub stage_count: usize,
}

impl Display for PipelineStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Starting pipeline from '{}': {} stages",
            self.root, self.stage_count
        )
    }
}

impl StructuredLog for PipelineStarted<'_> {
    fn log(&self) {
        tracing::info!(root = self.root, stage_count = self.stage_count, "{}", self);
    }
}

/// A pipeline run finished and every branch is quiescent.
///
/// # Log Level
/// `info!` - Important operational event
pub struct PipelineCompleted {
    pub elapsed_ms: u128,
}

impl Display for PipelineCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Pipeline completed in {}ms", self.elapsed_ms)
    }
}

impl StructuredLog for PipelineCompleted {
    fn log(&self) {
        tracing::info!(elapsed_ms = self.elapsed_ms, "{}", self);
    }
}

/// A stage on the dispatch path failed.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct StageFailed<'a> {
    pub stage: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for StageFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Stage '{}' failed: {}", self.stage, self.error)
    }
}

impl StructuredLog for StageFailed<'_> {
    fn log(&self) {
        tracing::error!(stage = self.stage, "{}", self);
    }
}
