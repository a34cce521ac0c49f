// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised while a pipeline is running.
//!
//! A [`StageError`] is a single stage failing to transform its batch. An
//! [`EngineError`] is what a pipeline run reports: which stage failed on the
//! dispatch path, or that a spawned branch died. Failures on spawned branches
//! are surfaced when the branch is joined, never swallowed.

use thiserror::Error;

/// A stage failed to process a batch.
#[derive(Debug, Error)]
pub enum StageError {
    /// The stage could not compute its output.
    #[error("{stage}: {reason}")]
    Failed { stage: String, reason: String },

    /// A source or sink collaborator hit the filesystem and lost.
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    /// A source collaborator could not parse what it read.
    #[error("{stage}: failed to parse '{path}': {reason}")]
    Parse {
        stage: String,
        path: String,
        reason: String,
    },

    /// A fan-in merge was asked to concatenate a body shape it does not
    /// define concatenation for.
    #[error("cannot merge {shape} bodies")]
    Unmergeable { shape: &'static str },
}

/// A pipeline run failed.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A stage on the dispatch path returned an error; unwinds the current
    /// delivery chain up to the nearest spawn boundary.
    #[error("stage '{stage}' failed: {source}")]
    Stage {
        stage: String,
        #[source]
        source: StageError,
    },

    /// A spawned branch panicked or was aborted; observed at join time.
    #[error("spawned branch into '{stage}' did not complete")]
    BranchPanicked {
        stage: String,
        #[source]
        source: tokio::task::JoinError,
    },
}
