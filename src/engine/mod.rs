// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The push dispatch engine.
//!
//! Control flow is recursive push: a stage finishes its own transform and the
//! engine immediately delivers the result to its successors, depth-first, on
//! the caller's task. There is no central scheduler loop. Parallelism is
//! opt-in per edge: a `spawn` edge runs the successor's whole subtree on its
//! own tokio task, and a `join` edge is awaited before the next successor is
//! touched.
//!
//! Copy discipline: a batch is deep-copied when and only when it is about to
//! go down more than one edge, or down an edge requiring isolation. Every
//! copy has its fan group restamped with the edge's build-time tag (size and
//! index preserved), so a collector downstream can tell delivery edges apart
//! while split groups still complete.
//!
//! Failure discipline: an inline failure unwinds the current delivery chain
//! and skips the remaining inline successors; branches already spawned keep
//! running and their outcomes (errors and panics both) are collected when
//! the spawning node joins them. Nothing fails silently.


use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinHandle;

use crate::batch::Batch;
use crate::errors::{EngineError, StageError};
use crate::graph::{Edge, Graph, NodeId};
use crate::observability::messages::engine::{PipelineCompleted, PipelineStarted, StageFailed};
use crate::observability::messages::StructuredLog;
use crate::traits::{Emit, Stage};

/// A runnable pipeline: an immutable graph plus its entry point.
pub struct Pipeline {
    graph: Arc<Graph>,
}

impl Pipeline {
    pub fn new(graph: Graph) -> Self {
        Self {
            graph: Arc::new(graph),
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Start the pipeline: the root stage receives a fresh empty batch. A
    /// source stage ignores it and loads real data instead.
    ///
    /// Returns once every branch, spawned or inline, is quiescent.
    pub async fn run(&self) -> Result<(), EngineError> {
        self.feed(Batch::new()).await
    }

    /// Run the pipeline with a caller-supplied initial batch.
    pub async fn feed(&self, batch: Batch) -> Result<(), EngineError> {
        PipelineStarted {
            root: self.graph.stage(self.graph.root()).name(),
            stage_count: self.graph.len(),
        }
        .log();
        let started = Instant::now();
        dispatch(Arc::clone(&self.graph), self.graph.root(), batch).await?;
        PipelineCompleted {
            elapsed_ms: started.elapsed().as_millis(),
        }
        .log();
        Ok(())
    }
}

type DispatchFuture = Pin<Box<dyn Future<Output = Result<(), EngineError>> + Send>>;

/// Process one batch at `node`, then deliver whatever it emits. Boxed because
/// the recursion depth follows the graph depth.
pub(crate) fn dispatch(graph: Arc<Graph>, node: NodeId, batch: Batch) -> DispatchFuture {
    Box::pin(async move {
        let stage = Arc::clone(graph.stage(node));
        let emit = match stage.apply(batch).await {
            Ok(emit) => emit,
            Err(source) => {
                StageFailed {
                    stage: stage.name(),
                    error: &source,
                }
                .log();
                return Err(EngineError::Stage {
                    stage: stage.name().to_string(),
                    source,
                });
            }
        };

        match emit {
            Emit::Hold => Ok(()),
            Emit::Next(out) => deliver(&graph, node, out).await,
            Emit::Fan(outs) => {
                for out in outs {
                    deliver(&graph, node, out).await?;
                }
                Ok(())
            }
        }
    })
}

async fn deliver(graph: &Arc<Graph>, node: NodeId, batch: Batch) -> Result<(), EngineError> {
    let edges = graph.out_edges(node);
    if edges.is_empty() {
        return Ok(());
    }

    // A sole successor not requiring isolation receives the original
    // instance, un-copied and un-restamped.
    if edges.len() == 1 && !edges[0].policy.isolate {
        let edge = edges[0];
        if edge.policy.spawn {
            let target = graph.stage(edge.target).name().to_string();
            let handle = tokio::spawn(dispatch(Arc::clone(graph), edge.target, batch));
            return join_branch(target, handle).await;
        }
        return dispatch(Arc::clone(graph), edge.target, batch).await;
    }

    let mut first_err: Option<EngineError> = None;
    let mut pending: Vec<(String, JoinHandle<Result<(), EngineError>>)> = Vec::new();

    // Parallel branches launch before inline delivery begins; among
    // themselves they carry no ordering guarantee unless joined.
    for edge in edges.iter().filter(|e| e.policy.spawn) {
        let copy = branch_copy(&batch, edge);
        let target = graph.stage(edge.target).name().to_string();
        let handle = tokio::spawn(dispatch(Arc::clone(graph), edge.target, copy));
        if edge.policy.join {
            if let Err(err) = join_branch(target, handle).await {
                first_err = Some(err);
                break;
            }
        } else {
            pending.push((target, handle));
        }
    }

    // Inline successors run in list order; the first failure skips the rest.
    if first_err.is_none() {
        for edge in edges.iter().filter(|e| !e.policy.spawn) {
            let copy = branch_copy(&batch, edge);
            if let Err(err) = dispatch(Arc::clone(graph), edge.target, copy).await {
                first_err = Some(err);
                break;
            }
        }
    }

    // Branches already in flight are unaffected by an inline failure; their
    // outcomes are still collected here.
    for (target, handle) in pending {
        match handle.await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                first_err.get_or_insert(err);
            }
            Err(source) => {
                first_err.get_or_insert(EngineError::BranchPanicked {
                    stage: target,
                    source,
                });
            }
        }
    }

    match first_err {
        None => Ok(()),
        Some(err) => Err(err),
    }
}

fn branch_copy(batch: &Batch, edge: &Edge) -> Batch {
    let mut copy = batch.clone();
    copy.fan.group = edge.tag;
    copy
}

async fn join_branch(
    target: String,
    handle: JoinHandle<Result<(), EngineError>>,
) -> Result<(), EngineError> {
    match handle.await {
        Ok(result) => result,
        Err(source) => Err(EngineError::BranchPanicked {
            stage: target,
            source,
        }),
    }
}

/// Fold a batch through a linear stage chain, outside any graph.
///
/// Fan emissions are flat-mapped through the remainder of the chain and
/// holds drop out; the result is whatever survives the final stage. This is
/// the composition primitive behind [`Composite`](crate::stages::Composite)
/// and [`Tap`](crate::stages::Tap).
pub async fn run_chain(
    stages: &[Arc<dyn Stage>],
    batch: Batch,
) -> Result<Vec<Batch>, StageError> {
    let mut current = vec![batch];
    for stage in stages {
        let mut next = Vec::with_capacity(current.len());
        for batch in current {
            match stage.apply(batch).await? {
                Emit::Next(out) => next.push(out),
                Emit::Fan(outs) => next.extend(outs),
                Emit::Hold => {}
            }
        }
        current = next;
    }
    Ok(current)
}
