// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Explicit graph construction: a mutable [`GraphBuilder`] that is consumed
//! into an immutable [`Graph`] before anything executes.
//!
//! Edges are appended before the run and never mutated afterwards, which is
//! what makes the engine's copy-only-when-branching rule sound: the successor
//! set of a node cannot change while a batch is in flight. Connecting the
//! same pair of nodes twice is legal and means exactly what it says: two
//! edges, two deliveries. That is the caller's responsibility, not something
//! the builder guards against.

mod validation;

use std::sync::Arc;

use crate::batch::GroupId;
use crate::errors::BuildError;
use crate::traits::Stage;

/// Handle to a node within one builder/graph. Only valid for the builder
/// that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

/// Per-node delivery policies, matching the three knobs a stage declares:
/// run me on my own task (`spawn`), always hand me an isolated copy
/// (`isolate`), and wait for each branch I spawn before moving on (`wait`).
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeOptions {
    /// Deliveries into this node run on an independently scheduled task.
    pub spawn: bool,
    /// Deliveries into this node always get a deep copy, even as a sole
    /// successor.
    pub isolate: bool,
    /// When this node spawns a branch, it joins that branch before delivering
    /// to the next successor. Turns "parallel" into sequential-but-isolated.
    pub wait: bool,
}

/// Resolved per-edge delivery policy. `spawn` and `isolate` come from the
/// successor's options, `join` from the predecessor's; [`GraphBuilder::connect_with`]
/// overrides all three for a single edge.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgePolicy {
    pub spawn: bool,
    pub join: bool,
    pub isolate: bool,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Edge {
    pub target: NodeId,
    pub policy: EdgePolicy,
    /// Stamped onto the fan group of any copy delivered down this edge, so a
    /// collector downstream can tell data from different branches apart.
    pub tag: GroupId,
}

/// Collects stages and edges, then validates and freezes them into a [`Graph`].
pub struct GraphBuilder {
    stages: Vec<Arc<dyn Stage>>,
    options: Vec<NodeOptions>,
    edges: Vec<Vec<(NodeId, Option<EdgePolicy>)>>,
    root: Option<NodeId>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            stages: Vec::new(),
            options: Vec::new(),
            edges: Vec::new(),
            root: None,
        }
    }

    /// Add a stage with default options.
    pub fn add(&mut self, stage: Arc<dyn Stage>) -> NodeId {
        self.add_with(stage, NodeOptions::default())
    }

    /// Add a stage with explicit delivery options.
    pub fn add_with(&mut self, stage: Arc<dyn Stage>, options: NodeOptions) -> NodeId {
        let id = NodeId(self.stages.len());
        self.stages.push(stage);
        self.options.push(options);
        self.edges.push(Vec::new());
        id
    }

    /// Append an edge; the policy is derived from the two nodes' options.
    pub fn connect(&mut self, from: NodeId, to: NodeId) {
        self.edges[from.0].push((to, None));
    }

    /// Append an edge with an explicit policy, ignoring node options.
    pub fn connect_with(&mut self, from: NodeId, to: NodeId, policy: EdgePolicy) {
        self.edges[from.0].push((to, Some(policy)));
    }

    /// Choose the entry point. Defaults to the first stage added.
    pub fn root(&mut self, node: NodeId) {
        self.root = Some(node);
    }

    /// Validate and freeze. Rejects an empty builder and any cycle; a cycle
    /// under recursive push would recurse without bound, so it is a build
    /// failure rather than a runtime one.
    pub fn build(self) -> Result<Graph, BuildError> {
        if self.stages.is_empty() {
            return Err(BuildError::EmptyGraph);
        }

        let adjacency: Vec<Vec<usize>> = self
            .edges
            .iter()
            .map(|outs| outs.iter().map(|(to, _)| to.0).collect())
            .collect();
        let names: Vec<&str> = self.stages.iter().map(|s| s.name()).collect();
        if let Some(cycle) = validation::detect_cycle(&adjacency, &names) {
            return Err(BuildError::CyclicGraph { cycle });
        }

        let edges = self
            .edges
            .iter()
            .enumerate()
            .map(|(from, outs)| {
                outs.iter()
                    .map(|(to, policy)| Edge {
                        target: *to,
                        policy: policy.unwrap_or_else(|| EdgePolicy {
                            spawn: self.options[to.0].spawn,
                            isolate: self.options[to.0].isolate,
                            join: self.options[from].wait,
                        }),
                        tag: GroupId::next(),
                    })
                    .collect()
            })
            .collect();

        Ok(Graph {
            stages: self.stages,
            edges,
            root: self.root.unwrap_or(NodeId(0)),
        })
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// An immutable stage graph, ready to run.
pub struct Graph {
    stages: Vec<Arc<dyn Stage>>,
    edges: Vec<Vec<Edge>>,
    root: NodeId,
}

impl Graph {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub(crate) fn stage(&self, node: NodeId) -> &Arc<dyn Stage> {
        &self.stages[node.0]
    }

    pub(crate) fn out_edges(&self, node: NodeId) -> &[Edge] {
        &self.edges[node.0]
    }

    /// Render the graph as an indented tree from the root. A node reachable
    /// along several paths is numbered on first sight and referenced by that
    /// number afterwards.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let mut numbers: Vec<Option<usize>> = vec![None; self.stages.len()];
        let mut next = 1;
        self.render_node(self.root, 0, &mut numbers, &mut next, &mut out);
        out
    }

    fn render_node(
        &self,
        node: NodeId,
        indent: usize,
        numbers: &mut Vec<Option<usize>>,
        next: &mut usize,
        out: &mut String,
    ) {
        for _ in 0..indent {
            out.push_str("|--");
        }
        match numbers[node.0] {
            Some(no) => {
                out.push_str(&format!("{} |{}| (see above)\n", self.stages[node.0].name(), no));
            }
            None => {
                let no = *next;
                *next += 1;
                numbers[node.0] = Some(no);
                out.push_str(&format!("{} |{}|\n", self.stages[node.0].name(), no));
                for edge in &self.edges[node.0] {
                    self.render_node(edge.target, indent + 1, numbers, next, out);
                }
            }
        }
    }
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("stage_count", &self.stages.len())
            .field("root", &self.root)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::Capture;

    fn capture() -> Arc<dyn Stage> {
        Arc::new(Capture::new())
    }

    #[test]
    fn empty_builder_is_rejected() {
        assert_eq!(GraphBuilder::new().build().unwrap_err(), BuildError::EmptyGraph);
    }

    #[test]
    fn cycle_is_rejected_with_its_path() {
        let mut builder = GraphBuilder::new();
        let a = builder.add(capture());
        let b = builder.add(capture());
        builder.connect(a, b);
        builder.connect(b, a);

        match builder.build() {
            Err(BuildError::CyclicGraph { cycle }) => {
                assert!(cycle.len() >= 3);
                assert_eq!(cycle.first(), cycle.last());
            }
            other => panic!("expected CyclicGraph, got {:?}", other.err()),
        }
    }

    #[test]
    fn edge_policy_resolves_from_node_options() {
        let mut builder = GraphBuilder::new();
        let a = builder.add_with(
            capture(),
            NodeOptions {
                wait: true,
                ..NodeOptions::default()
            },
        );
        let b = builder.add_with(
            capture(),
            NodeOptions {
                spawn: true,
                isolate: true,
                ..NodeOptions::default()
            },
        );
        builder.connect(a, b);
        let graph = builder.build().unwrap();

        let edge = &graph.out_edges(a)[0];
        assert!(edge.policy.spawn);
        assert!(edge.policy.isolate);
        assert!(edge.policy.join);
        assert!(!edge.tag.is_none());
    }

    #[test]
    fn duplicate_connect_means_two_edges() {
        let mut builder = GraphBuilder::new();
        let a = builder.add(capture());
        let b = builder.add(capture());
        builder.connect(a, b);
        builder.connect(a, b);
        let graph = builder.build().unwrap();

        assert_eq!(graph.out_edges(a).len(), 2);
        // each edge still gets its own tag
        assert_ne!(graph.out_edges(a)[0].tag, graph.out_edges(a)[1].tag);
    }

    #[test]
    fn render_numbers_shared_nodes_once() {
        let mut builder = GraphBuilder::new();
        let a = builder.add(capture());
        let b = builder.add(capture());
        let c = builder.add(capture());
        builder.connect(a, b);
        builder.connect(a, c);
        builder.connect(b, c);
        let graph = builder.build().unwrap();

        let rendered = graph.render();
        assert_eq!(rendered.matches("|3|").count(), 2);
        assert_eq!(rendered.matches("(see above)").count(), 1);
    }
}
