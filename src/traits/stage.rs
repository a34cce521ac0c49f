// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The stage contract: what a graph vertex does to a batch.

use async_trait::async_trait;

use crate::batch::{Batch, Body};
use crate::errors::StageError;

/// What a stage hands back to the engine for delivery.
#[derive(Debug)]
pub enum Emit {
    /// One output batch, delivered down every out-edge.
    Next(Batch),
    /// N batches, each delivered independently down every out-edge.
    /// This is how a fan-out stage performs N deliveries instead of one;
    /// an empty vector delivers nothing.
    Fan(Vec<Batch>),
    /// Nothing yet. A fan-in stage buffering an incomplete group emits this.
    Hold,
}

/// A processing node in the stage graph.
///
/// Implementers override only the shape handlers relevant to the bodies they
/// support; unhandled shapes pass through unchanged. Stages that need the
/// full protocol (sources that ignore their input, fan-out and fan-in
/// stages, anything performing async side effects) override [`Stage::apply`]
/// directly.
#[async_trait]
pub trait Stage: Send + Sync {
    /// Short name used in logs, errors, and graph rendering.
    fn name(&self) -> &str;

    /// Process one batch. The default dispatches on the active body shape.
    async fn apply(&self, batch: Batch) -> Result<Emit, StageError> {
        let out = match batch.body {
            Body::Rows(_) => self.on_rows(batch)?,
            Body::Map(_) => self.on_map(batch)?,
            Body::Text(_) => self.on_text(batch)?,
        };
        Ok(Emit::Next(out))
    }

    /// Handler for sequence-shaped bodies. Identity by default.
    fn on_rows(&self, batch: Batch) -> Result<Batch, StageError> {
        Ok(batch)
    }

    /// Handler for mapping-shaped bodies. Identity by default.
    fn on_map(&self, batch: Batch) -> Result<Batch, StageError> {
        Ok(batch)
    }

    /// Handler for text bodies. Identity by default.
    fn on_text(&self, batch: Batch) -> Result<Batch, StageError> {
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct RowsOnly;

    #[async_trait]
    impl Stage for RowsOnly {
        fn name(&self) -> &str {
            "rows_only"
        }

        fn on_rows(&self, mut batch: Batch) -> Result<Batch, StageError> {
            if let Body::Rows(rows) = &mut batch.body {
                rows.push(json!(["touched"]));
            }
            Ok(batch)
        }
    }

    #[tokio::test]
    async fn default_apply_dispatches_on_shape() {
        let stage = RowsOnly;

        let rows = Batch::from_rows(vec![], vec![json!(["a"])]);
        match stage.apply(rows).await.unwrap() {
            Emit::Next(out) => assert_eq!(out.body.len(), 2),
            other => panic!("expected Next, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn unhandled_shapes_pass_through_unchanged() {
        let stage = RowsOnly;

        let text = Batch {
            body: Body::Text("unchanged".into()),
            ..Batch::new()
        };
        match stage.apply(text.clone()).await.unwrap() {
            Emit::Next(out) => assert_eq!(out, text),
            other => panic!("expected Next, got {:?}", other),
        }
    }
}
