// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Non-destructive monitor: observes a copy, never the primary path.

use std::sync::Arc;

use async_trait::async_trait;

use crate::batch::Batch;
use crate::engine::run_chain;
use crate::errors::StageError;
use crate::traits::{Emit, Stage};

/// Forwards a deep copy of each batch into an observation-only chain whose
/// output is discarded, then passes the original batch downstream unchanged:
/// schema, body, and fan metadata untouched. Side effects inside the chain
/// (writing files, printing) can never leak into the primary path.
///
/// A failure inside the tap chain propagates; the tap is synchronous with
/// the path it observes.
pub struct Tap {
    name: String,
    inner: Vec<Arc<dyn Stage>>,
}

impl Tap {
    pub fn new(inner: Vec<Arc<dyn Stage>>) -> Self {
        Self::named("tap", inner)
    }

    pub fn named(name: impl Into<String>, inner: Vec<Arc<dyn Stage>>) -> Self {
        Self {
            name: name.into(),
            inner,
        }
    }
}

#[async_trait]
impl Stage for Tap {
    fn name(&self) -> &str {
        &self.name
    }

    async fn apply(&self, batch: Batch) -> Result<Emit, StageError> {
        if !self.inner.is_empty() {
            run_chain(&self.inner, batch.clone()).await?;
        }
        Ok(Emit::Next(batch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::{Capture, Head, MapRows};
    use serde_json::json;

    #[tokio::test]
    async fn tap_never_mutates_the_primary_path() {
        let seen = Arc::new(Capture::new());
        let tap = Tap::new(vec![
            Arc::new(MapRows::new(|_| json!(["rewritten"]))),
            Arc::clone(&seen) as Arc<dyn Stage>,
        ]);

        let input = Batch::from_rows(vec!["name".into()], vec![json!(["a"]), json!(["b"])]);
        match tap.apply(input.clone()).await.unwrap() {
            Emit::Next(out) => assert_eq!(out, input),
            other => panic!("expected Next, got {:?}", other),
        }

        // the chain observed the rewritten copy
        let observed = seen.snapshot();
        assert_eq!(observed.len(), 1);
        assert_eq!(
            observed[0].body,
            crate::batch::Body::Rows(vec![json!(["rewritten"]), json!(["rewritten"])])
        );
    }

    #[tokio::test]
    async fn empty_tap_is_identity() {
        let tap = Tap::new(vec![]);
        let input = Batch::from_rows(vec![], vec![json!([1])]);
        match tap.apply(input.clone()).await.unwrap() {
            Emit::Next(out) => assert_eq!(out, input),
            other => panic!("expected Next, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn tap_chain_failure_propagates() {
        struct Boom;
        #[async_trait]
        impl Stage for Boom {
            fn name(&self) -> &str {
                "boom"
            }
            fn on_rows(&self, _batch: Batch) -> Result<Batch, StageError> {
                Err(StageError::Failed {
                    stage: "boom".into(),
                    reason: "observer died".into(),
                })
            }
        }

        let tap = Tap::new(vec![Arc::new(Boom), Arc::new(Head::new(1))]);
        let input = Batch::from_rows(vec![], vec![json!([1])]);
        assert!(tap.apply(input).await.is_err());
    }
}
