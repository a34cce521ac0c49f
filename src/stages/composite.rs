// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Sub-graph encapsulation: a chain of stages behaving as a single stage.

use std::sync::Arc;

use async_trait::async_trait;

use crate::batch::Batch;
use crate::engine::run_chain;
use crate::errors::StageError;
use crate::traits::{Emit, Stage};

/// Wraps an ordered chain of inner stages as one node. Input is folded
/// through the chain and every surviving output flows on to the Composite's
/// own successors. An empty chain is a strict identity stage.
///
/// The inner stages are the same instances the caller built, with no
/// duplication, and because the chain is fixed at construction, invoking a
/// Composite any number of times is safe.
pub struct Composite {
    name: String,
    inner: Vec<Arc<dyn Stage>>,
}

impl Composite {
    pub fn new(inner: Vec<Arc<dyn Stage>>) -> Self {
        Self::named("composite", inner)
    }

    pub fn named(name: impl Into<String>, inner: Vec<Arc<dyn Stage>>) -> Self {
        Self {
            name: name.into(),
            inner,
        }
    }
}

#[async_trait]
impl Stage for Composite {
    fn name(&self) -> &str {
        &self.name
    }

    async fn apply(&self, batch: Batch) -> Result<Emit, StageError> {
        if self.inner.is_empty() {
            return Ok(Emit::Next(batch));
        }
        Ok(Emit::Fan(run_chain(&self.inner, batch).await?))
    }
}
