// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::batch::Batch;
use crate::errors::StageError;
use crate::traits::{Emit, Stage};

/// Buffers a copy of every batch it receives and passes the original
/// downstream unchanged. The in-process sink collaborator: hold an `Arc` to
/// it and inspect [`Capture::snapshot`] after the run.
pub struct Capture {
    seen: Mutex<Vec<Batch>>,
}

impl Capture {
    pub fn new() -> Self {
        Self {
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Copies of everything received so far, in arrival order.
    pub fn snapshot(&self) -> Vec<Batch> {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drain the buffer, returning everything received so far.
    pub fn take(&self) -> Vec<Batch> {
        std::mem::take(&mut *self.seen.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn len(&self) -> usize {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Capture {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Stage for Capture {
    fn name(&self) -> &str {
        "capture"
    }

    async fn apply(&self, batch: Batch) -> Result<Emit, StageError> {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(batch.clone());
        Ok(Emit::Next(batch))
    }
}
