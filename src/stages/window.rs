// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Row-window stages: head, tail, skip. Sequence bodies only; everything
//! else passes through.

use async_trait::async_trait;

use crate::batch::{Batch, Body};
use crate::errors::StageError;
use crate::traits::Stage;

/// Keeps the first `n` rows.
pub struct Head {
    n: usize,
}

impl Head {
    pub fn new(n: usize) -> Self {
        Self { n }
    }
}

#[async_trait]
impl Stage for Head {
    fn name(&self) -> &str {
        "head"
    }

    fn on_rows(&self, mut batch: Batch) -> Result<Batch, StageError> {
        if let Body::Rows(rows) = &mut batch.body {
            rows.truncate(self.n);
        }
        Ok(batch)
    }
}

/// Keeps the last `n` rows.
pub struct Tail {
    n: usize,
}

impl Tail {
    pub fn new(n: usize) -> Self {
        Self { n }
    }
}

#[async_trait]
impl Stage for Tail {
    fn name(&self) -> &str {
        "tail"
    }

    fn on_rows(&self, mut batch: Batch) -> Result<Batch, StageError> {
        if let Body::Rows(rows) = &mut batch.body {
            let keep = rows.len().saturating_sub(self.n);
            *rows = rows.split_off(keep);
        }
        Ok(batch)
    }
}

/// Drops the first `n` rows.
pub struct Skip {
    n: usize,
}

impl Skip {
    pub fn new(n: usize) -> Self {
        Self { n }
    }
}

#[async_trait]
impl Stage for Skip {
    fn name(&self) -> &str {
        "skip"
    }

    fn on_rows(&self, mut batch: Batch) -> Result<Batch, StageError> {
        if let Body::Rows(rows) = &mut batch.body {
            let n = self.n.min(rows.len());
            rows.drain(..n);
        }
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(n: usize) -> Batch {
        Batch::from_rows(vec![], (0..n).map(|i| json!([i])).collect())
    }

    #[tokio::test]
    async fn head_tail_skip_windows() {
        let out = Head::new(2).on_rows(rows(5)).unwrap();
        assert_eq!(out.body, Body::Rows(vec![json!([0]), json!([1])]));

        let out = Tail::new(2).on_rows(rows(5)).unwrap();
        assert_eq!(out.body, Body::Rows(vec![json!([3]), json!([4])]));

        let out = Skip::new(3).on_rows(rows(5)).unwrap();
        assert_eq!(out.body, Body::Rows(vec![json!([3]), json!([4])]));
    }

    #[tokio::test]
    async fn windows_wider_than_the_batch_are_safe() {
        assert_eq!(Head::new(9).on_rows(rows(2)).unwrap().body.len(), 2);
        assert_eq!(Tail::new(9).on_rows(rows(2)).unwrap().body.len(), 2);
        assert_eq!(Skip::new(9).on_rows(rows(2)).unwrap().body.len(), 0);
    }
}
