// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Fan-out: split one batch into per-key batches sharing a fan-group identity.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use crate::batch::{Batch, Body, FanGroup, FieldRef, GroupId};
use crate::errors::StageError;
use crate::traits::{Emit, Stage};

/// Splits row batches by the value of one field.
///
/// Rows accumulate in stage-local state keyed by the partition field, in
/// first-seen order, and the state survives across invocations: feeding a
/// second batch through the same instance keeps merging into the same
/// partitions. The accumulation lifetime is therefore explicit: create one
/// `Partitioner` per logical run, or call [`Partitioner::reset`] between
/// runs. The state sits behind a lock, so a shared instance is serialized
/// rather than torn, but interleaved use from two pipelines still mixes
/// their partitions.
///
/// Each invocation emits one batch per distinct key seen so far, all stamped
/// with a single fresh [`GroupId`], `size` = number of distinct keys, and a
/// 1-based index. With nothing accumulated, nothing is emitted.
///
/// Non-row bodies pass through unchanged.
pub struct Partitioner {
    key: FieldRef,
    groups: Mutex<Vec<(String, Vec<Value>)>>,
}

impl Partitioner {
    pub fn new(key: impl Into<FieldRef>) -> Self {
        Self {
            key: key.into(),
            groups: Mutex::new(Vec::new()),
        }
    }

    /// Drop all accumulated partitions.
    pub fn reset(&self) {
        self.lock_groups().clear();
    }

    fn lock_groups(&self) -> std::sync::MutexGuard<'_, Vec<(String, Vec<Value>)>> {
        self.groups.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Partition keys are compared by their textual form; a JSON string keys by
/// its contents, anything else by its JSON rendering.
fn key_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl Stage for Partitioner {
    fn name(&self) -> &str {
        "partition"
    }

    async fn apply(&self, batch: Batch) -> Result<Emit, StageError> {
        let Body::Rows(rows) = &batch.body else {
            return Ok(Emit::Next(batch));
        };

        let mut groups = self.lock_groups();
        for row in rows {
            let field = self.key.get(row).ok_or_else(|| StageError::Failed {
                stage: self.name().to_string(),
                reason: format!("row has no partition field {}", self.key),
            })?;
            let key = key_text(field);
            match groups.iter_mut().find(|(k, _)| *k == key) {
                Some((_, members)) => members.push(row.clone()),
                None => groups.push((key, vec![row.clone()])),
            }
        }

        let group = GroupId::next();
        let size = groups.len();
        let batches = groups
            .iter()
            .enumerate()
            .map(|(i, (_, members))| Batch {
                schema: batch.schema.clone(),
                body: Body::Rows(members.clone()),
                fan: FanGroup {
                    group,
                    size,
                    index: i + 1,
                },
            })
            .collect();

        Ok(Emit::Fan(batches))
    }
}
