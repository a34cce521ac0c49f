// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Fan-in: merge a known-size group of batches back into one.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use crate::batch::{Batch, Body, GroupId};
use crate::errors::StageError;
use crate::observability::messages::collect::{GroupBuffered, GroupFlushed, GroupStalled};
use crate::observability::messages::StructuredLog;
use crate::traits::{Emit, Stage};

type GroupSlot = Arc<Mutex<Vec<Batch>>>;

/// Buffers batches per fan-group identity until a group holds as many
/// batches as its declared size, then concatenates their row bodies into one
/// batch and emits it. Arrival order is irrelevant; the merged body is the
/// multiset union of the group's records.
///
/// Append, completeness check, and take-out are one critical section under a
/// per-identity lock, so two batches completing the same group in rapid
/// succession cannot both flush it, and unrelated groups never queue behind
/// each other. The outer map lock is held only long enough to find or create
/// a group's slot.
///
/// A flushed group's slot is left empty, so a later fan-out reusing the same
/// identity starts a fresh group. A batch with no active fan-out
/// (`GroupId::NONE`, size 1) is a complete group of one and flushes
/// immediately.
pub struct Collector {
    groups: Mutex<HashMap<GroupId, GroupSlot>>,
}

impl Collector {
    pub fn new() -> Self {
        Self {
            groups: Mutex::new(HashMap::new()),
        }
    }

    /// Identities still holding buffered batches, with their counts. A group
    /// that never reaches its declared size never flushes; this makes that
    /// state diagnosable.
    pub fn pending(&self) -> Vec<(GroupId, usize)> {
        let groups = self.groups.lock().unwrap_or_else(PoisonError::into_inner);
        groups
            .iter()
            .filter_map(|(group, slot)| {
                let held = slot.lock().unwrap_or_else(PoisonError::into_inner).len();
                (held > 0).then_some((*group, held))
            })
            .collect()
    }

    fn slot(&self, group: GroupId) -> GroupSlot {
        let mut groups = self.groups.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(groups.entry(group).or_default())
    }
}

impl Default for Collector {
    fn default() -> Self {
        Self::new()
    }
}

fn merge(batches: Vec<Batch>) -> Result<Batch, StageError> {
    let mut schema = Vec::new();
    let mut rows = Vec::new();
    for (i, batch) in batches.into_iter().enumerate() {
        if i == 0 {
            schema = batch.schema;
        }
        match batch.body {
            Body::Rows(mut members) => rows.append(&mut members),
            Body::Map(_) => return Err(StageError::Unmergeable { shape: "mapping" }),
            Body::Text(_) => return Err(StageError::Unmergeable { shape: "text" }),
        }
    }
    Ok(Batch::from_rows(schema, rows))
}

#[async_trait]
impl Stage for Collector {
    fn name(&self) -> &str {
        "collect"
    }

    async fn apply(&self, batch: Batch) -> Result<Emit, StageError> {
        let group = batch.fan.group;
        let expected = batch.fan.size.max(1);
        let slot = self.slot(group);

        // per-group critical section: append, check, take
        let ready = {
            let mut held = slot.lock().unwrap_or_else(PoisonError::into_inner);
            held.push(batch);
            if held.len() == expected {
                Some(std::mem::take(&mut *held))
            } else {
                GroupBuffered {
                    group,
                    held: held.len(),
                    expected,
                }
                .log();
                None
            }
        };

        match ready {
            None => Ok(Emit::Hold),
            Some(batches) => {
                let count = batches.len();
                let merged = merge(batches)?;
                GroupFlushed {
                    group,
                    batches: count,
                    records: merged.body.len(),
                }
                .log();
                Ok(Emit::Next(merged))
            }
        }
    }
}

impl Drop for Collector {
    fn drop(&mut self) {
        for (group, held) in self.pending() {
            GroupStalled { group, held }.log();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::FanGroup;
    use serde_json::{json, Value};

    fn piece(group: GroupId, size: usize, index: usize, row: Value) -> Batch {
        Batch {
            schema: vec!["name".into(), "day".into()],
            body: Body::Rows(vec![row]),
            fan: FanGroup { group, size, index },
        }
    }

    fn row_set(batch: &Batch) -> Vec<Value> {
        let Body::Rows(rows) = &batch.body else {
            panic!("expected rows");
        };
        let mut rows = rows.clone();
        rows.sort_by_key(|r| r.to_string());
        rows
    }

    #[tokio::test]
    async fn incomplete_group_holds() {
        let collect = Collector::new();
        let group = GroupId::next();
        let emit = collect
            .apply(piece(group, 2, 1, json!(["a", "星期日"])))
            .await
            .unwrap();
        assert!(matches!(emit, Emit::Hold));
        assert_eq!(collect.pending(), vec![(group, 1)]);
    }

    #[tokio::test]
    async fn completed_group_flushes_once_and_clears() {
        let collect = Collector::new();
        let group = GroupId::next();

        assert!(matches!(
            collect
                .apply(piece(group, 2, 1, json!(["a", "星期日"])))
                .await
                .unwrap(),
            Emit::Hold
        ));
        let Emit::Next(merged) = collect
            .apply(piece(group, 2, 2, json!(["b", "星期一"])))
            .await
            .unwrap()
        else {
            panic!("expected Next");
        };

        assert_eq!(merged.schema, vec!["name", "day"]);
        assert_eq!(
            row_set(&merged),
            vec![json!(["a", "星期日"]), json!(["b", "星期一"])]
        );
        assert_eq!(merged.fan, FanGroup::default());
        assert!(collect.pending().is_empty());
    }

    #[tokio::test]
    async fn merge_is_arrival_order_insensitive() {
        let group = GroupId::next();
        let forward = Collector::new();
        let reverse = Collector::new();

        forward
            .apply(piece(group, 2, 1, json!(["a", "星期日"])))
            .await
            .unwrap();
        let Emit::Next(one) = forward
            .apply(piece(group, 2, 2, json!(["b", "星期一"])))
            .await
            .unwrap()
        else {
            panic!("expected Next");
        };

        reverse
            .apply(piece(group, 2, 2, json!(["b", "星期一"])))
            .await
            .unwrap();
        let Emit::Next(two) = reverse
            .apply(piece(group, 2, 1, json!(["a", "星期日"])))
            .await
            .unwrap()
        else {
            panic!("expected Next");
        };

        assert_eq!(row_set(&one), row_set(&two));
    }

    #[tokio::test]
    async fn identity_is_reusable_after_flush() {
        let collect = Collector::new();
        let group = GroupId::next();

        collect.apply(piece(group, 2, 1, json!(["a", "x"]))).await.unwrap();
        collect.apply(piece(group, 2, 2, json!(["b", "y"]))).await.unwrap();

        // a third, unrelated batch reusing the identity starts a fresh group
        let emit = collect
            .apply(piece(group, 2, 1, json!(["c", "z"])))
            .await
            .unwrap();
        assert!(matches!(emit, Emit::Hold));
        assert_eq!(collect.pending(), vec![(group, 1)]);
    }

    #[tokio::test]
    async fn batch_outside_any_fanout_flushes_alone() {
        let collect = Collector::new();
        let solo = Batch::from_rows(vec!["n".into()], vec![json!([1])]);
        let Emit::Next(out) = collect.apply(solo.clone()).await.unwrap() else {
            panic!("expected Next");
        };
        assert_eq!(out.body, solo.body);
    }

    #[tokio::test]
    async fn mapping_and_text_bodies_are_rejected() {
        let collect = Collector::new();
        let mut batch = Batch::new();
        batch.body = Body::Text("raw".into());
        assert!(matches!(
            collect.apply(batch).await,
            Err(StageError::Unmergeable { shape: "text" })
        ));
    }

    #[tokio::test]
    async fn concurrent_fan_in_flushes_exactly_once() {
        let collect = Arc::new(Collector::new());
        let group = GroupId::next();
        let size = 32;

        let mut handles = Vec::new();
        for i in 0..size {
            let collect = Arc::clone(&collect);
            handles.push(tokio::spawn(async move {
                let emit = collect
                    .apply(piece(group, size, i + 1, json!([i])))
                    .await
                    .unwrap();
                matches!(emit, Emit::Next(_))
            }));
        }

        let mut flushes = 0;
        for handle in handles {
            if handle.await.unwrap() {
                flushes += 1;
            }
        }
        assert_eq!(flushes, 1);
        assert!(collect.pending().is_empty());
    }
}
