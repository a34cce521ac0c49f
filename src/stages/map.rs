// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::Value;

use crate::batch::{Batch, Body, FieldRef};
use crate::errors::StageError;
use crate::traits::Stage;

type RecordFn = dyn Fn(Value) -> Value + Send + Sync;

/// Applies a function to every record: whole rows for sequence bodies,
/// entry values for mapping bodies.
pub struct MapRows {
    func: Box<RecordFn>,
}

impl MapRows {
    pub fn new(func: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        Self {
            func: Box::new(func),
        }
    }
}

#[async_trait]
impl Stage for MapRows {
    fn name(&self) -> &str {
        "map"
    }

    fn on_rows(&self, mut batch: Batch) -> Result<Batch, StageError> {
        if let Body::Rows(rows) = &mut batch.body {
            for row in rows.iter_mut() {
                *row = (self.func)(row.take());
            }
        }
        Ok(batch)
    }

    fn on_map(&self, mut batch: Batch) -> Result<Batch, StageError> {
        if let Body::Map(map) = &mut batch.body {
            for value in map.values_mut() {
                *value = (self.func)(value.take());
            }
        }
        Ok(batch)
    }
}

/// Rewrites one field of every row, addressed by position or key. A row
/// missing the field is a transform failure.
pub struct FieldMap {
    field: FieldRef,
    func: Box<RecordFn>,
}

impl FieldMap {
    pub fn new(
        field: impl Into<FieldRef>,
        func: impl Fn(Value) -> Value + Send + Sync + 'static,
    ) -> Self {
        Self {
            field: field.into(),
            func: Box::new(func),
        }
    }
}

#[async_trait]
impl Stage for FieldMap {
    fn name(&self) -> &str {
        "field_map"
    }

    fn on_rows(&self, mut batch: Batch) -> Result<Batch, StageError> {
        if let Body::Rows(rows) = &mut batch.body {
            for row in rows {
                let slot = self.field.get_mut(row).ok_or_else(|| StageError::Failed {
                    stage: "field_map".to_string(),
                    reason: format!("row has no field {}", self.field),
                })?;
                *slot = (self.func)(slot.take());
            }
        }
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn map_rows_rewrites_each_record() {
        let map = MapRows::new(|row| json!([row[0], "seen"]));
        let input = Batch::from_rows(vec![], vec![json!(["a"]), json!(["b"])]);
        let out = map.on_rows(input).unwrap();
        assert_eq!(
            out.body,
            Body::Rows(vec![json!(["a", "seen"]), json!(["b", "seen"])])
        );
    }

    #[tokio::test]
    async fn field_map_rewrites_the_addressed_field_only() {
        // weekday classification from the source pipeline
        let workday = FieldMap::new(1, |day| {
            if day == json!("星期日") || day == json!("星期六") {
                json!("休息日")
            } else {
                json!("工作日")
            }
        });
        let input = Batch::from_rows(
            vec!["name".into(), "day".into()],
            vec![json!(["a", "星期日"]), json!(["b", "星期一"])],
        );
        let out = workday.on_rows(input).unwrap();
        assert_eq!(
            out.body,
            Body::Rows(vec![json!(["a", "休息日"]), json!(["b", "工作日"])])
        );
    }

    #[tokio::test]
    async fn field_map_by_key_on_object_rows() {
        let reformat = FieldMap::new("date", |d| {
            json!(d.as_str().unwrap_or_default().replace('/', "-"))
        });
        let input = Batch::from_rows(vec![], vec![json!({"date": "2023/09/10"})]);
        let out = reformat.on_rows(input).unwrap();
        assert_eq!(out.body, Body::Rows(vec![json!({"date": "2023-09-10"})]));
    }

    #[tokio::test]
    async fn field_map_missing_field_fails() {
        let field_map = FieldMap::new(3, |v| v);
        let input = Batch::from_rows(vec![], vec![json!(["only", "two", "cells"])]);
        assert!(matches!(
            field_map.on_rows(input),
            Err(StageError::Failed { .. })
        ));
    }
}
