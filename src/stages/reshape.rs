// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::Value;

use crate::batch::{Batch, Body};
use crate::errors::StageError;
use crate::traits::{Emit, Stage};

type ReshapeFn = dyn Fn(Batch) -> Result<Batch, StageError> + Send + Sync;

/// Whole-batch rewrite: applies an arbitrary function to the batch
/// regardless of body shape.
pub struct Reshape {
    func: Box<ReshapeFn>,
}

impl Reshape {
    pub fn new(func: impl Fn(Batch) -> Result<Batch, StageError> + Send + Sync + 'static) -> Self {
        Self {
            func: Box::new(func),
        }
    }
}

#[async_trait]
impl Stage for Reshape {
    fn name(&self) -> &str {
        "reshape"
    }

    async fn apply(&self, batch: Batch) -> Result<Emit, StageError> {
        Ok(Emit::Next((self.func)(batch)?))
    }
}

/// Flips row form using the schema: array-form rows become object-form rows
/// keyed by field name, object-form rows become array-form rows in schema
/// order. The first row decides which direction applies; an empty batch is
/// untouched. An object row missing a schema field is a transform failure.
pub struct RowFormat;

impl RowFormat {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RowFormat {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Stage for RowFormat {
    fn name(&self) -> &str {
        "row_format"
    }

    fn on_rows(&self, mut batch: Batch) -> Result<Batch, StageError> {
        let Body::Rows(rows) = &batch.body else {
            return Ok(batch);
        };
        let Some(first) = rows.first() else {
            return Ok(batch);
        };

        let converted: Result<Vec<Value>, StageError> = if first.is_array() {
            rows.iter()
                .map(|row| {
                    let cells = row.as_array().cloned().unwrap_or_default();
                    let object: serde_json::Map<String, Value> = batch
                        .schema
                        .iter()
                        .cloned()
                        .zip(cells)
                        .collect();
                    Ok(Value::Object(object))
                })
                .collect()
        } else {
            rows.iter()
                .map(|row| {
                    let cells: Result<Vec<Value>, StageError> = batch
                        .schema
                        .iter()
                        .map(|field| {
                            row.get(field).cloned().ok_or_else(|| StageError::Failed {
                                stage: "row_format".to_string(),
                                reason: format!("row has no field '{}'", field),
                            })
                        })
                        .collect();
                    Ok(Value::Array(cells?))
                })
                .collect()
        };

        batch.body = Body::Rows(converted?);
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn reshape_rewrites_the_whole_batch() {
        let reshape = Reshape::new(|mut batch| {
            batch.body = Body::Text("flattened".into());
            Ok(batch)
        });
        let input = Batch::from_rows(vec![], vec![json!([1])]);
        match reshape.apply(input).await.unwrap() {
            Emit::Next(out) => assert_eq!(out.body, Body::Text("flattened".into())),
            other => panic!("expected Next, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn row_format_round_trips_through_both_forms() {
        let schema = vec!["name".to_string(), "day".to_string()];
        let arrays = Batch::from_rows(
            schema.clone(),
            vec![json!(["a", "星期日"]), json!(["b", "星期一"])],
        );

        let objects = RowFormat::new().on_rows(arrays.clone()).unwrap();
        assert_eq!(
            objects.body,
            Body::Rows(vec![
                json!({"name": "a", "day": "星期日"}),
                json!({"name": "b", "day": "星期一"}),
            ])
        );

        let back = RowFormat::new().on_rows(objects).unwrap();
        assert_eq!(back.body, arrays.body);
    }

    #[tokio::test]
    async fn empty_batch_is_untouched() {
        let input = Batch::from_rows(vec!["a".into()], vec![]);
        let out = RowFormat::new().on_rows(input.clone()).unwrap();
        assert_eq!(out, input);
    }

    #[tokio::test]
    async fn object_row_missing_schema_field_fails() {
        let input = Batch::from_rows(
            vec!["name".into(), "day".into()],
            vec![json!({"name": "a"})],
        );
        assert!(matches!(
            RowFormat::new().on_rows(input),
            Err(StageError::Failed { .. })
        ));
    }
}
