// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::Value;

use crate::batch::{Batch, Body};
use crate::errors::StageError;
use crate::traits::Stage;

type Predicate = dyn Fn(&Value) -> bool + Send + Sync;

/// Keeps the records a predicate accepts: whole rows for sequence bodies,
/// entry values for mapping bodies. Text passes through.
pub struct Filter {
    pred: Box<Predicate>,
}

impl Filter {
    pub fn new(pred: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        Self {
            pred: Box::new(pred),
        }
    }
}

#[async_trait]
impl Stage for Filter {
    fn name(&self) -> &str {
        "filter"
    }

    fn on_rows(&self, mut batch: Batch) -> Result<Batch, StageError> {
        if let Body::Rows(rows) = &mut batch.body {
            rows.retain(|row| (self.pred)(row));
        }
        Ok(batch)
    }

    fn on_map(&self, mut batch: Batch) -> Result<Batch, StageError> {
        if let Body::Map(map) = &mut batch.body {
            let kept: serde_json::Map<String, Value> = std::mem::take(map)
                .into_iter()
                .filter(|(_, value)| (self.pred)(value))
                .collect();
            *map = kept;
        }
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn rows_are_filtered_by_predicate() {
        let filter = Filter::new(|row| row[1] == json!("异常"));
        let input = Batch::from_rows(
            vec!["name".into(), "status".into()],
            vec![json!(["a", "异常"]), json!(["b", "ok"]), json!(["c", "异常"])],
        );
        let out = filter.on_rows(input).unwrap();
        assert_eq!(
            out.body,
            Body::Rows(vec![json!(["a", "异常"]), json!(["c", "异常"])])
        );
    }

    #[tokio::test]
    async fn map_entries_are_filtered_by_value() {
        let filter = Filter::new(|v| v.as_i64().unwrap_or(0) > 1);
        let mut map = serde_json::Map::new();
        map.insert("a".into(), json!(1));
        map.insert("b".into(), json!(2));
        let batch = Batch {
            body: Body::Map(map),
            ..Batch::new()
        };
        let out = filter.on_map(batch).unwrap();
        match out.body {
            Body::Map(map) => {
                assert_eq!(map.len(), 1);
                assert!(map.contains_key("b"));
            }
            other => panic!("expected map body, got {:?}", other),
        }
    }
}
