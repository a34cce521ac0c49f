// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Structured-document source and sink: whole batches as JSON.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::batch::Batch;
use crate::errors::StageError;
use crate::io::{stamped_path, MergeFn};
use crate::traits::{Emit, Stage};

/// Deserializes a full batch (schema, body, fan metadata) from a JSON
/// file, ignoring the incoming batch unless a merge function says otherwise.
pub struct JsonSource {
    path: PathBuf,
    merge: Option<Box<MergeFn>>,
}

impl JsonSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            merge: None,
        }
    }

    pub fn with_merge(
        mut self,
        merge: impl Fn(Batch, Batch) -> Batch + Send + Sync + 'static,
    ) -> Self {
        self.merge = Some(Box::new(merge));
        self
    }
}

#[async_trait]
impl Stage for JsonSource {
    fn name(&self) -> &str {
        "json_source"
    }

    async fn apply(&self, batch: Batch) -> Result<Emit, StageError> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        let fresh: Batch = serde_json::from_str(&raw).map_err(|e| StageError::Parse {
            stage: self.name().to_string(),
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })?;
        let out = match &self.merge {
            Some(merge) => merge(batch, fresh),
            None => fresh,
        };
        Ok(Emit::Next(out))
    }
}

/// Serializes each batch to a pretty-printed JSON file and passes it
/// downstream unchanged.
pub struct JsonSink {
    path: PathBuf,
    timestamp: bool,
}

impl JsonSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            timestamp: false,
        }
    }

    pub fn with_timestamp(mut self) -> Self {
        self.timestamp = true;
        self
    }
}

#[async_trait]
impl Stage for JsonSink {
    fn name(&self) -> &str {
        "json_sink"
    }

    async fn apply(&self, batch: Batch) -> Result<Emit, StageError> {
        let target = if self.timestamp {
            stamped_path(&self.path)
        } else {
            self.path.clone()
        };
        let contents = serde_json::to_string_pretty(&batch).map_err(|e| StageError::Failed {
            stage: self.name().to_string(),
            reason: e.to_string(),
        })?;
        tokio::fs::write(target, contents).await?;
        Ok(Emit::Next(batch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::Body;
    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn sink_then_source_round_trips_a_batch() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("batch.json");

        let batch = Batch::from_rows(
            vec!["name".into(), "day".into()],
            vec![json!(["a", "星期日"])],
        );
        JsonSink::new(&path).apply(batch.clone()).await.unwrap();

        let Emit::Next(back) = JsonSource::new(&path).apply(Batch::new()).await.unwrap() else {
            panic!("expected Next");
        };
        assert_eq!(back, batch);
    }

    #[tokio::test]
    async fn malformed_json_is_a_parse_failure() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        tokio::fs::write(&path, "{ not json").await.unwrap();

        assert!(matches!(
            JsonSource::new(&path).apply(Batch::new()).await,
            Err(StageError::Parse { .. })
        ));
    }

    #[tokio::test]
    async fn text_bodies_survive_the_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("text.json");

        let batch = Batch {
            body: Body::Text("raw payload".into()),
            ..Batch::new()
        };
        JsonSink::new(&path).apply(batch.clone()).await.unwrap();
        let Emit::Next(back) = JsonSource::new(&path).apply(Batch::new()).await.unwrap() else {
            panic!("expected Next");
        };
        assert_eq!(back, batch);
    }
}
