// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::Value;

use crate::batch::{Batch, Body};
use crate::errors::StageError;
use crate::traits::Stage;

/// Prints the batch to stdout and passes it downstream unchanged. Rows are
/// printed one per line (schema first, unless disabled), mappings and text
/// as-is.
pub struct StdoutSink {
    show_schema: bool,
}

impl StdoutSink {
    pub fn new() -> Self {
        Self { show_schema: true }
    }

    pub fn without_schema() -> Self {
        Self { show_schema: false }
    }
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Stage for StdoutSink {
    fn name(&self) -> &str {
        "stdout"
    }

    fn on_rows(&self, batch: Batch) -> Result<Batch, StageError> {
        if let Body::Rows(rows) = &batch.body {
            if self.show_schema && !batch.schema.is_empty() {
                println!("{}", batch.schema.join(","));
            }
            for row in rows {
                println!("{}", row);
            }
        }
        Ok(batch)
    }

    fn on_map(&self, batch: Batch) -> Result<Batch, StageError> {
        if let Body::Map(map) = &batch.body {
            println!("{}", Value::Object(map.clone()));
        }
        Ok(batch)
    }

    fn on_text(&self, batch: Batch) -> Result<Batch, StageError> {
        if let Body::Text(text) = &batch.body {
            println!("{}", text);
        }
        Ok(batch)
    }
}
