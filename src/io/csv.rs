// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Delimited-text source and sink.
//!
//! The dialect is deliberately naive: comma-separated, no quoting, UTF-8.
//! First line is the schema, every following line an array-form row.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;

use crate::batch::{Batch, Body};
use crate::errors::StageError;
use crate::io::{stamped_path, MergeFn};
use crate::traits::{Emit, Stage};

/// Reads a CSV file into a row batch, ignoring the incoming batch unless a
/// merge function says otherwise. An empty file (or one with a header and no
/// data rows) passes the incoming batch through untouched.
pub struct CsvSource {
    path: PathBuf,
    skip: usize,
    merge: Option<Box<MergeFn>>,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            skip: 0,
            merge: None,
        }
    }

    /// Skip `n` leading lines before the header.
    pub fn with_skip(mut self, n: usize) -> Self {
        self.skip = n;
        self
    }

    /// Combine the incoming batch with the loaded one instead of discarding
    /// the input.
    pub fn with_merge(
        mut self,
        merge: impl Fn(Batch, Batch) -> Batch + Send + Sync + 'static,
    ) -> Self {
        self.merge = Some(Box::new(merge));
        self
    }

    fn parse(&self, raw: &str) -> Option<Batch> {
        let mut lines = raw.lines().skip(self.skip);
        let header = lines.next()?;
        let schema: Vec<String> = header.split(',').map(str::to_string).collect();
        let rows: Vec<Value> = lines
            .map(|line| {
                Value::Array(
                    line.split(',')
                        .map(|cell| Value::String(cell.to_string()))
                        .collect(),
                )
            })
            .collect();
        if rows.is_empty() {
            return None;
        }
        Some(Batch::from_rows(schema, rows))
    }
}

#[async_trait]
impl Stage for CsvSource {
    fn name(&self) -> &str {
        "csv_source"
    }

    async fn apply(&self, batch: Batch) -> Result<Emit, StageError> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        let out = match self.parse(&raw) {
            None => batch,
            Some(fresh) => match &self.merge {
                Some(merge) => merge(batch, fresh),
                None => fresh,
            },
        };
        Ok(Emit::Next(out))
    }
}

fn cell_text(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn render_rows(schema: &[String], rows: &[Value]) -> String {
    let mut out = String::new();
    out.push_str(&schema.join(","));
    out.push('\n');
    for row in rows {
        let line = match row {
            Value::Array(cells) => cells.iter().map(cell_text).collect::<Vec<_>>().join(","),
            Value::Object(fields) => schema
                .iter()
                .map(|field| fields.get(field).map(|c| cell_text(c)).unwrap_or_default())
                .collect::<Vec<_>>()
                .join(","),
            other => cell_text(other),
        };
        out.push_str(&line);
        out.push('\n');
    }
    out
}

/// Writes row and mapping batches as CSV and passes the batch downstream
/// unchanged. Text bodies pass through without writing.
pub struct CsvSink {
    path: PathBuf,
    timestamp: bool,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            timestamp: false,
        }
    }

    /// Stamp the file name with the current date and time at write time.
    pub fn with_timestamp(mut self) -> Self {
        self.timestamp = true;
        self
    }

    fn target(&self) -> PathBuf {
        if self.timestamp {
            stamped_path(&self.path)
        } else {
            self.path.clone()
        }
    }
}

#[async_trait]
impl Stage for CsvSink {
    fn name(&self) -> &str {
        "csv_sink"
    }

    async fn apply(&self, batch: Batch) -> Result<Emit, StageError> {
        let contents = match &batch.body {
            Body::Rows(rows) => Some(render_rows(&batch.schema, rows)),
            Body::Map(map) => {
                // one row, schema order
                let row = Value::Object(map.clone());
                Some(render_rows(&batch.schema, std::slice::from_ref(&row)))
            }
            Body::Text(_) => None,
        };
        if let Some(contents) = contents {
            tokio::fs::write(self.target(), contents).await?;
        }
        Ok(Emit::Next(batch))
    }
}
