// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Source and sink collaborators.
//!
//! Sources ignore the (normally empty) batch pushed into them and load real
//! data instead; an optional merge function lets a source that is not the
//! head of a pipeline combine the incoming batch with what it loaded
//! (default: discard the input). Sinks perform their side effect and pass
//! the batch downstream unchanged, so delivery keeps working behind them.

pub mod csv;
pub mod json;

pub use csv::{CsvSink, CsvSource};
pub use json::{JsonSink, JsonSource};

use crate::batch::Batch;
use chrono::Local;
use std::path::{Path, PathBuf};

/// Combines the batch pushed into a source (`input`) with the batch it
/// loaded (`fresh`).
pub type MergeFn = dyn Fn(Batch, Batch) -> Batch + Send + Sync;

/// `report.csv` -> `report_2023-10-20_12-33-18.csv`. Used by sinks that
/// stamp their output files.
pub(crate) fn stamped_path(path: &Path) -> PathBuf {
    let stamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("out");
    let mut name = format!("{}_{}", stem, stamp);
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        name.push('.');
        name.push_str(ext);
    }
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamped_path_keeps_stem_and_extension() {
        let stamped = stamped_path(Path::new("/tmp/report.csv"));
        let name = stamped.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("report_"));
        assert!(name.ends_with(".csv"));
        assert_eq!(stamped.parent(), Some(Path::new("/tmp")));
    }
}
