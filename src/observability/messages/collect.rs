// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for fan-in group lifecycle events.

use crate::batch::GroupId;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};

/// A batch was buffered for a group that is still incomplete.
///
/// # Log Level
/// `debug!` - Diagnostic detail
pub struct GroupBuffered {
    pub group: GroupId,
    pub held: usize,
    pub expected: usize,
}

impl Display for GroupBuffered {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Group {} holding {}/{} batches",
            self.group, self.held, self.expected
        )
    }
}

impl StructuredLog for GroupBuffered {
    fn log(&self) {
        tracing::debug!(
            group = %self.group,
            held = self.held,
            expected = self.expected,
            "{}", self
        );
    }
}

/// A group reached its declared size and was merged downstream.
///
/// # Log Level
/// `debug!` - Diagnostic detail
pub struct GroupFlushed {
    pub group: GroupId,
    pub batches: usize,
    pub records: usize,
}

impl Display for GroupFlushed {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Group {} flushed: {} batches, {} records",
            self.group, self.batches, self.records
        )
    }
}

impl StructuredLog for GroupFlushed {
    fn log(&self) {
        tracing::debug!(
            group = %self.group,
            batches = self.batches,
            records = self.records,
            "{}", self
        );
    }
}

/// A collector was dropped while still holding incomplete groups. This is
/// the diagnosable form of the fan-out/fan-in mismatch: a group that never
/// receives its declared batch count never flushes.
///
/// # Log Level
/// `warn!` - Reliability gap worth surfacing
pub struct GroupStalled {
    pub group: GroupId,
    pub held: usize,
}

impl Display for GroupStalled {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Group {} never completed; {} batches were still buffered",
            self.group, self.held
        )
    }
}

impl StructuredLog for GroupStalled {
    fn log(&self) {
        tracing::warn!(group = %self.group, held = self.held, "{}", self);
    }
}
