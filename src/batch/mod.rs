// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Record batches: the unit of data pushed through the stage graph.
//!
//! A [`Batch`] carries an optional schema (ordered field names), a [`Body`]
//! holding exactly one active shape, and the fan-out metadata a downstream
//! [`Collector`](crate::stages::Collector) uses to correlate sibling batches.
//! `Clone` on a batch is the deep copy the engine performs before delivering
//! down more than one edge.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identity shared by all sibling batches produced by one fan-out event.
///
/// `GroupId::NONE` means "no active fan-out": a consumer expecting a complete
/// group treats such a batch as a group of one. Fresh identities come from a
/// process-wide counter so two fan-out events can never collide, even across
/// unrelated pipelines running in the same process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct GroupId(u64);

static NEXT_GROUP: AtomicU64 = AtomicU64::new(1);

impl GroupId {
    /// No active fan-out.
    pub const NONE: GroupId = GroupId(0);

    /// Mint a fresh, process-unique identity.
    pub fn next() -> GroupId {
        GroupId(NEXT_GROUP.fetch_add(1, Ordering::Relaxed))
    }

    pub fn is_none(&self) -> bool {
        *self == GroupId::NONE
    }
}

impl std::fmt::Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Fan-out metadata carried by every batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FanGroup {
    /// Identity of the fan-out event this batch belongs to.
    pub group: GroupId,
    /// Number of sibling batches expected under `group`. Always >= 1.
    pub size: usize,
    /// This batch's 1-based position within the group. Informational; the
    /// merge is order-insensitive.
    pub index: usize,
}

impl Default for FanGroup {
    fn default() -> Self {
        Self {
            group: GroupId::NONE,
            size: 1,
            index: 1,
        }
    }
}

/// The body of a batch. Exactly one shape is active at a time; stages
/// dispatch on the variant and pass unhandled shapes through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Body {
    /// Ordered sequence of records. Each record is an array-form row
    /// (`["a", "星期日"]`) or an object-form row (`{"name": "a"}`).
    Rows(Vec<Value>),
    /// Keyed mapping of record key to value.
    Map(serde_json::Map<String, Value>),
    /// Raw text.
    Text(String),
}

impl Body {
    pub fn is_rows(&self) -> bool {
        matches!(self, Body::Rows(_))
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Body::Map(_))
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Body::Text(_))
    }

    /// Number of records in the active shape (text counts as one).
    pub fn len(&self) -> usize {
        match self {
            Body::Rows(rows) => rows.len(),
            Body::Map(map) => map.len(),
            Body::Text(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Body::Rows(rows) => rows.is_empty(),
            Body::Map(map) => map.is_empty(),
            Body::Text(text) => text.is_empty(),
        }
    }
}

impl Default for Body {
    fn default() -> Self {
        Body::Rows(Vec::new())
    }
}

/// The unit of data moving through the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Batch {
    /// Ordered field names. May be empty (unset).
    #[serde(default)]
    pub schema: Vec<String>,
    #[serde(default)]
    pub body: Body,
    #[serde(default)]
    pub fan: FanGroup,
}

impl Batch {
    /// Fresh batch: empty schema, empty row body, default fan metadata.
    /// This is what a pipeline root receives at start.
    pub fn new() -> Batch {
        Batch::default()
    }

    /// Batch with a schema and array-form rows.
    pub fn from_rows(schema: Vec<String>, rows: Vec<Value>) -> Batch {
        Batch {
            schema,
            body: Body::Rows(rows),
            fan: FanGroup::default(),
        }
    }
}

/// Addresses one field of a record, by position (array-form rows) or by key
/// (object-form rows and keyed mappings).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRef {
    Index(usize),
    Key(String),
}

impl FieldRef {
    /// Borrow the addressed field of a row, if present and the row has a
    /// compatible form.
    pub fn get<'a>(&self, row: &'a Value) -> Option<&'a Value> {
        match self {
            FieldRef::Index(i) => row.as_array()?.get(*i),
            FieldRef::Key(k) => row.as_object()?.get(k),
        }
    }

    pub fn get_mut<'a>(&self, row: &'a mut Value) -> Option<&'a mut Value> {
        match self {
            FieldRef::Index(i) => row.as_array_mut()?.get_mut(*i),
            FieldRef::Key(k) => row.as_object_mut()?.get_mut(k),
        }
    }
}

impl std::fmt::Display for FieldRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldRef::Index(i) => write!(f, "[{}]", i),
            FieldRef::Key(k) => write!(f, "['{}']", k),
        }
    }
}

impl From<usize> for FieldRef {
    fn from(i: usize) -> Self {
        FieldRef::Index(i)
    }
}

impl From<&str> for FieldRef {
    fn from(k: &str) -> Self {
        FieldRef::Key(k.to_string())
    }
}

impl From<String> for FieldRef {
    fn from(k: String) -> Self {
        FieldRef::Key(k)
    }
}
