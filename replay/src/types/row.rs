use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{Cell, TableId};

/// One row's ordered column values at a point in time.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowImage {
    pub values: Vec<Cell>,
}

impl RowImage {
    pub fn new(values: Vec<Cell>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<Vec<Cell>> for RowImage {
    fn from(values: Vec<Cell>) -> Self {
        Self { values }
    }
}

/// Kind of row change carried by a rows event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RowsEventKind {
    Write,
    Update,
    Delete,
}

impl fmt::Display for RowsEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Write => write!(f, "Write"),
            Self::Update => write!(f, "Update"),
            Self::Delete => write!(f, "Delete"),
        }
    }
}

/// Wire version of a rows event.
///
/// `V0` are the pre-GA rows events of MySQL 5.1. All versions share the same row image
/// semantics once decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RowsEventVersion {
    V0,
    #[default]
    V1,
    V2,
}

/// A write, update or delete rows event.
///
/// For [`RowsEventKind::Update`] the images are stored flat as `before, after, before, after`
/// and must be consumed as adjacent pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowsEvent {
    pub table_id: TableId,
    pub kind: RowsEventKind,
    #[serde(default)]
    pub version: RowsEventVersion,
    #[serde(default)]
    pub flags: u16,
    pub images: Vec<RowImage>,
}

impl RowsEvent {
    /// Returns `true` when an update event carries an unpaired image.
    pub fn has_unpaired_update_image(&self) -> bool {
        self.kind == RowsEventKind::Update && self.images.len() % 2 != 0
    }
}
