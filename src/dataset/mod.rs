//! Columnar dataset provider interface
//!
//! Readers only need three things from a dataset: its ordered field
//! descriptors, its entry count, and a cursor that moves one shared row
//! position for every field at once.

pub mod memory;
pub mod ndjson;

pub use memory::{DatasetBuilder, InMemoryDataset};

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a dataset, e.g. a file path plus a tree name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DatasetId {
    pub locator: String,
    pub name: String,
}

impl DatasetId {
    pub fn new(locator: impl Into<String>, name: impl Into<String>) -> Self {
        DatasetId {
            locator: locator.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.locator, self.name)
    }
}

/// Schema entry for one field of a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,

    /// Set for class-typed fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,

    /// Primitive type of the field's leaf
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leaf_type: Option<String>,
}

impl FieldDescriptor {
    pub fn leaf(name: impl Into<String>, leaf_type: impl Into<String>) -> Self {
        FieldDescriptor {
            name: name.into(),
            class_name: None,
            leaf_type: Some(leaf_type.into()),
        }
    }

    pub fn class(name: impl Into<String>, class_name: impl Into<String>) -> Self {
        FieldDescriptor {
            name: name.into(),
            class_name: Some(class_name.into()),
            leaf_type: None,
        }
    }
}

/// A columnar dataset readers can be built over.
pub trait Dataset {
    fn identity(&self) -> DatasetId;

    /// Field descriptors in native order.
    fn fields(&self) -> &[FieldDescriptor];

    /// Total number of entries, known before any pass.
    fn entry_count(&self) -> usize;

    /// Open a cursor positioned before the first entry.
    fn cursor(&self) -> Box<dyn RowCursor + '_>;

    /// Position of a field in `fields()`, used as the cursor column.
    fn column_index(&self, name: &str) -> Option<usize> {
        self.fields().iter().position(|f| f.name == name)
    }
}

/// Shared row position over all columns of a dataset.
pub trait RowCursor {
    /// Move to the next entry. Returns false once the dataset is exhausted.
    fn advance(&mut self) -> bool;

    /// Value of `column` at the current entry.
    ///
    /// Only valid after `advance` returned true; the returned reference may
    /// point into storage reused by the next `advance`.
    fn read(&self, column: usize) -> &Value;
}
