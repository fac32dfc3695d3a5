//! # fastloop - Selection-Specialized Record Readers
//!
//! Fast row-wise iteration over columnar datasets. Instead of looking fields
//! up by name on every record, a reader is built once for a selection of
//! fields: the selection is resolved, a record type specialized to it is
//! synthesized and compiled, and per-record access goes through typed,
//! pre-resolved slots.
//!
//! ## Modules
//!
//! - **catalog**: resolve explicit names, regexes or globs against a schema
//! - **sanitize**: derive accessor identifiers from raw field names
//! - **synth**: record definitions for the streaming and cached strategies
//! - **compiler**: turn definitions into shared accessor tables
//! - **cache**: compile each (dataset, selection, strategy) at most once
//! - **reader**: the advance/read iteration protocol
//!
//! ## Quick Start
//!
//! ```rust
//! use fastloop::{DatasetId, InMemoryDataset, ReaderOptions, Strategy, TypeCache};
//!
//! # fn main() -> anyhow::Result<()> {
//! let dataset = InMemoryDataset::builder(DatasetId::new("hsimple.root", "ntuple"))
//!     .leaf("px", "Float_t", [0.5f32, -1.25, 2.0])
//!     .leaf("py", "Float_t", [1.0f32, 0.0, -0.5])
//!     .leaf("random", "Double_t", [0.1f64, 0.7, 0.3])
//!     .build()?;
//!
//! let cache = TypeCache::new();
//!
//! // Lazy, one record at a time
//! let mut reader = cache.reader(&dataset, &ReaderOptions::default())?;
//! let random = reader.field::<f64>("random")?;
//! while reader.advance() {
//!     let _ = *reader.get(random);
//! }
//!
//! // Materialized once, whole columns available
//! let options = ReaderOptions::default()
//!     .with_pattern("p*")
//!     .with_strategy(Strategy::Cached);
//! let reader = cache.reader(&dataset, &options)?;
//! let px = reader.field::<f32>("px")?;
//! assert_eq!(reader.column(px), Some(&[0.5f32, -1.25, 2.0][..]));
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub mod cache;
pub mod catalog;
pub mod compiler;
pub mod dataset;
pub mod error;
pub mod reader;
pub mod sanitize;
pub mod synth;
pub mod types;
pub mod value;

// Re-export commonly used types for convenience
pub use cache::{TypeCache, TypeKey};
pub use compiler::{AccessorCompiler, CompiledRecord, Compiler};
pub use dataset::{Dataset, DatasetId, FieldDescriptor, InMemoryDataset, RowCursor};
pub use error::ReaderError;
pub use reader::{ColumnarReader, FieldHandle, Reader, Record, RowState, StreamingReader};
pub use types::{Field, ReaderOptions, Selection, Strategy};
pub use value::{Column, Scalar, Value, ValueKind};

/// Load an NDJSON file as a dataset identified by its path and `name`.
pub fn load_ndjson<P: AsRef<Path>>(path: P, name: &str) -> Result<InMemoryDataset> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;

    let id = DatasetId::new(path.display().to_string(), name);
    InMemoryDataset::from_ndjson(BufReader::new(file), id)
        .with_context(|| format!("Failed to load dataset from {}", path.display()))
}
