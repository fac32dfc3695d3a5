//! Readers: compiled record types bound to a dataset.
//!
//! Iteration is pull-based:
//!
//! ```rust
//! use fastloop::{DatasetId, InMemoryDataset, ReaderOptions, TypeCache};
//!
//! # fn main() -> anyhow::Result<()> {
//! let dataset = InMemoryDataset::builder(DatasetId::new("hsimple.root", "ntuple"))
//!     .leaf("px", "Float_t", [1.0f32, 2.0, 3.0])
//!     .leaf("random", "Double_t", [0.1f64, 0.2, 0.3])
//!     .build()?;
//!
//! let cache = TypeCache::new();
//! let mut reader = cache.reader(&dataset, &ReaderOptions::default().with_pattern("p*"))?;
//! let px = reader.field::<f32>("px")?;
//!
//! let mut sum = 0.0;
//! while reader.advance() {
//!     sum += *reader.get(px);
//! }
//! assert_eq!(sum, 6.0);
//! # Ok(())
//! # }
//! ```

pub mod columnar;
pub mod streaming;

pub use columnar::{ColumnSet, ColumnarReader, RowState};
pub use streaming::StreamingReader;

use crate::cache::{TypeCache, TypeKey};
use crate::catalog::resolve_fields;
use crate::compiler::{CompiledRecord, Compiler};
use crate::dataset::Dataset;
use crate::error::{ReaderError, Result};
use crate::types::{Field, ReaderOptions, Strategy};
use crate::value::{Scalar, Value, ValueKind};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::marker::PhantomData;
use std::rc::Rc;

/// Typed, pre-resolved accessor slot.
///
/// Only valid on readers sharing the compiled record it was resolved
/// against; using it on any other reader panics.
pub struct FieldHandle<T> {
    record: u64,
    slot: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> FieldHandle<T> {
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Slot of this handle in `record`.
    ///
    /// # Panics
    /// Panics if the handle was resolved against a different record type.
    #[inline]
    pub(crate) fn slot_in(&self, record: &CompiledRecord) -> usize {
        if self.record != record.id() {
            foreign_handle(record, self.slot);
        }
        self.slot
    }
}

impl<T> Clone for FieldHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for FieldHandle<T> {}

impl<T> std::fmt::Debug for FieldHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldHandle")
            .field("record", &self.record)
            .field("slot", &self.slot)
            .finish()
    }
}

impl CompiledRecord {
    /// Resolve a typed handle for the accessor named `identifier`.
    pub fn handle<T: Scalar>(&self, identifier: &str) -> Result<FieldHandle<T>> {
        let slot = self
            .slot(identifier)
            .ok_or_else(|| ReaderError::unknown_field(identifier))?;

        let actual = self.accessors()[slot].kind;
        if actual != T::KIND {
            return Err(ReaderError::type_mismatch(
                identifier,
                T::KIND.to_str(),
                actual.to_str(),
            ));
        }

        Ok(FieldHandle {
            record: self.id(),
            slot,
            _marker: PhantomData,
        })
    }
}

/// Owned copy of one record's selected values, in field order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    values: Vec<(String, Value)>,
}

impl Record {
    pub(crate) fn new(values: Vec<(String, Value)>) -> Self {
        Record { values }
    }

    pub fn get(&self, identifier: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(name, _)| name == identifier)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in &self.values {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// A reader of either strategy.
pub enum Reader<'d> {
    Streaming(StreamingReader<'d>),
    Columnar(ColumnarReader),
}

impl<'d> Reader<'d> {
    /// Resolve the selection, obtain the compiled record type from `cache`,
    /// and bind it to `dataset`.
    ///
    /// For the cached strategy this runs the materializing pass unless the
    /// cache already holds columns for the same key.
    pub fn open<C: Compiler>(
        cache: &TypeCache<C>,
        dataset: &'d dyn Dataset,
        options: &ReaderOptions,
    ) -> Result<Self> {
        let selection = options.selection();
        let fields = resolve_fields(dataset, &selection)?;
        let key = TypeKey::new(dataset.identity(), selection, options.strategy);

        let record = cache.get_or_compile(&key, &fields)?;
        if record.fields() != fields.as_slice() {
            return Err(ReaderError::schema(
                dataset.identity().to_string(),
                format!(
                    "schema no longer matches compiled record {}",
                    record.type_name()
                ),
            ));
        }

        match options.strategy {
            Strategy::Streaming => Ok(Reader::Streaming(StreamingReader::new(record, dataset)?)),
            Strategy::Cached => {
                let columns = cache.columns(&key, &record, dataset, options.reuse_columns)?;
                Ok(Reader::Columnar(ColumnarReader::new(record, columns)))
            }
        }
    }

    /// Move to the next record. Returns false once exhausted.
    #[inline]
    pub fn advance(&mut self) -> bool {
        match self {
            Reader::Streaming(r) => r.advance(),
            Reader::Columnar(r) => r.advance(),
        }
    }

    pub fn field<T: Scalar>(&self, identifier: &str) -> Result<FieldHandle<T>> {
        self.record_type().handle(identifier)
    }

    /// Current value of a field.
    ///
    /// # Panics
    /// Panics unless the last `advance` returned true.
    #[inline]
    pub fn get<T: Scalar>(&self, handle: FieldHandle<T>) -> &T {
        match self {
            Reader::Streaming(r) => r.get(handle),
            Reader::Columnar(r) => r.get(handle),
        }
    }

    /// Whole column of a field; only cached readers have one.
    pub fn column<T: Scalar>(&self, handle: FieldHandle<T>) -> Option<&[T]> {
        match self {
            Reader::Streaming(_) => None,
            Reader::Columnar(r) => Some(r.column(handle)),
        }
    }

    pub fn snapshot(&self) -> Record {
        match self {
            Reader::Streaming(r) => r.snapshot(),
            Reader::Columnar(r) => r.snapshot(),
        }
    }

    pub fn record_type(&self) -> &Rc<CompiledRecord> {
        match self {
            Reader::Streaming(r) => r.record_type(),
            Reader::Columnar(r) => r.record_type(),
        }
    }

    pub fn fields(&self) -> &[Field] {
        self.record_type().fields()
    }

    pub fn strategy(&self) -> Strategy {
        self.record_type().strategy()
    }

    pub fn entry_count(&self) -> usize {
        match self {
            Reader::Streaming(r) => r.entry_count(),
            Reader::Columnar(r) => r.entry_count(),
        }
    }

    /// Iterate owned snapshots of the remaining records.
    pub fn into_records(self) -> Records<'d> {
        Records { reader: self }
    }
}

/// Iterator of [`Record`] snapshots, see [`Reader::into_records`].
pub struct Records<'d> {
    reader: Reader<'d>,
}

impl Iterator for Records<'_> {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        if self.reader.advance() {
            Some(self.reader.snapshot())
        } else {
            None
        }
    }
}

/// Dataset column backing each accessor of `record`.
pub(crate) fn bind_columns(record: &CompiledRecord, dataset: &dyn Dataset) -> Result<Vec<usize>> {
    record
        .accessors()
        .iter()
        .map(|accessor| {
            dataset.column_index(&accessor.raw_name).ok_or_else(|| {
                ReaderError::schema(
                    &accessor.raw_name,
                    format!("no such field in dataset {}", dataset.identity()),
                )
            })
        })
        .collect()
}

#[cold]
fn foreign_handle(record: &CompiledRecord, slot: usize) -> ! {
    panic!(
        "field handle for slot {} was resolved against another record type, not {}",
        slot,
        record.type_name()
    )
}

#[cold]
pub(crate) fn kind_violation(record: &CompiledRecord, slot: usize, requested: ValueKind) -> ! {
    let accessor = &record.accessors()[slot];
    panic!(
        "accessor `{}` of {} holds {} values, read as {}",
        accessor.identifier,
        record.type_name(),
        accessor.kind.to_str(),
        requested.to_str()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{DatasetId, InMemoryDataset};
    use serde_json::json;

    fn ntuple(entries: usize) -> InMemoryDataset {
        InMemoryDataset::builder(DatasetId::new("hsimple.root", "ntuple"))
            .leaf("px", "Float_t", (0..entries).map(|i| i as f32 * 0.5))
            .leaf("py", "Float_t", (0..entries).map(|i| i as f32 * -1.0))
            .leaf("n", "Int_t", (0..entries).map(|i| i as i32))
            .build()
            .unwrap()
    }

    #[test]
    fn test_streaming_reads_current_entry() {
        let dataset = ntuple(3);
        let cache = TypeCache::new();
        let mut reader = cache.reader(&dataset, &ReaderOptions::default()).unwrap();
        let n = reader.field::<i32>("n").unwrap();

        let mut seen = Vec::new();
        while reader.advance() {
            seen.push(*reader.get(n));
        }
        assert_eq!(seen, [0, 1, 2]);
        assert!(reader.column(n).is_none());
    }

    #[test]
    fn test_columnar_state_and_columns() {
        let dataset = ntuple(2);
        let cache = TypeCache::new();
        let options = ReaderOptions::default().with_strategy(Strategy::Cached);
        let mut reader = cache.reader(&dataset, &options).unwrap();
        let px = reader.field::<f32>("px").unwrap();

        assert_eq!(reader.column(px), Some(&[0.0f32, 0.5][..]));

        let Reader::Columnar(ref inner) = reader else {
            panic!("Expected columnar reader");
        };
        assert_eq!(inner.row_state(), RowState::BeforeFirst);

        assert!(reader.advance());
        assert_eq!(*reader.get(px), 0.0);
        assert!(reader.advance());
        assert_eq!(*reader.get(px), 0.5);
        assert!(!reader.advance());
        assert!(!reader.advance());
    }

    #[test]
    fn test_handle_resolution_errors() {
        let dataset = ntuple(1);
        let cache = TypeCache::new();
        let reader = cache.reader(&dataset, &ReaderOptions::default()).unwrap();

        assert!(matches!(
            reader.field::<f32>("pz"),
            Err(ReaderError::UnknownField { .. })
        ));
        assert!(matches!(
            reader.field::<f64>("px"),
            Err(ReaderError::TypeMismatch { expected: "f64", actual: "f32", .. })
        ));
    }

    #[test]
    fn test_snapshot_outlives_step() {
        let dataset = ntuple(2);
        let cache = TypeCache::new();
        let mut reader = cache.reader(&dataset, &ReaderOptions::default()).unwrap();

        assert!(reader.advance());
        let first = reader.snapshot();
        assert!(reader.advance());
        let second = reader.snapshot();

        assert_eq!(first.get("n"), Some(&Value::I32(0)));
        assert_eq!(second.get("n"), Some(&Value::I32(1)));
        assert_eq!(first.len(), 3);
        assert_eq!(
            serde_json::to_value(&second).unwrap(),
            json!({"px": 0.5, "py": -1.0, "n": 1})
        );
    }

    #[test]
    fn test_into_records_supports_early_stop() {
        let dataset = ntuple(20);
        let cache = TypeCache::new();
        let options = ReaderOptions::default().with_fields(["n"]);

        let records: Vec<Record> = cache
            .reader(&dataset, &options)
            .unwrap()
            .into_records()
            .take(10)
            .collect();

        assert_eq!(records.len(), 10);
        assert_eq!(records[9].get("n"), Some(&Value::I32(9)));
        assert!(records[0].get("px").is_none());
    }

    #[test]
    fn test_composite_fields() {
        let dataset = InMemoryDataset::builder(DatasetId::new("mem", "events"))
            .class("event", "Event", [json!({"id": 1}), json!({"id": 2})])
            .build()
            .unwrap();

        let cache = TypeCache::new();
        let options = ReaderOptions::default().with_strategy(Strategy::Cached);
        let mut reader = cache.reader(&dataset, &options).unwrap();
        let event = reader.field::<serde_json::Value>("event").unwrap();

        assert!(reader.advance());
        assert!(reader.advance());
        assert_eq!(reader.get(event)["id"], 2);
        assert_eq!(reader.fields()[0].type_name, "Event");
    }

    #[test]
    fn test_handle_shared_by_readers_of_one_record() {
        let dataset = ntuple(2);
        let cache = TypeCache::new();
        let options = ReaderOptions::default().with_fields(["py"]);

        let first = cache.reader(&dataset, &options).unwrap();
        let py = first.field::<f32>("py").unwrap();
        assert_eq!(py.slot(), 0);

        let mut second = cache.reader(&dataset, &options).unwrap();
        assert!(second.advance());
        assert!(second.advance());
        assert_eq!(*second.get(py), -1.0);
    }

    #[test]
    #[should_panic(expected = "resolved against another record type")]
    fn test_handle_from_other_selection_panics() {
        let dataset = ntuple(2);
        let cache = TypeCache::new();

        let narrow = cache
            .reader(&dataset, &ReaderOptions::default().with_fields(["py"]))
            .unwrap();
        let py = narrow.field::<f32>("py").unwrap();

        // slot 0 is `px` here, of the same kind as `py`
        let mut wide = cache
            .reader(&dataset, &ReaderOptions::default().with_fields(["px", "py"]))
            .unwrap();
        assert!(wide.advance());
        wide.get(py);
    }

    #[test]
    #[should_panic(expected = "resolved against another record type")]
    fn test_handle_from_other_selection_panics_on_column() {
        let dataset = ntuple(2);
        let cache = TypeCache::new();
        let cached = |names: &[&str]| {
            ReaderOptions::default()
                .with_fields(names.iter().copied())
                .with_strategy(Strategy::Cached)
        };

        let narrow = cache.reader(&dataset, &cached(&["py"])).unwrap();
        let py = narrow.field::<f32>("py").unwrap();

        let wide = cache.reader(&dataset, &cached(&["px", "py"])).unwrap();
        wide.column(py);
    }

    #[test]
    fn test_unknown_explicit_names_select_nothing() {
        let dataset = ntuple(2);
        let cache = TypeCache::new();
        let mut reader = cache
            .reader(&dataset, &ReaderOptions::default().with_fields(["px", "pt"]))
            .unwrap();

        let identifiers: Vec<_> = reader.fields().iter().map(|f| f.identifier.as_str()).collect();
        assert_eq!(identifiers, ["px"]);
        assert!(matches!(
            reader.field::<f32>("pt"),
            Err(ReaderError::UnknownField { .. })
        ));

        let px = reader.field::<f32>("px").unwrap();
        assert!(reader.advance());
        assert!(reader.advance());
        assert_eq!(*reader.get(px), 0.5);
    }

    #[test]
    #[should_panic]
    fn test_columnar_read_before_advance_panics() {
        let dataset = ntuple(1);
        let cache = TypeCache::new();
        let options = ReaderOptions::default().with_strategy(Strategy::Cached);
        let reader = cache.reader(&dataset, &options).unwrap();
        let px = reader.field::<f32>("px").unwrap();
        reader.get(px);
    }
}
