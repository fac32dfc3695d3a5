use crate::compiler::CompiledRecord;
use crate::dataset::{Dataset, RowCursor};
use crate::error::Result;
use crate::reader::{bind_columns, kind_violation, FieldHandle, Record};
use crate::value::{Scalar, Value};
use std::rc::Rc;

/// Lazy reader: fields are read from the dataset cursor only when asked for.
///
/// Values borrow the reader, so none can be held across `advance`; use
/// [`snapshot`](Self::snapshot) to keep a record.
pub struct StreamingReader<'d> {
    record: Rc<CompiledRecord>,
    cursor: Box<dyn RowCursor + 'd>,
    bindings: Vec<usize>,
    entries: usize,
}

impl<'d> StreamingReader<'d> {
    pub(crate) fn new(record: Rc<CompiledRecord>, dataset: &'d dyn Dataset) -> Result<Self> {
        let bindings = bind_columns(&record, dataset)?;
        Ok(StreamingReader {
            record,
            cursor: dataset.cursor(),
            bindings,
            entries: dataset.entry_count(),
        })
    }

    #[inline]
    pub fn advance(&mut self) -> bool {
        self.cursor.advance()
    }

    pub fn entry_count(&self) -> usize {
        self.entries
    }

    pub fn record_type(&self) -> &Rc<CompiledRecord> {
        &self.record
    }

    /// Current value of a field.
    ///
    /// # Panics
    /// Panics unless the last `advance` returned true.
    #[inline]
    pub fn get<T: Scalar>(&self, handle: FieldHandle<T>) -> &T {
        let slot = handle.slot_in(&self.record);
        match T::from_value(self.value(slot)) {
            Some(value) => value,
            None => kind_violation(&self.record, slot, T::KIND),
        }
    }

    #[inline]
    fn value(&self, slot: usize) -> &Value {
        self.cursor.read(self.bindings[slot])
    }

    pub fn snapshot(&self) -> Record {
        Record::new(
            self.record
                .accessors()
                .iter()
                .enumerate()
                .map(|(slot, a)| (a.identifier.clone(), self.value(slot).clone()))
                .collect(),
        )
    }
}
