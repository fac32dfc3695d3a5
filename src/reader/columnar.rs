use crate::compiler::CompiledRecord;
use crate::dataset::Dataset;
use crate::error::{ReaderError, Result};
use crate::reader::{bind_columns, kind_violation, FieldHandle, Record};
use crate::value::{Column, Scalar};
use std::rc::Rc;

/// Position of a cached-columnar reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowState {
    BeforeFirst,
    AtRow(usize),
    /// Terminal: a reader makes a single pass.
    Exhausted,
}

impl RowState {
    #[inline]
    pub fn next(self, entries: usize) -> Self {
        match self {
            RowState::BeforeFirst if entries > 0 => RowState::AtRow(0),
            RowState::AtRow(i) if i + 1 < entries => RowState::AtRow(i + 1),
            _ => RowState::Exhausted,
        }
    }

    pub fn index(self) -> Option<usize> {
        match self {
            RowState::AtRow(i) => Some(i),
            _ => None,
        }
    }
}

/// Every selected field of a dataset, materialized in one pass.
#[derive(Debug)]
pub struct ColumnSet {
    entries: usize,
    columns: Vec<Column>,
}

impl ColumnSet {
    /// Fill one column per accessor from a single shared cursor, so row `i`
    /// of every column comes from the same entry.
    pub fn materialize(record: &CompiledRecord, dataset: &dyn Dataset) -> Result<Self> {
        let entries = dataset.entry_count();
        let bindings = bind_columns(record, dataset)?;

        let mut columns: Vec<Column> = record
            .accessors()
            .iter()
            .map(|accessor| Column::with_capacity(accessor.kind, entries))
            .collect();

        let mut rows = 0;
        let mut cursor = dataset.cursor();
        while cursor.advance() {
            for ((column, &index), accessor) in
                columns.iter_mut().zip(&bindings).zip(record.accessors())
            {
                let value = cursor.read(index);
                if !column.push(value) {
                    return Err(ReaderError::schema(
                        &accessor.raw_name,
                        format!(
                            "expected {} value at entry {}, found {}",
                            accessor.kind.to_str(),
                            rows,
                            value.kind().to_str()
                        ),
                    ));
                }
            }
            rows += 1;
        }

        if rows != entries {
            return Err(ReaderError::schema(
                dataset.identity().to_string(),
                format!("dataset reported {} entries but yielded {}", entries, rows),
            ));
        }

        tracing::info!(
            type_name = record.type_name(),
            entries,
            columns = columns.len(),
            "materialized columns"
        );

        Ok(ColumnSet { entries, columns })
    }

    pub fn entry_count(&self) -> usize {
        self.entries
    }

    pub fn column(&self, slot: usize) -> &Column {
        &self.columns[slot]
    }
}

/// Index-based reader over materialized columns.
pub struct ColumnarReader {
    record: Rc<CompiledRecord>,
    columns: Rc<ColumnSet>,
    state: RowState,
}

impl ColumnarReader {
    pub(crate) fn new(record: Rc<CompiledRecord>, columns: Rc<ColumnSet>) -> Self {
        ColumnarReader {
            record,
            columns,
            state: RowState::BeforeFirst,
        }
    }

    #[inline]
    pub fn advance(&mut self) -> bool {
        self.state = self.state.next(self.columns.entries);
        matches!(self.state, RowState::AtRow(_))
    }

    pub fn row_state(&self) -> RowState {
        self.state
    }

    pub fn entry_count(&self) -> usize {
        self.columns.entries
    }

    pub fn record_type(&self) -> &Rc<CompiledRecord> {
        &self.record
    }

    /// Shared column storage; equal for readers that reused a pass.
    pub fn column_set(&self) -> &Rc<ColumnSet> {
        &self.columns
    }

    /// The whole column of a field.
    #[inline]
    pub fn column<T: Scalar>(&self, handle: FieldHandle<T>) -> &[T] {
        let slot = handle.slot_in(&self.record);
        match T::from_column(self.columns.column(slot)) {
            Some(values) => values,
            None => kind_violation(&self.record, slot, T::KIND),
        }
    }

    /// Value of a field at the current row.
    ///
    /// # Panics
    /// Panics unless the last `advance` returned true.
    #[inline]
    pub fn get<T: Scalar>(&self, handle: FieldHandle<T>) -> &T {
        &self.column(handle)[self.current_row()]
    }

    pub fn snapshot(&self) -> Record {
        let row = self.current_row();
        Record::new(
            self.record
                .accessors()
                .iter()
                .enumerate()
                .map(|(slot, a)| (a.identifier.clone(), self.columns.column(slot).value_at(row)))
                .collect(),
        )
    }

    #[inline]
    fn current_row(&self) -> usize {
        match self.state.index() {
            Some(row) => row,
            None => no_current_row(self.state),
        }
    }
}

#[cold]
fn no_current_row(state: RowState) -> ! {
    panic!("no current row in state {:?}; read only after advance returns true", state)
}
