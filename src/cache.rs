//! Memoized record types.
//!
//! A [`TypeCache`] is owned by the application and keyed by the exact
//! structure of a request: dataset identity, selection and strategy. Keying
//! on the dataset alone would hand a record compiled for one selection to a
//! reader built for another.

use crate::compiler::{AccessorCompiler, CompiledRecord, Compiler};
use crate::dataset::{Dataset, DatasetId};
use crate::error::Result;
use crate::reader::{ColumnSet, Reader};
use crate::synth::synthesize;
use crate::types::{Field, ReaderOptions, Selection, Strategy};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

/// Identity of a compiled record type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeKey {
    pub dataset: DatasetId,
    pub selection: Selection,
    pub strategy: Strategy,
}

impl TypeKey {
    pub fn new(dataset: DatasetId, selection: Selection, strategy: Strategy) -> Self {
        TypeKey {
            dataset,
            selection,
            strategy,
        }
    }
}

/// Compiles each distinct [`TypeKey`] at most once.
///
/// Failed compilations are not remembered; the next request for the same key
/// synthesizes again.
pub struct TypeCache<C = AccessorCompiler> {
    compiler: C,
    records: RefCell<HashMap<TypeKey, Rc<CompiledRecord>>>,
    columns: RefCell<HashMap<TypeKey, Rc<ColumnSet>>>,
    compilations: Cell<usize>,
    materializations: Cell<usize>,
    next_type_id: Cell<usize>,
}

impl TypeCache<AccessorCompiler> {
    pub fn new() -> Self {
        Self::with_compiler(AccessorCompiler)
    }
}

impl Default for TypeCache<AccessorCompiler> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Compiler> TypeCache<C> {
    pub fn with_compiler(compiler: C) -> Self {
        TypeCache {
            compiler,
            records: RefCell::new(HashMap::new()),
            columns: RefCell::new(HashMap::new()),
            compilations: Cell::new(0),
            materializations: Cell::new(0),
            next_type_id: Cell::new(0),
        }
    }

    /// Build a reader over `dataset`, see [`Reader::open`].
    pub fn reader<'d>(&self, dataset: &'d dyn Dataset, options: &ReaderOptions) -> Result<Reader<'d>> {
        Reader::open(self, dataset, options)
    }

    /// The compiled record for `key`, synthesizing and compiling it from
    /// `fields` on first request.
    pub fn get_or_compile(&self, key: &TypeKey, fields: &[Field]) -> Result<Rc<CompiledRecord>> {
        let cached = self.records.borrow().get(key).cloned();
        if let Some(record) = cached {
            tracing::trace!(type_name = record.type_name(), "record type cache hit");
            return Ok(record);
        }

        let id = self.next_type_id.get();
        self.next_type_id.set(id + 1);

        let definition = synthesize(&format!("Record{}", id), fields, key.strategy)?;

        self.compilations.set(self.compilations.get() + 1);
        let record = match self.compiler.compile(&definition) {
            Ok(record) => Rc::new(record),
            Err(e) => {
                tracing::warn!(
                    dataset = %key.dataset,
                    type_name = %definition.type_name,
                    error = %e,
                    "record type failed to compile"
                );
                return Err(e);
            }
        };

        self.records
            .borrow_mut()
            .insert(key.clone(), Rc::clone(&record));
        Ok(record)
    }

    /// Materialized columns for a cached-strategy key.
    ///
    /// With `reuse` the first pass is kept and shared by later readers;
    /// without it every call makes a fresh pass.
    pub fn columns(
        &self,
        key: &TypeKey,
        record: &CompiledRecord,
        dataset: &dyn Dataset,
        reuse: bool,
    ) -> Result<Rc<ColumnSet>> {
        if reuse {
            let cached = self.columns.borrow().get(key).cloned();
            if let Some(columns) = cached {
                tracing::trace!(type_name = record.type_name(), "column cache hit");
                return Ok(columns);
            }
        }

        self.materializations.set(self.materializations.get() + 1);
        let columns = Rc::new(ColumnSet::materialize(record, dataset)?);

        if reuse {
            self.columns
                .borrow_mut()
                .insert(key.clone(), Rc::clone(&columns));
        }
        Ok(columns)
    }

    pub fn get(&self, key: &TypeKey) -> Option<Rc<CompiledRecord>> {
        self.records.borrow().get(key).cloned()
    }

    pub fn contains(&self, key: &TypeKey) -> bool {
        self.records.borrow().contains_key(key)
    }

    /// Number of compiled record types held.
    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }

    /// Compiler invocations so far, failed ones included.
    pub fn compilation_count(&self) -> usize {
        self.compilations.get()
    }

    /// Materializing passes so far.
    pub fn materialization_count(&self) -> usize {
        self.materializations.get()
    }

    /// Drop every compiled record and column set.
    ///
    /// Readers already built keep their shared records alive.
    pub fn clear(&self) {
        self.records.borrow_mut().clear();
        self.columns.borrow_mut().clear();
    }
}
