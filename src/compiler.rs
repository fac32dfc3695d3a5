//! Compilation of record definitions into accessor tables.
//!
//! A [`Compiler`] turns a [`RecordDefinition`] into a [`CompiledRecord`]: the
//! immutable, selection-specific layout every reader over the same cache key
//! shares. The default [`AccessorCompiler`] resolves each field's type name to
//! a [`ValueKind`] once, so readers never look anything up by name per record.

use crate::error::{ReaderError, Result};
use crate::synth::RecordDefinition;
use crate::types::{Field, Strategy};
use crate::value::ValueKind;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_RECORD_ID: AtomicU64 = AtomicU64::new(0);

/// One typed slot of a compiled record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accessor {
    pub identifier: String,
    pub raw_name: String,
    pub kind: ValueKind,
}

/// A record type specialized to one (dataset, selection, strategy).
#[derive(Debug)]
pub struct CompiledRecord {
    id: u64,
    type_name: String,
    strategy: Strategy,
    fields: Vec<Field>,
    accessors: Vec<Accessor>,
    slots: HashMap<String, usize>,
    source: String,
}

impl CompiledRecord {
    /// Process-unique identity; field handles are only valid on readers
    /// sharing the record with the same id.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Accessors in field order; an accessor's position is its slot.
    pub fn accessors(&self) -> &[Accessor] {
        &self.accessors
    }

    /// Declaration this record was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn slot(&self, identifier: &str) -> Option<usize> {
        self.slots.get(identifier).copied()
    }
}

/// Turns synthesized definitions into invocable record types.
///
/// Implementations need not be idempotent: the type cache guarantees a
/// definition for a given key is submitted again only after a failure.
pub trait Compiler {
    fn compile(&self, definition: &RecordDefinition) -> Result<CompiledRecord>;
}

/// Builds accessor tables over the closed set of [`ValueKind`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessorCompiler;

impl Compiler for AccessorCompiler {
    fn compile(&self, definition: &RecordDefinition) -> Result<CompiledRecord> {
        let mut accessors = Vec::with_capacity(definition.fields.len());
        let mut slots = HashMap::with_capacity(definition.fields.len());

        for (slot, field) in definition.fields.iter().enumerate() {
            let kind = if field.composite {
                ValueKind::Composite
            } else {
                ValueKind::from_leaf_type(&field.type_name).ok_or_else(|| {
                    ReaderError::compilation(
                        &definition.source,
                        format!(
                            "unsupported type `{}` for accessor `{}`",
                            field.type_name, field.identifier
                        ),
                    )
                })?
            };

            if slots.insert(field.identifier.clone(), slot).is_some() {
                return Err(ReaderError::compilation(
                    &definition.source,
                    format!("duplicate definition of accessor `{}`", field.identifier),
                ));
            }

            accessors.push(Accessor {
                identifier: field.identifier.clone(),
                raw_name: field.raw_name.clone(),
                kind,
            });
        }

        tracing::debug!(
            type_name = %definition.type_name,
            accessors = accessors.len(),
            "compiled record type"
        );

        Ok(CompiledRecord {
            id: NEXT_RECORD_ID.fetch_add(1, Ordering::Relaxed),
            type_name: definition.type_name.clone(),
            strategy: definition.strategy,
            fields: definition.fields.clone(),
            accessors,
            slots,
            source: definition.source.clone(),
        })
    }
}
