//! Record type synthesis
//!
//! Turns a resolved field list into a [`RecordDefinition`]: the accessor
//! layout of a record type specialized to one selection and strategy, plus a
//! rendered declaration of that type. The declaration is what a compiler
//! reports against when it rejects a definition.

pub mod columnar;
pub mod streaming;

use crate::error::{ReaderError, Result};
use crate::sanitize::is_valid_identifier;
use crate::types::{Field, Strategy};
use std::collections::HashMap;

/// Definition of a specialized record type, ready for compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDefinition {
    /// Generated type name, e.g. `Record3`
    pub type_name: String,

    pub strategy: Strategy,

    /// Accessors in field order
    pub fields: Vec<Field>,

    /// Rendered declaration
    pub source: String,
}

/// Synthesize the definition of a record type over `fields`.
///
/// Fails if any identifier is not a valid accessor name or if two fields
/// share an identifier. Neither case is repaired.
pub fn synthesize(type_name: &str, fields: &[Field], strategy: Strategy) -> Result<RecordDefinition> {
    check_identifiers(fields)?;

    let mut source = String::new();
    let rendered = match strategy {
        Strategy::Streaming => streaming::render(type_name, fields, &mut source),
        Strategy::Cached => columnar::render(type_name, fields, &mut source),
    };
    rendered.map_err(|_| {
        ReaderError::synthesis(format!("failed to render definition of {}", type_name))
    })?;

    tracing::debug!(
        type_name,
        ?strategy,
        fields = fields.len(),
        "synthesized record definition"
    );

    Ok(RecordDefinition {
        type_name: type_name.to_string(),
        strategy,
        fields: fields.to_vec(),
        source,
    })
}

/// Every identifier must be valid and unique across the selection.
pub fn check_identifiers(fields: &[Field]) -> Result<()> {
    let mut seen: HashMap<&str, &str> = HashMap::with_capacity(fields.len());

    for field in fields {
        if !is_valid_identifier(&field.identifier) {
            return Err(ReaderError::synthesis(format!(
                "field '{}' maps to invalid accessor identifier '{}'",
                field.raw_name, field.identifier
            )));
        }

        if let Some(previous) = seen.insert(&field.identifier, &field.raw_name) {
            return Err(ReaderError::synthesis(format!(
                "fields '{}' and '{}' both map to accessor identifier '{}'",
                previous, field.raw_name, field.identifier
            )));
        }
    }

    Ok(())
}
