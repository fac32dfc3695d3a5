use thiserror::Error;

/// Errors raised while building a reader.
///
/// Every variant is produced during construction; iteration itself has no
/// error channel.
#[derive(Error, Debug)]
pub enum ReaderError {
    #[error("Schema error for field '{field}': {message}")]
    Schema { field: String, message: String },

    #[error("Synthesis error: {message}")]
    Synthesis { message: String },

    #[error("Compilation error: {diagnostic}\n{source_text}")]
    Compilation {
        source_text: String,
        diagnostic: String,
    },

    #[error("Invalid selection '{pattern}': {message}")]
    InvalidSelection { pattern: String, message: String },

    #[error("No accessor named '{identifier}'")]
    UnknownField { identifier: String },

    #[error("Accessor '{identifier}' holds {actual} values, requested {expected}")]
    TypeMismatch {
        identifier: String,
        expected: &'static str,
        actual: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, ReaderError>;

impl ReaderError {
    pub fn schema(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schema {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn synthesis(message: impl Into<String>) -> Self {
        Self::Synthesis {
            message: message.into(),
        }
    }

    pub fn compilation(source_text: impl Into<String>, diagnostic: impl Into<String>) -> Self {
        Self::Compilation {
            source_text: source_text.into(),
            diagnostic: diagnostic.into(),
        }
    }

    pub fn invalid_selection(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSelection {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    pub fn unknown_field(identifier: impl Into<String>) -> Self {
        Self::UnknownField {
            identifier: identifier.into(),
        }
    }

    pub fn type_mismatch(
        identifier: impl Into<String>,
        expected: &'static str,
        actual: &'static str,
    ) -> Self {
        Self::TypeMismatch {
            identifier: identifier.into(),
            expected,
            actual,
        }
    }
}
