use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How a reader accesses field values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Lazy, cursor-based access; one record visible at a time.
    #[default]
    Streaming,
    /// One eager pass materializes every selected field into a column.
    #[serde(alias = "columnar")]
    Cached,
}

/// The subset of a dataset's fields a reader is built for.
///
/// Matching always preserves the dataset's native field order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Selection {
    /// Exact raw field names (membership test).
    Names(BTreeSet<String>),
    /// Regular expression searched in each raw field name.
    Regex(String),
    /// Glob pattern matched against the whole raw field name.
    Pattern(String),
}

impl Default for Selection {
    fn default() -> Self {
        Selection::all()
    }
}

impl Selection {
    pub fn all() -> Self {
        Selection::Pattern(String::from("*"))
    }

    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Selection::Names(names.into_iter().map(Into::into).collect())
    }

    pub fn pattern(pattern: impl Into<String>) -> Self {
        Selection::Pattern(pattern.into())
    }

    pub fn regex(regex: impl Into<String>) -> Self {
        Selection::Regex(regex.into())
    }
}

/// A selected field, resolved against the dataset's schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Field {
    /// Name as the dataset exposes it
    pub raw_name: String,

    /// Accessor name on the record type
    pub identifier: String,

    /// Class name for composite fields, leaf type name otherwise
    pub type_name: String,

    /// Whether `type_name` is a class name
    pub composite: bool,
}

/// Configuration for building a reader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderOptions {
    /// Glob pattern over raw field names (empty means every field)
    pub pattern: String,

    /// Regular expression over raw field names, overrides `pattern`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,

    /// Explicit field names, override both `regex` and `pattern`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,

    pub strategy: Strategy,

    /// Share materialized columns between cached readers with the same key
    pub reuse_columns: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        ReaderOptions {
            pattern: String::from("*"),
            regex: None,
            fields: None,
            strategy: Strategy::Streaming,
            reuse_columns: true,
        }
    }
}

impl ReaderOptions {
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    pub fn with_regex(mut self, regex: impl Into<String>) -> Self {
        self.regex = Some(regex.into());
        self
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn reuse_columns(mut self, reuse: bool) -> Self {
        self.reuse_columns = reuse;
        self
    }

    /// The effective selection: explicit names, then regex, then pattern.
    pub fn selection(&self) -> Selection {
        if let Some(ref fields) = self.fields {
            return Selection::names(fields.iter().cloned());
        }

        if let Some(ref regex) = self.regex {
            if !regex.is_empty() {
                return Selection::regex(regex.clone());
            }
        }

        if self.pattern.is_empty() {
            Selection::all()
        } else {
            Selection::pattern(self.pattern.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_explicit_fields_take_precedence() {
        let options = ReaderOptions::default()
            .with_pattern("p*")
            .with_regex("^r")
            .with_fields(["random"]);

        assert_eq!(options.selection(), Selection::names(["random"]));
    }

    #[test]
    fn test_regex_over_pattern() {
        let options = ReaderOptions::default().with_pattern("p*").with_regex("^r");
        assert_eq!(options.selection(), Selection::regex("^r"));

        let options = ReaderOptions::default().with_pattern("p*").with_regex("");
        assert_eq!(options.selection(), Selection::pattern("p*"));
    }

    #[test]
    fn test_empty_pattern_selects_everything() {
        let options = ReaderOptions::default().with_pattern("");
        assert_eq!(options.selection(), Selection::all());
    }

    #[test]
    fn test_options_from_json() {
        let options: ReaderOptions = serde_json::from_value(json!({
            "fields": ["px", "py"],
            "strategy": "columnar"
        }))
        .unwrap();

        assert_eq!(options.strategy, Strategy::Cached);
        assert_eq!(options.pattern, "*");
        assert!(options.reuse_columns);
        assert_eq!(options.selection(), Selection::names(["py", "px"]));
    }
}
