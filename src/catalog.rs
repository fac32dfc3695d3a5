//! Field catalog: resolve a selection against a dataset's schema.

use crate::dataset::{Dataset, FieldDescriptor};
use crate::error::{ReaderError, Result};
use crate::sanitize::sanitize;
use crate::types::{Field, Selection};
use regex::Regex;
use std::collections::BTreeSet;

/// Compiled form of a [`Selection`].
enum Matcher<'s> {
    Names(&'s BTreeSet<String>),
    Regex(Regex),
}

impl<'s> Matcher<'s> {
    fn new(selection: &'s Selection) -> Result<Self> {
        match selection {
            Selection::Names(names) => Ok(Matcher::Names(names)),
            Selection::Regex(expr) => Regex::new(expr)
                .map(Matcher::Regex)
                .map_err(|e| ReaderError::invalid_selection(expr, e.to_string())),
            Selection::Pattern(glob) => Regex::new(&glob_to_regex(glob))
                .map(Matcher::Regex)
                .map_err(|e| ReaderError::invalid_selection(glob, e.to_string())),
        }
    }

    fn matches(&self, name: &str) -> bool {
        match self {
            Matcher::Names(names) => names.contains(name),
            Matcher::Regex(regex) => regex.is_match(name),
        }
    }
}

/// Translate a glob (`*`, `?`, `[...]`, `[!...]`) into an anchored regex.
pub fn glob_to_regex(glob: &str) -> String {
    let mut out = String::with_capacity(glob.len() + 8);
    out.push('^');

    let mut chars = glob.chars();
    while let Some(c) = chars.next() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '[' => {
                let mut class = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == ']' {
                        closed = true;
                        break;
                    }
                    class.push(c);
                }

                if closed {
                    let (negated, body) = match class.strip_prefix('!') {
                        Some(rest) => (true, rest),
                        None => (false, class.as_str()),
                    };
                    out.push('[');
                    if negated {
                        out.push('^');
                    }
                    out.push_str(&body.replace('\\', "\\\\").replace('[', "\\["));
                    out.push(']');
                } else {
                    out.push_str(&regex::escape("["));
                    out.push_str(&regex::escape(&class));
                }
            }
            other => {
                let mut buf = [0u8; 4];
                out.push_str(&regex::escape(other.encode_utf8(&mut buf)));
            }
        }
    }

    out.push('$');
    out
}

/// Type name of a field: its class name if class-typed, else its leaf type.
///
/// Returns the name and whether it is a class name.
pub fn resolve_type_name(descriptor: &FieldDescriptor) -> Result<(String, bool)> {
    if let Some(class) = descriptor.class_name.as_deref().filter(|c| !c.is_empty()) {
        return Ok((class.to_string(), true));
    }

    if let Some(leaf) = descriptor.leaf_type.as_deref().filter(|l| !l.is_empty()) {
        return Ok((leaf.to_string(), false));
    }

    Err(ReaderError::schema(
        &descriptor.name,
        "field exposes neither a class name nor a leaf type",
    ))
}

/// Selected fields of `dataset`, in the dataset's native order.
///
/// Explicit names are a membership filter: a name the dataset does not
/// contain selects nothing.
pub fn resolve_fields(dataset: &dyn Dataset, selection: &Selection) -> Result<Vec<Field>> {
    let matcher = Matcher::new(selection)?;

    if let Selection::Names(names) = selection {
        for name in names.iter().filter(|n| dataset.column_index(n).is_none()) {
            tracing::debug!(
                dataset = %dataset.identity(),
                field = %name,
                "selected name not in dataset"
            );
        }
    }

    let mut fields = Vec::new();
    for descriptor in dataset.fields() {
        if !matcher.matches(&descriptor.name) {
            continue;
        }

        let (type_name, composite) = resolve_type_name(descriptor)?;
        fields.push(Field {
            raw_name: descriptor.name.clone(),
            identifier: sanitize(&descriptor.name),
            type_name,
            composite,
        });
    }

    Ok(fields)
}
