//! Load newline-delimited JSON into an in-memory columnar dataset.
//!
//! Field types are inferred by accumulating per-field statistics over every
//! record before any column is stored, so a field that holds integers in one
//! record and floats in another becomes an `f64` column.

use crate::dataset::{DatasetId, FieldDescriptor, InMemoryDataset};
use crate::value::Value;
use anyhow::{bail, Context, Result};
use serde_json::Map;
use std::collections::HashMap;
use std::io::BufRead;

/// Class name given to object and array fields.
pub const JSON_CLASS: &str = "json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JsonKind {
    Null,
    Boolean,
    Integer,
    Number,
    String,
    Composite,
}

impl JsonKind {
    fn from_value(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => JsonKind::Null,
            serde_json::Value::Bool(_) => JsonKind::Boolean,
            serde_json::Value::Number(n) => {
                if n.is_i64() {
                    JsonKind::Integer
                } else {
                    JsonKind::Number
                }
            }
            serde_json::Value::String(_) => JsonKind::String,
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => JsonKind::Composite,
        }
    }
}

/// Kinds seen for one field across all records
#[derive(Debug, Default)]
struct FieldStats {
    kinds: Vec<JsonKind>,
}

impl FieldStats {
    fn add(&mut self, kind: JsonKind) {
        if !self.kinds.contains(&kind) {
            self.kinds.push(kind);
        }
    }

    fn descriptor(&self, name: &str) -> Result<FieldDescriptor> {
        if self.kinds.contains(&JsonKind::Null) {
            bail!("Field '{}' contains null values", name);
        }

        let only_numbers = self
            .kinds
            .iter()
            .all(|k| matches!(k, JsonKind::Integer | JsonKind::Number));

        let descriptor = match self.kinds.as_slice() {
            [JsonKind::Integer] => FieldDescriptor::leaf(name, "i64"),
            _ if only_numbers => FieldDescriptor::leaf(name, "f64"),
            [JsonKind::Boolean] => FieldDescriptor::leaf(name, "bool"),
            [JsonKind::String] => FieldDescriptor::leaf(name, "string"),
            [JsonKind::Composite] => FieldDescriptor::class(name, JSON_CLASS),
            _ => bail!("Field '{}' mixes incompatible value types", name),
        };

        Ok(descriptor)
    }
}

impl InMemoryDataset {
    /// Read one JSON object per line. Blank lines are skipped.
    ///
    /// Every record must carry every field; field order follows the first
    /// record in which each field appears.
    pub fn from_ndjson<R: BufRead>(reader: R, id: DatasetId) -> Result<Self> {
        let mut records: Vec<Map<String, serde_json::Value>> = Vec::new();
        let mut order: Vec<String> = Vec::new();
        let mut stats: HashMap<String, FieldStats> = HashMap::new();

        for (line_no, line) in reader.lines().enumerate() {
            let line = line.context("Failed to read line")?;
            if line.trim().is_empty() {
                continue;
            }

            let value: serde_json::Value = serde_json::from_str(&line)
                .with_context(|| format!("Failed to parse JSON on line {}", line_no + 1))?;

            let serde_json::Value::Object(obj) = value else {
                bail!("Line {} is not a JSON object", line_no + 1);
            };

            for (key, value) in obj.iter() {
                if !stats.contains_key(key) {
                    order.push(key.clone());
                }
                stats
                    .entry(key.clone())
                    .or_default()
                    .add(JsonKind::from_value(value));
            }

            records.push(obj);
        }

        let mut builder = InMemoryDataset::builder(id);

        for name in &order {
            let descriptor = stats[name].descriptor(name)?;
            let float = descriptor.leaf_type.as_deref() == Some("f64");

            let mut values = Vec::with_capacity(records.len());
            for (entry, record) in records.iter().enumerate() {
                let Some(raw) = record.get(name) else {
                    bail!("Field '{}' is missing from entry {}", name, entry);
                };
                values.push(convert(raw, float));
            }

            builder = builder.field(descriptor, values);
        }

        let dataset = builder.build()?;
        tracing::debug!(
            fields = order.len(),
            entries = records.len(),
            "loaded NDJSON dataset"
        );
        Ok(dataset)
    }
}

fn convert(raw: &serde_json::Value, float: bool) -> Value {
    match raw {
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) if float => Value::F64(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::I64(i),
            None => Value::F64(n.as_f64().unwrap_or(f64::NAN)),
        },
        serde_json::Value::String(s) => Value::Str(s.clone()),
        other => Value::Composite(other.clone()),
    }
}
