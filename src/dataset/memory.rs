use crate::dataset::{Dataset, DatasetId, FieldDescriptor, RowCursor};
use crate::value::{Value, ValueKind};
use anyhow::{bail, Result};

/// A dataset whose columns live in memory.
#[derive(Debug, Clone)]
pub struct InMemoryDataset {
    id: DatasetId,
    fields: Vec<FieldDescriptor>,
    columns: Vec<Vec<Value>>,
    entries: usize,
}

impl InMemoryDataset {
    pub fn builder(id: DatasetId) -> DatasetBuilder {
        DatasetBuilder {
            id,
            fields: Vec::new(),
            columns: Vec::new(),
        }
    }

    /// Raw values of a field, in entry order.
    pub fn values(&self, name: &str) -> Option<&[Value]> {
        let index = self.column_index(name)?;
        Some(self.columns[index].as_slice())
    }
}

impl Dataset for InMemoryDataset {
    fn identity(&self) -> DatasetId {
        self.id.clone()
    }

    fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    fn entry_count(&self) -> usize {
        self.entries
    }

    fn cursor(&self) -> Box<dyn RowCursor + '_> {
        Box::new(MemoryCursor {
            columns: &self.columns,
            entries: self.entries,
            next: 0,
            row: None,
        })
    }
}

/// Builds an [`InMemoryDataset`] column by column.
pub struct DatasetBuilder {
    id: DatasetId,
    fields: Vec<FieldDescriptor>,
    columns: Vec<Vec<Value>>,
}

impl DatasetBuilder {
    /// Add a field of primitive type.
    pub fn leaf<I, T>(self, name: &str, leaf_type: &str, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        self.field(
            FieldDescriptor::leaf(name, leaf_type),
            values.into_iter().map(Into::into).collect(),
        )
    }

    /// Add a class-typed field whose instances are JSON documents.
    pub fn class<I>(self, name: &str, class_name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = serde_json::Value>,
    {
        self.field(
            FieldDescriptor::class(name, class_name),
            values.into_iter().map(Value::Composite).collect(),
        )
    }

    /// Add a field with an arbitrary descriptor.
    pub fn field(mut self, descriptor: FieldDescriptor, values: Vec<Value>) -> Self {
        self.fields.push(descriptor);
        self.columns.push(values);
        self
    }

    /// Validate column lengths and value kinds.
    ///
    /// Fields whose descriptor does not resolve to a known kind are kept
    /// unchecked; readers reject them when they are selected.
    pub fn build(self) -> Result<InMemoryDataset> {
        let entries = self.columns.first().map_or(0, Vec::len);

        for (descriptor, column) in self.fields.iter().zip(&self.columns) {
            if column.len() != entries {
                bail!(
                    "Field '{}' has {} entries, expected {}",
                    descriptor.name,
                    column.len(),
                    entries
                );
            }

            let Some(kind) = declared_kind(descriptor) else {
                continue;
            };

            if let Some((row, value)) = column.iter().enumerate().find(|(_, v)| v.kind() != kind) {
                bail!(
                    "Field '{}' declared as {} holds a {} value at entry {}",
                    descriptor.name,
                    kind.to_str(),
                    value.kind().to_str(),
                    row
                );
            }
        }

        for (i, descriptor) in self.fields.iter().enumerate() {
            if self.fields[..i].iter().any(|f| f.name == descriptor.name) {
                bail!("Duplicate field name '{}'", descriptor.name);
            }
        }

        Ok(InMemoryDataset {
            id: self.id,
            fields: self.fields,
            columns: self.columns,
            entries,
        })
    }
}

fn declared_kind(descriptor: &FieldDescriptor) -> Option<ValueKind> {
    match (&descriptor.class_name, &descriptor.leaf_type) {
        (Some(class), _) if !class.is_empty() => Some(ValueKind::Composite),
        (_, Some(leaf)) => ValueKind::from_leaf_type(leaf),
        _ => None,
    }
}

struct MemoryCursor<'a> {
    columns: &'a [Vec<Value>],
    entries: usize,
    next: usize,
    row: Option<usize>,
}

impl RowCursor for MemoryCursor<'_> {
    #[inline]
    fn advance(&mut self) -> bool {
        if self.next < self.entries {
            self.row = Some(self.next);
            self.next += 1;
            true
        } else {
            self.row = None;
            false
        }
    }

    #[inline]
    fn read(&self, column: usize) -> &Value {
        match self.row {
            Some(row) => &self.columns[column][row],
            None => panic!("cursor read outside a valid entry"),
        }
    }
}
