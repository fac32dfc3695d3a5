//! Field values and the closed set of kinds a record accessor can hold.
//!
//! Every accessor is specialized to one [`ValueKind`]. Streaming readers hand
//! out borrowed [`Value`]s from the dataset cursor; cached-columnar readers
//! store one typed [`Column`] per field so whole columns can be borrowed as
//! plain slices.

use serde::{Deserialize, Serialize};

/// Kind of value held by a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Bool,
    I32,
    I64,
    U32,
    U64,
    F32,
    F64,
    Str,
    Composite,
}

impl ValueKind {
    /// Resolve a leaf type name.
    ///
    /// Accepts Rust primitive names as well as the leaf type names written by
    /// columnar physics files (`Float_t`, `Long64_t`, ...).
    pub fn from_leaf_type(name: &str) -> Option<Self> {
        let kind = match name {
            "bool" | "Bool_t" => ValueKind::Bool,
            "i32" | "int" | "Int_t" => ValueKind::I32,
            "i64" | "long" | "Long_t" | "Long64_t" => ValueKind::I64,
            "u32" | "UInt_t" => ValueKind::U32,
            "u64" | "ULong_t" | "ULong64_t" => ValueKind::U64,
            "f32" | "float" | "Float_t" => ValueKind::F32,
            "f64" | "double" | "Double_t" => ValueKind::F64,
            "string" | "String" | "std::string" | "char*" => ValueKind::Str,
            _ => return None,
        };
        Some(kind)
    }

    pub fn to_str(self) -> &'static str {
        match self {
            ValueKind::Bool => "bool",
            ValueKind::I32 => "i32",
            ValueKind::I64 => "i64",
            ValueKind::U32 => "u32",
            ValueKind::U64 => "u64",
            ValueKind::F32 => "f32",
            ValueKind::F64 => "f64",
            ValueKind::Str => "string",
            ValueKind::Composite => "composite",
        }
    }
}

/// A single field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Str(String),
    /// Instance of a class-typed field, kept as a JSON document.
    Composite(serde_json::Value),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::I32(_) => ValueKind::I32,
            Value::I64(_) => ValueKind::I64,
            Value::U32(_) => ValueKind::U32,
            Value::U64(_) => ValueKind::U64,
            Value::F32(_) => ValueKind::F32,
            Value::F64(_) => ValueKind::F64,
            Value::Str(_) => ValueKind::Str,
            Value::Composite(_) => ValueKind::Composite,
        }
    }
}

/// Materialized values of one field, index-aligned with every other column
/// filled during the same pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Bool(Vec<bool>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    U32(Vec<u32>),
    U64(Vec<u64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
    Str(Vec<String>),
    Composite(Vec<serde_json::Value>),
}

impl Column {
    pub fn with_capacity(kind: ValueKind, capacity: usize) -> Self {
        match kind {
            ValueKind::Bool => Column::Bool(Vec::with_capacity(capacity)),
            ValueKind::I32 => Column::I32(Vec::with_capacity(capacity)),
            ValueKind::I64 => Column::I64(Vec::with_capacity(capacity)),
            ValueKind::U32 => Column::U32(Vec::with_capacity(capacity)),
            ValueKind::U64 => Column::U64(Vec::with_capacity(capacity)),
            ValueKind::F32 => Column::F32(Vec::with_capacity(capacity)),
            ValueKind::F64 => Column::F64(Vec::with_capacity(capacity)),
            ValueKind::Str => Column::Str(Vec::with_capacity(capacity)),
            ValueKind::Composite => Column::Composite(Vec::with_capacity(capacity)),
        }
    }

    /// Append a value. Returns false, leaving the column untouched, when the
    /// value is not of this column's kind.
    pub fn push(&mut self, value: &Value) -> bool {
        match (self, value) {
            (Column::Bool(c), Value::Bool(v)) => c.push(*v),
            (Column::I32(c), Value::I32(v)) => c.push(*v),
            (Column::I64(c), Value::I64(v)) => c.push(*v),
            (Column::U32(c), Value::U32(v)) => c.push(*v),
            (Column::U64(c), Value::U64(v)) => c.push(*v),
            (Column::F32(c), Value::F32(v)) => c.push(*v),
            (Column::F64(c), Value::F64(v)) => c.push(*v),
            (Column::Str(c), Value::Str(v)) => c.push(v.clone()),
            (Column::Composite(c), Value::Composite(v)) => c.push(v.clone()),
            _ => return false,
        }
        true
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Column::Bool(_) => ValueKind::Bool,
            Column::I32(_) => ValueKind::I32,
            Column::I64(_) => ValueKind::I64,
            Column::U32(_) => ValueKind::U32,
            Column::U64(_) => ValueKind::U64,
            Column::F32(_) => ValueKind::F32,
            Column::F64(_) => ValueKind::F64,
            Column::Str(_) => ValueKind::Str,
            Column::Composite(_) => ValueKind::Composite,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Bool(c) => c.len(),
            Column::I32(c) => c.len(),
            Column::I64(c) => c.len(),
            Column::U32(c) => c.len(),
            Column::U64(c) => c.len(),
            Column::F32(c) => c.len(),
            Column::F64(c) => c.len(),
            Column::Str(c) => c.len(),
            Column::Composite(c) => c.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Owned copy of the value at `row`.
    ///
    /// # Panics
    /// Panics if `row` is out of bounds.
    pub fn value_at(&self, row: usize) -> Value {
        match self {
            Column::Bool(c) => Value::Bool(c[row]),
            Column::I32(c) => Value::I32(c[row]),
            Column::I64(c) => Value::I64(c[row]),
            Column::U32(c) => Value::U32(c[row]),
            Column::U64(c) => Value::U64(c[row]),
            Column::F32(c) => Value::F32(c[row]),
            Column::F64(c) => Value::F64(c[row]),
            Column::Str(c) => Value::Str(c[row].clone()),
            Column::Composite(c) => Value::Composite(c[row].clone()),
        }
    }
}

/// Rust types an accessor can be specialized to.
pub trait Scalar: Sized + 'static {
    const KIND: ValueKind;

    fn from_value(value: &Value) -> Option<&Self>;

    fn from_column(column: &Column) -> Option<&[Self]>;
}

macro_rules! impl_scalar {
    ($ty:ty, $variant:ident) => {
        impl From<$ty> for Value {
            fn from(value: $ty) -> Self {
                Value::$variant(value)
            }
        }

        impl Scalar for $ty {
            const KIND: ValueKind = ValueKind::$variant;

            #[inline]
            fn from_value(value: &Value) -> Option<&Self> {
                match value {
                    Value::$variant(v) => Some(v),
                    _ => None,
                }
            }

            #[inline]
            fn from_column(column: &Column) -> Option<&[Self]> {
                match column {
                    Column::$variant(values) => Some(values.as_slice()),
                    _ => None,
                }
            }
        }
    };
}

impl_scalar!(bool, Bool);
impl_scalar!(i32, I32);
impl_scalar!(i64, I64);
impl_scalar!(u32, U32);
impl_scalar!(u64, U64);
impl_scalar!(f32, F32);
impl_scalar!(f64, F64);
impl_scalar!(String, Str);
impl_scalar!(serde_json::Value, Composite);
