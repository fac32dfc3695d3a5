//! Declaration of a cached-columnar record type: one materialized column per
//! accessor slot, a row state, and both whole-column and current-row getters.

use crate::types::Field;
use std::fmt::{self, Write};

pub fn render(type_name: &str, fields: &[Field], out: &mut String) -> fmt::Result {
    writeln!(out, "pub struct {} {{", type_name)?;
    writeln!(out, "    entries: usize,")?;
    writeln!(out, "    row: RowState,")?;
    for (slot, field) in fields.iter().enumerate() {
        writeln!(
            out,
            "    {}: Vec<{}>, // slot {}: {:?}",
            field.identifier, field.type_name, slot, field.raw_name
        )?;
    }
    writeln!(out, "}}")?;
    writeln!(out)?;

    writeln!(out, "impl {} {{", type_name)?;
    writeln!(out, "    pub fn new(dataset: &dyn Dataset) -> Option<Self> {{")?;
    writeln!(out, "        let entries = dataset.entry_count();")?;
    writeln!(out, "        let bindings = [")?;
    for field in fields {
        writeln!(out, "            dataset.column_index({:?})?,", field.raw_name)?;
    }
    writeln!(out, "        ];")?;
    for field in fields {
        writeln!(
            out,
            "        let mut {} = Vec::with_capacity(entries);",
            field.identifier
        )?;
    }
    writeln!(out, "        let mut cursor = dataset.cursor();")?;
    writeln!(out, "        while cursor.advance() {{")?;
    for (slot, field) in fields.iter().enumerate() {
        writeln!(
            out,
            "            {}.push(Scalar::from_value(cursor.read(bindings[{}]))?.clone());",
            field.identifier, slot
        )?;
    }
    writeln!(out, "        }}")?;
    writeln!(out, "        Some({} {{", type_name)?;
    writeln!(out, "            entries,")?;
    writeln!(out, "            row: RowState::BeforeFirst,")?;
    for field in fields {
        writeln!(out, "            {},", field.identifier)?;
    }
    writeln!(out, "        }})")?;
    writeln!(out, "    }}")?;
    writeln!(out)?;

    writeln!(out, "    pub fn advance(&mut self) -> bool {{")?;
    writeln!(out, "        self.row = self.row.next(self.entries);")?;
    writeln!(out, "        matches!(self.row, RowState::AtRow(_))")?;
    writeln!(out, "    }}")?;

    for field in fields {
        writeln!(out)?;
        writeln!(
            out,
            "    pub fn {}(&self) -> Option<&{}> {{",
            field.identifier, field.type_name
        )?;
        writeln!(
            out,
            "        self.row.index().map(|i| &self.{}[i])",
            field.identifier
        )?;
        writeln!(out, "    }}")?;
    }
    writeln!(out)?;

    // Whole columns in slot order, as a tuple
    let trailing = if fields.len() == 1 { "," } else { "" };
    let types: Vec<String> = fields.iter().map(|f| format!("&[{}]", f.type_name)).collect();
    let columns: Vec<String> = fields.iter().map(|f| format!("&self.{}", f.identifier)).collect();
    writeln!(
        out,
        "    pub fn columns(&self) -> ({}{}) {{",
        types.join(", "),
        trailing
    )?;
    writeln!(out, "        ({}{})", columns.join(", "), trailing)?;
    writeln!(out, "    }}")?;
    writeln!(out, "}}")
}
