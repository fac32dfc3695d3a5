//! Declaration of a streaming record type: a shared row cursor plus one
//! dataset column binding per accessor slot, read lazily by each getter.

use crate::types::Field;
use std::fmt::{self, Write};

pub fn render(type_name: &str, fields: &[Field], out: &mut String) -> fmt::Result {
    writeln!(out, "pub struct {}<'d> {{", type_name)?;
    writeln!(out, "    cursor: Box<dyn RowCursor + 'd>,")?;
    writeln!(out, "    bindings: [usize; {}],", fields.len())?;
    writeln!(out, "}}")?;
    writeln!(out)?;

    writeln!(out, "impl<'d> {}<'d> {{", type_name)?;
    writeln!(out, "    pub fn new(dataset: &'d dyn Dataset) -> Option<Self> {{")?;
    writeln!(out, "        let bindings = [")?;
    for (slot, field) in fields.iter().enumerate() {
        writeln!(
            out,
            "            dataset.column_index({:?})?, // slot {}: {}",
            field.raw_name, slot, field.identifier
        )?;
    }
    writeln!(out, "        ];")?;
    writeln!(out, "        Some({} {{", type_name)?;
    writeln!(out, "            cursor: dataset.cursor(),")?;
    writeln!(out, "            bindings,")?;
    writeln!(out, "        }})")?;
    writeln!(out, "    }}")?;
    writeln!(out)?;

    writeln!(out, "    pub fn advance(&mut self) -> bool {{")?;
    writeln!(out, "        self.cursor.advance()")?;
    writeln!(out, "    }}")?;

    for (slot, field) in fields.iter().enumerate() {
        writeln!(out)?;
        writeln!(
            out,
            "    pub fn {}(&self) -> Option<&{}> {{",
            field.identifier, field.type_name
        )?;
        writeln!(
            out,
            "        Scalar::from_value(self.cursor.read(self.bindings[{}]))",
            slot
        )?;
        writeln!(out, "    }}")?;
    }
    writeln!(out, "}}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_streaming() {
        let fields = vec![
            Field {
                raw_name: "px.".into(),
                identifier: "px".into(),
                type_name: "Float_t".into(),
                composite: false,
            },
            Field {
                raw_name: "random".into(),
                identifier: "random".into(),
                type_name: "Double_t".into(),
                composite: false,
            },
        ];

        let mut out = String::new();
        render("Record7", &fields, &mut out).unwrap();

        assert!(out.contains("pub struct Record7<'d> {"));
        assert!(out.contains("    bindings: [usize; 2],"));
        assert!(out.contains("dataset.column_index(\"px.\")?, // slot 0: px"));
        assert!(out.contains("pub fn random(&self) -> Option<&Double_t> {"));
        assert!(out.contains("Scalar::from_value(self.cursor.read(self.bindings[1]))"));
    }
}
