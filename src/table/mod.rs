// src/table/mod.rs
//
// In-memory model of one uploaded worksheet: ordered column names plus
// row-major heterogeneous cells. Column order must survive every
// transformation because the positional identity-column fallback in the
// dataset normalizer depends on it.

pub mod excel;

use chrono::NaiveDateTime;

pub use self::excel::read_excel;

/// One spreadsheet cell, as typed by the workbook rather than by us.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Stringify for previews and text-field cleaning. Whole floats render
    /// without a trailing `.0` so numeric client codes read naturally.
    pub fn to_display_string(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => {
                if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{n}")
                }
            }
            Cell::Bool(b) => b.to_string(),
            Cell::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

#[derive(Debug)]
pub struct RawTable {
    /// Column names from the header row, in sheet order.
    pub columns: Vec<String>,
    /// Data rows, each padded to `columns.len()` cells.
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell at (row, column name); `Cell::Empty` when out of range.
    pub fn cell(&self, row: usize, column: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&Cell::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_strings() {
        assert_eq!(Cell::Empty.to_display_string(), "");
        assert_eq!(Cell::Number(12.0).to_display_string(), "12");
        assert_eq!(Cell::Number(12.5).to_display_string(), "12.5");
        assert_eq!(Cell::Text("ACME".into()).to_display_string(), "ACME");
    }

    #[test]
    fn cell_lookup_is_total() {
        let table = RawTable {
            columns: vec!["a".into()],
            rows: vec![vec![Cell::Number(1.0)]],
        };
        assert_eq!(table.cell(0, 0), &Cell::Number(1.0));
        assert_eq!(table.cell(5, 5), &Cell::Empty);
        assert_eq!(table.column_index("a"), Some(0));
        assert_eq!(table.column_index("b"), None);
    }
}
