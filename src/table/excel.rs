use std::io::Cursor;

use anyhow::{anyhow, Context, Result};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use tracing::debug;

use super::{Cell, RawTable};

/// Read an uploaded `.xlsx`/`.xls` into a [`RawTable`]: first worksheet,
/// first row as headers, everything else as data. Any reason the workbook
/// cannot be read is an operator-facing error (the messages end up in 400
/// responses verbatim).
pub fn read_excel(content: &[u8], filename: &str) -> Result<RawTable> {
    let lowered = filename.to_lowercase();
    if !lowered.ends_with(".xlsx") && !lowered.ends_with(".xls") {
        return Err(anyhow!("El archivo debe ser Excel (.xlsx o .xls)."));
    }

    let mut workbook = open_workbook_auto_from_rs(Cursor::new(content))
        .map_err(|e| anyhow!("No pude leer el Excel: {e}"))?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| anyhow!("No pude leer el Excel: el libro no tiene hojas."))?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| anyhow!("No pude leer el Excel: {e}"))?;

    let mut rows_iter = range.rows();
    let header_row = rows_iter
        .next()
        .context("No pude leer el Excel: la hoja esta vacia.")?;

    let columns: Vec<String> = header_row
        .iter()
        .enumerate()
        .map(|(idx, cell)| {
            let name = convert_cell(cell).to_display_string();
            let name = name.trim().to_string();
            if name.is_empty() {
                format!("columna {}", idx + 1)
            } else {
                name
            }
        })
        .collect();

    let rows: Vec<Vec<Cell>> = rows_iter
        .map(|row| {
            let mut cells: Vec<Cell> = row.iter().map(convert_cell).collect();
            cells.resize(columns.len(), Cell::Empty);
            cells
        })
        .collect();

    debug!(
        sheet = %sheet_name,
        columns = columns.len(),
        rows = rows.len(),
        "read worksheet"
    );
    Ok(RawTable { columns, rows })
}

fn convert_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => {
            if s.trim().is_empty() {
                Cell::Empty
            } else {
                Cell::Text(s.clone())
            }
        }
        Data::Float(n) => Cell::Number(*n),
        Data::Int(n) => Cell::Number(*n as f64),
        Data::Bool(b) => Cell::Bool(*b),
        // Formula errors read like pandas NaN: absent.
        Data::Error(_) => Cell::Empty,
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(naive) => Cell::DateTime(naive),
            None => Cell::Empty,
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_excel_extension() {
        let err = read_excel(b"whatever", "ventas.csv").unwrap_err();
        assert!(err.to_string().contains(".xlsx"));
    }

    #[test]
    fn rejects_garbage_bytes() {
        assert!(read_excel(b"not a workbook", "ventas.xlsx").is_err());
    }

    #[test]
    fn converts_calamine_cells() {
        assert_eq!(convert_cell(&Data::Empty), Cell::Empty);
        assert_eq!(convert_cell(&Data::String("  ".into())), Cell::Empty);
        assert_eq!(
            convert_cell(&Data::String("ACME".into())),
            Cell::Text("ACME".into())
        );
        assert_eq!(convert_cell(&Data::Int(3)), Cell::Number(3.0));
        assert_eq!(convert_cell(&Data::Float(1.5)), Cell::Number(1.5));
    }
}
