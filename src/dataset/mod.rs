// src/dataset/mod.rs
//
// Turns a RawTable plus an (optional, untrusted) mapping override into the
// canonical long-form record set: one row per salesperson/client/month with
// positive revenue. All the leniency lives here (forward-filled merged
// cells, positional fallback for unnamed identity columns, silent 0.0/""
// degradation for unparseable cells) so every consumer downstream sees a
// clean table.

use anyhow::{anyhow, bail, Result};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::mapping::{detect_mapping, sanitize_mapping, ColumnMapping, Structure};
use crate::normalize::{normalize, normalize_month_year, parse_number};
use crate::table::{Cell, RawTable};

/// One normalized sales record. After [`normalize_dataset`] all text fields
/// are non-empty and `facturacion_bruta` is strictly positive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecord {
    pub comercial: String,
    pub cliente: String,
    pub mes: String,
    pub facturacion_bruta: f64,
}

/// Field-by-field coalesce: an override field wins, an empty one falls back
/// to the detected value. `structure` is the override's own (an `unknown`
/// override is resolved later from the merged columns, not from detection).
fn merge_mapping(override_: &ColumnMapping, detected: &ColumnMapping) -> ColumnMapping {
    let pick = |over: &str, det: &str| -> String {
        if over.is_empty() {
            det.to_string()
        } else {
            over.to_string()
        }
    };
    ColumnMapping {
        structure: override_.structure,
        comercial: pick(&override_.comercial, &detected.comercial),
        cliente: pick(&override_.cliente, &detected.cliente),
        mes: pick(&override_.mes, &detected.mes),
        facturacion: pick(&override_.facturacion, &detected.facturacion),
        month_columns: if override_.month_columns.is_empty() {
            detected.month_columns.clone()
        } else {
            override_.month_columns.clone()
        },
    }
}

/// Stringify + trim a cell for the comercial/cliente fields; placeholder
/// values ("nan"/"none"/"null", case- and accent-insensitive) become empty.
fn clean_text(cell: &Cell) -> String {
    let text = cell.to_display_string().trim().to_string();
    if matches!(normalize(&text).as_str(), "nan" | "none" | "null") {
        String::new()
    } else {
        text
    }
}

fn column_index(table: &RawTable, name: &str) -> Result<usize> {
    table
        .column_index(name)
        .ok_or_else(|| anyhow!("la columna `{name}` no existe en el archivo"))
}

/// Normalize a raw table into revenue-bearing records, applying `mapping`
/// (sanitized against the table first) on top of header detection.
pub fn normalize_dataset(
    table: &RawTable,
    mapping: Option<&Value>,
) -> Result<Vec<NormalizedRecord>> {
    let detected = detect_mapping(table);
    let user = sanitize_mapping(mapping.unwrap_or(&Value::Null), &table.columns);
    let effective = merge_mapping(&user, &detected);

    let mut comercial_col = effective.comercial.clone();
    let mut cliente_col = effective.cliente.clone();

    // Sheets with idiosyncratic headers often still follow the "first two
    // columns are identity, the rest are months" convention: take the two
    // leftmost columns that are neither month columns nor a totals column.
    if (comercial_col.is_empty() || cliente_col.is_empty()) && !detected.month_columns.is_empty() {
        let non_month: Vec<&String> = table
            .columns
            .iter()
            .filter(|c| !detected.month_columns.contains(c) && normalize(c) != "total")
            .collect();
        if non_month.len() >= 2 {
            if comercial_col.is_empty() {
                comercial_col = non_month[0].clone();
            }
            if cliente_col.is_empty() {
                cliente_col = non_month[1].clone();
            }
        }
    }

    if comercial_col.is_empty() || cliente_col.is_empty() {
        bail!(
            "No pude detectar columnas de comercial y cliente. \
             Asegura cabeceras tipo 'Nombre Comercial' y 'Razón Social' o similar."
        );
    }

    let structure = match effective.structure {
        Structure::Unknown => {
            if !effective.mes.is_empty() && !effective.facturacion.is_empty() {
                Structure::Long
            } else {
                Structure::Wide
            }
        }
        resolved => resolved,
    };

    let comercial_idx = column_index(table, &comercial_col)?;
    let cliente_idx = column_index(table, &cliente_col)?;

    let mut records = if structure == Structure::Long {
        if effective.mes.is_empty() || effective.facturacion.is_empty() {
            bail!("Para formato long debes indicar las columnas de mes y facturacion.");
        }
        let mes_idx = column_index(table, &effective.mes)?;
        let fact_idx = column_index(table, &effective.facturacion)?;

        let mut out = Vec::with_capacity(table.rows.len());
        // Forward-fill: merged salesperson cells leave continuation rows
        // blank, so carry the last non-blank value down.
        let mut carried = Cell::Empty;
        for row in 0..table.rows.len() {
            let cell = table.cell(row, comercial_idx);
            if !cell.is_empty() {
                carried = cell.clone();
            }
            out.push(NormalizedRecord {
                comercial: clean_text(&carried),
                cliente: clean_text(table.cell(row, cliente_idx)),
                mes: normalize_month_year(table.cell(row, mes_idx), None),
                facturacion_bruta: parse_number(table.cell(row, fact_idx)),
            });
        }
        out
    } else {
        if effective.month_columns.is_empty() {
            bail!("Para formato wide debes seleccionar columnas de meses.");
        }
        let mut out = Vec::with_capacity(table.rows.len() * effective.month_columns.len());
        for month_col in &effective.month_columns {
            let month_idx = column_index(table, month_col)?;
            let mes = normalize_month_year(&Cell::Text(month_col.clone()), None);
            let mut carried = Cell::Empty;
            for row in 0..table.rows.len() {
                let cell = table.cell(row, comercial_idx);
                if !cell.is_empty() {
                    carried = cell.clone();
                }
                out.push(NormalizedRecord {
                    comercial: clean_text(&carried),
                    cliente: clean_text(table.cell(row, cliente_idx)),
                    mes: mes.clone(),
                    facturacion_bruta: parse_number(table.cell(row, month_idx)),
                });
            }
        }
        out
    };

    let before = records.len();
    records.retain(|r| {
        !r.comercial.is_empty()
            && !r.cliente.is_empty()
            && !r.mes.is_empty()
            && r.facturacion_bruta > 0.0
    });
    debug!(
        ?structure,
        kept = records.len(),
        dropped = before - records.len(),
        "normalized dataset"
    );
    Ok(records)
}
