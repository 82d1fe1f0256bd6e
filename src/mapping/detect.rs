use tracing::debug;

use super::{ColumnMapping, Structure};
use crate::normalize::{normalize, normalize_month, MONTHS_ES};
use crate::table::RawTable;

const SALESPERSON_KEYWORDS: [&str; 7] = [
    "comercial",
    "nombre comercial",
    "vendedor",
    "agente",
    "salesperson",
    "asesor",
    "gestor",
];

const CLIENT_KEYWORDS: [&str; 7] = [
    "cliente",
    "nombre cliente",
    "cuenta",
    "customer",
    "razon social",
    "empresa",
    "destinatario",
];

const MONTH_KEYWORDS: [&str; 2] = ["mes", "month"];

const REVENUE_KEYWORDS: [&str; 6] = [
    "facturacion bruta",
    "facturacion",
    "ventas",
    "importe",
    "total",
    "revenue",
];

/// Find the column playing a role by matching normalized headers against an
/// ordered keyword list: one full pass of exact matches, then a substring
/// pass in column order. Returns the original (un-normalized) column name.
fn find_column(table: &RawTable, candidates: &[&str]) -> Option<String> {
    // Normalized name -> original, column order, later duplicates shadowing
    // earlier ones.
    let mut by_normalized: Vec<(String, String)> = Vec::with_capacity(table.columns.len());
    for column in &table.columns {
        let key = normalize(column);
        if let Some(entry) = by_normalized.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = column.clone();
        } else {
            by_normalized.push((key, column.clone()));
        }
    }

    for candidate in candidates {
        if let Some((_, original)) = by_normalized.iter().find(|(key, _)| key == candidate) {
            return Some(original.clone());
        }
    }
    for (key, original) in &by_normalized {
        for candidate in candidates {
            if key.contains(candidate) {
                return Some(original.clone());
            }
        }
    }
    None
}

/// Every column whose header normalizes to a canonical month name, in sheet
/// order.
pub fn month_columns(table: &RawTable) -> Vec<String> {
    table
        .columns
        .iter()
        .filter(|column| MONTHS_ES.contains(&normalize_month(column).as_str()))
        .cloned()
        .collect()
}

/// Guess the role mapping for a table from its headers alone.
pub fn detect_mapping(table: &RawTable) -> ColumnMapping {
    let comercial = find_column(table, &SALESPERSON_KEYWORDS).unwrap_or_default();
    let cliente = find_column(table, &CLIENT_KEYWORDS).unwrap_or_default();
    let mes = find_column(table, &MONTH_KEYWORDS).unwrap_or_default();
    let facturacion = find_column(table, &REVENUE_KEYWORDS).unwrap_or_default();
    let month_cols = month_columns(table);

    let structure = if !mes.is_empty() && !facturacion.is_empty() {
        Structure::Long
    } else if !month_cols.is_empty() {
        Structure::Wide
    } else {
        Structure::Unknown
    };
    debug!(
        ?structure,
        comercial = %comercial,
        cliente = %cliente,
        mes = %mes,
        facturacion = %facturacion,
        month_columns = month_cols.len(),
        "detected mapping"
    );

    ColumnMapping {
        structure,
        comercial,
        cliente,
        mes,
        facturacion,
        month_columns: month_cols,
    }
}
