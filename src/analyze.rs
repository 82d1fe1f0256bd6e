// src/analyze.rs
//
// Thin consumers of the normalized record set: filter application, filter
// option lists, commission arithmetic.

use std::collections::HashSet;

use serde::Serialize;

use crate::dataset::NormalizedRecord;
use crate::normalize::{month_year_sort_key, normalize};

/// Values offered for the salesperson/month filter dropdowns. Months sort
/// chronologically, not lexically.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterOptions {
    pub comerciales: Vec<String>,
    pub meses: Vec<String>,
}

pub fn build_filter_options(records: &[NormalizedRecord]) -> FilterOptions {
    let mut comerciales: Vec<String> = Vec::new();
    let mut meses: Vec<String> = Vec::new();
    for record in records {
        if !comerciales.contains(&record.comercial) {
            comerciales.push(record.comercial.clone());
        }
        if !meses.contains(&record.mes) {
            meses.push(record.mes.clone());
        }
    }
    comerciales.sort();
    meses.sort_by_key(|label| month_year_sort_key(label));
    FilterOptions { comerciales, meses }
}

/// Keep records whose comercial/mes fall in the given sets, compared
/// case- and accent-insensitively. An empty set means no restriction.
pub fn apply_filters(
    records: Vec<NormalizedRecord>,
    comerciales: &[String],
    meses: &[String],
) -> Vec<NormalizedRecord> {
    let comercial_set: HashSet<String> = comerciales.iter().map(|c| normalize(c)).collect();
    let mes_set: HashSet<String> = meses.iter().map(|m| normalize(m)).collect();
    records
        .into_iter()
        .filter(|r| comercial_set.is_empty() || comercial_set.contains(&normalize(&r.comercial)))
        .filter(|r| mes_set.is_empty() || mes_set.contains(&normalize(&r.mes)))
        .collect()
}

/// One display row of the analysis response, values rounded to cents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRow {
    pub comercial: String,
    pub cliente: String,
    pub mes: String,
    pub facturacion_bruta: f64,
    pub comision_eur: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Totals {
    pub facturacion_bruta: f64,
    pub comision_eur: f64,
    pub registros: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub totals: Totals,
    pub rows: Vec<AnalysisRow>,
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Commission summary at `rate` percent. Totals are the rounded sum of
/// unrounded per-row values; rounding happens once, at the end, never on
/// intermediate sums.
pub fn summarize(records: &[NormalizedRecord], rate: f64) -> Summary {
    let factor = rate / 100.0;
    let mut total_facturacion = 0.0;
    let mut total_comision = 0.0;
    let mut rows = Vec::with_capacity(records.len());
    for record in records {
        let comision = record.facturacion_bruta * factor;
        total_facturacion += record.facturacion_bruta;
        total_comision += comision;
        rows.push(AnalysisRow {
            comercial: record.comercial.clone(),
            cliente: record.cliente.clone(),
            mes: record.mes.clone(),
            facturacion_bruta: round2(record.facturacion_bruta),
            comision_eur: round2(comision),
        });
    }
    Summary {
        totals: Totals {
            facturacion_bruta: round2(total_facturacion),
            comision_eur: round2(total_comision),
            registros: rows.len(),
        },
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(comercial: &str, mes: &str, facturacion: f64) -> NormalizedRecord {
        NormalizedRecord {
            comercial: comercial.to_string(),
            cliente: "ACME".to_string(),
            mes: mes.to_string(),
            facturacion_bruta: facturacion,
        }
    }

    #[test]
    fn options_sort_months_chronologically() {
        let records = vec![
            record("Luis", "marzo 2024", 1.0),
            record("Ana", "diciembre 2023", 1.0),
            record("Ana", "enero 2024", 1.0),
        ];
        let options = build_filter_options(&records);
        assert_eq!(options.comerciales, vec!["Ana", "Luis"]);
        assert_eq!(
            options.meses,
            vec!["diciembre 2023", "enero 2024", "marzo 2024"]
        );
    }

    #[test]
    fn filters_are_accent_and_case_insensitive() {
        let records = vec![record("José", "enero 2024", 1.0), record("Luis", "enero 2024", 1.0)];
        let kept = apply_filters(records, &["JOSE".to_string()], &[]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].comercial, "José");
    }

    #[test]
    fn empty_filter_sets_keep_everything() {
        let records = vec![record("Ana", "enero", 1.0), record("Luis", "febrero", 2.0)];
        assert_eq!(apply_filters(records, &[], &[]).len(), 2);
    }

    #[test]
    fn end_to_end_totals() {
        let records = vec![
            record("Ana", "enero 2024", 100.0),
            record("Ana", "febrero 2024", 200.0),
            record("Luis", "marzo 2024", 300.0),
        ];
        let summary = summarize(&records, 10.0);
        assert_eq!(summary.totals.facturacion_bruta, 600.00);
        assert_eq!(summary.totals.comision_eur, 60.00);
        assert_eq!(summary.totals.registros, 3);
        assert_eq!(summary.rows[0].comision_eur, 10.00);
    }

    #[test]
    fn totals_round_once_at_the_end() {
        // Summing rounded rows would give 0.06 * 3 = 0.18; the rounded sum
        // of raw values gives 0.17.
        let records = vec![
            record("Ana", "enero", 0.055),
            record("Ana", "enero", 0.055),
            record("Ana", "enero", 0.055),
        ];
        let summary = summarize(&records, 100.0);
        assert_eq!(summary.totals.comision_eur, 0.17);
        assert_eq!(summary.rows[0].comision_eur, 0.06);
    }
}
