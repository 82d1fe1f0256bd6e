use chrono::Datelike;
use once_cell::sync::Lazy;
use regex::Regex;

use super::text::normalize;
use crate::table::Cell;

/// Canonical Spanish month names; the `mes` field of every normalized record
/// uses one of these, optionally followed by a 4-digit year.
pub const MONTHS_ES: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// Short forms seen in the wild. "set" is the common alternative
/// abbreviation for septiembre.
const MONTH_ALIAS: [(&str, &str); 13] = [
    ("ene", "enero"),
    ("feb", "febrero"),
    ("mar", "marzo"),
    ("abr", "abril"),
    ("may", "mayo"),
    ("jun", "junio"),
    ("jul", "julio"),
    ("ago", "agosto"),
    ("sep", "septiembre"),
    ("set", "septiembre"),
    ("oct", "octubre"),
    ("nov", "noviembre"),
    ("dic", "diciembre"),
];

/// English names as a cross-locale safety net for exports produced by
/// English-configured tooling.
const MONTHS_EN: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

// "3", "03", "3/24", "03-2024": month number with optional year suffix.
static COMPACT_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(0?[1-9]|1[0-2])([/-]\d{2,4})?$").unwrap());

static YEAR_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(19\d{2}|20\d{2}|21\d{2})\b").unwrap());

/// Resolve a raw value to a canonical Spanish month name. Tries, in order:
/// exact canonical name, exact alias, numeric 1-12, English name,
/// `"<name> …"`/`"<name>-…"`/`"<name>/…"` prefixes, compact `MM[/-]YY[YY]`.
/// When nothing matches the normalized input is returned unchanged, so the
/// caller must check the result against [`MONTHS_ES`] before trusting it.
pub fn normalize_month(value: &str) -> String {
    let raw = normalize(value);
    if raw.is_empty() {
        return raw;
    }
    if MONTHS_ES.contains(&raw.as_str()) {
        return raw;
    }
    if let Some((_, canonical)) = MONTH_ALIAS.iter().find(|(alias, _)| *alias == raw) {
        return (*canonical).to_string();
    }
    for (idx, name) in MONTHS_ES.iter().enumerate() {
        if raw == (idx + 1).to_string() {
            return (*name).to_string();
        }
    }
    for (idx, name) in MONTHS_EN.iter().enumerate() {
        if raw == *name {
            return MONTHS_ES[idx].to_string();
        }
    }
    for name in MONTHS_ES {
        if has_month_prefix(&raw, name) {
            return name.to_string();
        }
    }
    for (alias, canonical) in MONTH_ALIAS {
        if has_month_prefix(&raw, alias) {
            return canonical.to_string();
        }
    }
    if let Some(caps) = COMPACT_DATE.captures(&raw) {
        if let Ok(idx) = caps[1].parse::<usize>() {
            return MONTHS_ES[idx - 1].to_string();
        }
    }
    raw
}

fn has_month_prefix(raw: &str, name: &str) -> bool {
    [' ', '-', '/']
        .iter()
        .any(|sep| raw.starts_with(&format!("{name}{sep}")))
}

/// Pull a plausible year out of a cell: the structured date year when the
/// cell carries one (accepted in 1900..=2100), otherwise the first 4-digit
/// 19xx/20xx/21xx token in its text form.
pub fn extract_year(cell: &Cell) -> Option<i32> {
    if let Cell::DateTime(dt) = cell {
        let year = dt.year();
        if (1900..=2100).contains(&year) {
            return Some(year);
        }
    }
    year_in_text(&cell.to_display_string())
}

fn year_in_text(text: &str) -> Option<i32> {
    YEAR_TOKEN
        .captures(text)
        .and_then(|caps| caps[1].parse().ok())
}

/// Canonical month label: `"<month> <year>"`, or the bare month when no year
/// is known. Values that do not resolve to a canonical month yield `""`.
pub fn normalize_month_year(cell: &Cell, fallback_year: Option<i32>) -> String {
    let month = normalize_month(&cell.to_display_string());
    if !MONTHS_ES.contains(&month.as_str()) {
        return String::new();
    }
    match extract_year(cell).or(fallback_year) {
        Some(year) => format!("{month} {year}"),
        None => month,
    }
}

/// Sort key giving ascending chronological order for month labels.
/// Unparseable years sort as 0, unknown months as 99, so garbage labels
/// land last among their year.
pub fn month_year_sort_key(label: &str) -> (i32, u32, String) {
    let normalized = normalize(label);
    let year = year_in_text(&normalized).unwrap_or(0);
    let month = normalize_month(&normalized);
    let month_idx = MONTHS_ES
        .iter()
        .position(|name| *name == month)
        .map(|idx| idx as u32 + 1)
        .unwrap_or(99);
    (year, month_idx, normalized)
}
