// src/normalize/mod.rs
//
// Pure, total normalizers for the messy values found in human-authored
// spreadsheets. Nothing in here fails: unparseable input degrades to a
// neutral default ("" or 0.0) and is filtered out downstream.

pub mod month;
pub mod number;
pub mod text;

pub use self::month::{
    extract_year, month_year_sort_key, normalize_month, normalize_month_year, MONTHS_ES,
};
pub use self::number::parse_number;
pub use self::text::normalize;
