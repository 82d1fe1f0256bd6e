// src/mapping/mod.rs
//
// Column mapping: which spreadsheet columns play which role. Mappings come
// from three places (detection, the saved-mapping file, a per-request
// override) and only ever touch a table after sanitization against that
// table's real column list.

pub mod detect;
pub mod sanitize;
pub mod store;

use serde::{Deserialize, Serialize};

pub use self::detect::detect_mapping;
pub use self::sanitize::sanitize_mapping;
pub use self::store::MappingStore;

/// Sheet layout: `long` has an explicit month column plus one revenue
/// column; `wide` has one revenue column per month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Structure {
    Long,
    Wide,
    #[default]
    Unknown,
}

impl Structure {
    pub fn from_str_lenient(value: &str) -> Structure {
        match value {
            "long" => Structure::Long,
            "wide" => Structure::Wide,
            _ => Structure::Unknown,
        }
    }
}

/// Role assignment for one table. Empty string means "not assigned".
/// Invariant: after sanitization every non-empty reference names an actual
/// column of the table the mapping is applied to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnMapping {
    #[serde(default)]
    pub structure: Structure,
    #[serde(default)]
    pub comercial: String,
    #[serde(default)]
    pub cliente: String,
    #[serde(default)]
    pub mes: String,
    #[serde(default)]
    pub facturacion: String,
    #[serde(default)]
    pub month_columns: Vec<String>,
}
