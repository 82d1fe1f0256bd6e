use serde_json::Value;

use super::{ColumnMapping, Structure};

/// Turn an untrusted JSON mapping (saved file or request override) into a
/// [`ColumnMapping`] that is safe against the current table: unknown column
/// references are dropped, `structure` is coerced to a valid value, and
/// missing / extra / wrong-typed fields degrade to empty defaults. Never
/// fails.
pub fn sanitize_mapping(raw: &Value, columns: &[String]) -> ColumnMapping {
    let pick = |field: &str| -> String {
        match raw.get(field).and_then(Value::as_str) {
            Some(name) if columns.iter().any(|c| c == name) => name.to_string(),
            _ => String::new(),
        }
    };

    let month_columns = raw
        .get("month_columns")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(Value::as_str)
                .filter(|name| columns.iter().any(|c| c == name))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let structure = raw
        .get("structure")
        .and_then(Value::as_str)
        .map(Structure::from_str_lenient)
        .unwrap_or_default();

    ColumnMapping {
        structure,
        comercial: pick("comercial"),
        cliente: pick("cliente"),
        mes: pick("mes"),
        facturacion: pick("facturacion"),
        month_columns,
    }
}

/// Same column filtering for a mapping that is already typed (the detected
/// mapping echoed in responses, or a saved mapping applied to a different
/// file than it was created from).
pub fn restrict_mapping(mapping: &ColumnMapping, columns: &[String]) -> ColumnMapping {
    let keep = |name: &str| -> String {
        if columns.iter().any(|c| c == name) {
            name.to_string()
        } else {
            String::new()
        }
    };
    ColumnMapping {
        structure: mapping.structure,
        comercial: keep(&mapping.comercial),
        cliente: keep(&mapping.cliente),
        mes: keep(&mapping.mes),
        facturacion: keep(&mapping.facturacion),
        month_columns: mapping
            .month_columns
            .iter()
            .filter(|name| columns.iter().any(|c| &c == name))
            .cloned()
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn drops_unknown_column_references() {
        let raw = json!({
            "structure": "long",
            "comercial": "Vendedor",
            "cliente": "NoExiste",
            "mes": "Mes",
            "facturacion": "Importe",
            "month_columns": ["Enero", "NoExiste"],
        });
        let cols = columns(&["Vendedor", "Mes", "Importe", "Enero"]);
        let mapping = sanitize_mapping(&raw, &cols);
        assert_eq!(mapping.structure, Structure::Long);
        assert_eq!(mapping.comercial, "Vendedor");
        assert_eq!(mapping.cliente, "");
        assert_eq!(mapping.month_columns, vec!["Enero"]);
    }

    #[test]
    fn malformed_input_degrades_to_defaults() {
        let cols = columns(&["A"]);
        assert_eq!(sanitize_mapping(&json!(null), &cols), ColumnMapping::default());
        assert_eq!(sanitize_mapping(&json!([1, 2]), &cols), ColumnMapping::default());
        let wrong_types = json!({
            "structure": 7,
            "comercial": ["A"],
            "month_columns": "A",
            "extra": true,
        });
        assert_eq!(sanitize_mapping(&wrong_types, &cols), ColumnMapping::default());
    }

    #[test]
    fn invalid_structure_coerces_to_unknown() {
        let raw = json!({ "structure": "diagonal" });
        assert_eq!(sanitize_mapping(&raw, &[]).structure, Structure::Unknown);
    }

    #[test]
    fn restrict_filters_typed_mappings() {
        let mapping = ColumnMapping {
            structure: Structure::Wide,
            comercial: "Comercial".into(),
            cliente: "Gone".into(),
            month_columns: vec!["Enero".into(), "Gone".into()],
            ..Default::default()
        };
        let restricted = restrict_mapping(&mapping, &columns(&["Comercial", "Enero"]));
        assert_eq!(restricted.comercial, "Comercial");
        assert_eq!(restricted.cliente, "");
        assert_eq!(restricted.month_columns, vec!["Enero"]);
        assert_eq!(restricted.structure, Structure::Wide);
    }
}
