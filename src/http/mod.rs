// src/http/mod.rs
//
// The warp surface: upload, inspection, analysis and mapping persistence.
// Handlers stay thin; all decision logic lives in the mapping/dataset
// modules. Every operator mistake (wrong file type, bad JSON, unresolvable
// mapping) comes back as a 400 with a `detail` message.

pub mod upload;

use serde_json::{json, Map, Value};
use tracing::info;
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use crate::analyze::{apply_filters, build_filter_options, summarize};
use crate::dataset::normalize_dataset;
use crate::mapping::sanitize::restrict_mapping;
use crate::mapping::{detect_mapping, sanitize_mapping, MappingStore};
use crate::table::{read_excel, RawTable};
use self::upload::{read_form, UploadForm};

const PREVIEW_ROWS: usize = 5;
const MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl warp::reject::Reject for ApiError {}

pub fn bad_request(message: impl Into<String>) -> Rejection {
    warp::reject::custom(ApiError {
        status: StatusCode::BAD_REQUEST,
        message: message.into(),
    })
}

fn internal_error(message: impl Into<String>) -> Rejection {
    warp::reject::custom(ApiError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: message.into(),
    })
}

async fn handle_rejection(err: Rejection) -> Result<impl Reply, Rejection> {
    let (status, message) = if let Some(api) = err.find::<ApiError>() {
        (api.status, api.message.clone())
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, "No encontrado.".to_string())
    } else if err.find::<warp::body::BodyDeserializeError>().is_some() {
        (
            StatusCode::BAD_REQUEST,
            "El cuerpo debe ser JSON valido.".to_string(),
        )
    } else {
        return Err(err);
    };
    let body = warp::reply::json(&json!({ "detail": message }));
    Ok(warp::reply::with_status(body, status))
}

/// All routes of the service, CORS-open like the original single-operator
/// deployment.
pub fn routes(
    store: MappingStore,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let with_store = {
        let store = store.clone();
        warp::any().map(move || store.clone())
    };

    let health = warp::path!("api" / "health")
        .and(warp::get())
        .map(|| warp::reply::json(&json!({ "status": "ok" })));

    let mapping_get = warp::path!("api" / "commissions" / "mapping")
        .and(warp::get())
        .and(with_store.clone())
        .and_then(mapping_get);

    let mapping_save = warp::path!("api" / "commissions" / "mapping" / "save")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_store.clone())
        .and_then(mapping_save);

    let inspect = warp::path!("api" / "commissions" / "inspect")
        .and(warp::post())
        .and(warp::multipart::form().max_length(MAX_UPLOAD_BYTES))
        .and(with_store.clone())
        .and_then(inspect);

    let analyze = warp::path!("api" / "commissions" / "analyze")
        .and(warp::post())
        .and(warp::multipart::form().max_length(MAX_UPLOAD_BYTES))
        .and(with_store)
        .and_then(analyze);

    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(vec!["GET", "POST", "OPTIONS"])
        .allow_headers(vec!["content-type"]);

    health
        .or(mapping_get)
        .or(mapping_save)
        .or(inspect)
        .or(analyze)
        .recover(handle_rejection)
        .with(cors)
}

async fn mapping_get(store: MappingStore) -> Result<impl Reply, Rejection> {
    Ok(warp::reply::json(&json!({ "mapping": store.load() })))
}

async fn mapping_save(body: Value, store: MappingStore) -> Result<impl Reply, Rejection> {
    if !body.is_object() {
        return Err(bad_request("El mapping debe ser un objeto JSON."));
    }
    store.save(&body).map_err(|e| internal_error(e.to_string()))?;
    info!("saved mapping to {}", store.path().display());
    Ok(warp::reply::json(&json!({ "saved": true })))
}

async fn inspect(
    form: warp::multipart::FormData,
    store: MappingStore,
) -> Result<impl Reply, Rejection> {
    let upload = read_form(form).await?;
    info!(filename = %upload.filename, bytes = upload.content.len(), "inspect");
    let table =
        read_excel(&upload.content, &upload.filename).map_err(|e| bad_request(e.to_string()))?;

    let detected = detect_mapping(&table);
    let provided = parse_mapping_json(&upload)?;
    let saved = store.load();
    let columns = table.columns.clone();

    // Precedence: request override, else saved mapping, else detection.
    let effective = match provided.as_ref().or(saved.as_ref()) {
        Some(raw) => sanitize_mapping(raw, &columns),
        None => restrict_mapping(&detected, &columns),
    };
    let effective_value = serde_json::to_value(&effective).unwrap_or(Value::Null);

    let normalized = normalize_dataset(&table, Some(&effective_value))
        .map_err(|e| bad_request(e.to_string()))?;
    let options = build_filter_options(&normalized);

    Ok(warp::reply::json(&json!({
        "filename": upload.filename,
        "columns": columns,
        "detected_mapping": restrict_mapping(&detected, &columns),
        "active_mapping": effective,
        "saved_mapping": saved.as_ref().map(|raw| sanitize_mapping(raw, &columns)),
        "rows_detected": normalized.len(),
        "preview_rows": rows_preview(&table, PREVIEW_ROWS),
        "options": options,
    })))
}

async fn analyze(
    form: warp::multipart::FormData,
    store: MappingStore,
) -> Result<impl Reply, Rejection> {
    let upload = read_form(form).await?;

    let commission_rate: f64 = match upload.field("commission_rate") {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| bad_request("La comision debe ser un numero."))?,
        None => 5.0,
    };
    if commission_rate < 0.0 {
        return Err(bad_request("La comision no puede ser negativa."));
    }

    info!(
        filename = %upload.filename,
        rate = commission_rate,
        "analyze"
    );
    let table =
        read_excel(&upload.content, &upload.filename).map_err(|e| bad_request(e.to_string()))?;
    let provided = parse_mapping_json(&upload)?;
    let saved = store.load();
    let mapping = provided.or(saved);

    let normalized =
        normalize_dataset(&table, mapping.as_ref()).map_err(|e| bad_request(e.to_string()))?;
    let options = build_filter_options(&normalized);

    let single_comercial = upload.field("comercial").unwrap_or("").to_string();
    let single_mes = upload.field("mes").unwrap_or("").to_string();
    let mut comerciales = parse_json_filter_list(&upload, "comerciales_json")?;
    let mut meses = parse_json_filter_list(&upload, "meses_json")?;
    if comerciales.is_empty() && !single_comercial.is_empty() {
        comerciales.push(single_comercial.clone());
    }
    if meses.is_empty() && !single_mes.is_empty() {
        meses.push(single_mes.clone());
    }

    let filtered = apply_filters(normalized, &comerciales, &meses);
    let summary = summarize(&filtered, commission_rate);

    Ok(warp::reply::json(&json!({
        "commission_rate": commission_rate,
        "filters": {
            "comercial": single_comercial,
            "mes": single_mes,
            "comerciales": comerciales,
            "meses": meses,
        },
        "totals": summary.totals,
        "options": options,
        "rows": summary.rows,
    })))
}

/// Optional `mapping_json` form field: absent/blank is fine, malformed JSON
/// or a non-object is a client error.
fn parse_mapping_json(upload: &UploadForm) -> Result<Option<Value>, Rejection> {
    let raw = match upload.field("mapping_json") {
        Some(raw) => raw,
        None => return Ok(None),
    };
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| bad_request(format!("JSON de mapping invalido: {e}")))?;
    if !value.is_object() {
        return Err(bad_request("El mapping debe ser un objeto JSON."));
    }
    Ok(Some(value))
}

/// Optional JSON-array filter field. A non-array value degrades to no
/// filter; blank items are dropped; non-string items are stringified.
fn parse_json_filter_list(upload: &UploadForm, field: &str) -> Result<Vec<String>, Rejection> {
    let raw = match upload.field(field) {
        Some(raw) => raw,
        None => return Ok(Vec::new()),
    };
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| bad_request(format!("Filtro {field} invalido: {e}")))?;
    let entries = match value.as_array() {
        Some(entries) => entries,
        None => return Ok(Vec::new()),
    };
    Ok(entries
        .iter()
        .map(|entry| match entry {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .filter(|s| !s.trim().is_empty())
        .collect())
}

/// First rows of the raw sheet, stringified for the UI preview. Blanks stay
/// empty strings, column order matches the sheet.
fn rows_preview(table: &RawTable, limit: usize) -> Vec<Map<String, Value>> {
    table
        .rows
        .iter()
        .take(limit)
        .map(|row| {
            table
                .columns
                .iter()
                .enumerate()
                .map(|(idx, column)| {
                    let text = row
                        .get(idx)
                        .map(|cell| cell.to_display_string())
                        .unwrap_or_default();
                    (column.clone(), Value::String(text))
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;
    use serde_json::json;
    use tempfile::tempdir;

    fn test_store(dir: &tempfile::TempDir) -> MappingStore {
        MappingStore::new(dir.path().join("mapping.json"))
    }

    #[tokio::test]
    async fn health_is_ok() {
        let dir = tempdir().unwrap();
        let res = warp::test::request()
            .method("GET")
            .path("/api/health")
            .reply(&routes(test_store(&dir)))
            .await;
        assert_eq!(res.status(), 200);
        assert_eq!(res.body(), r#"{"status":"ok"}"#);
    }

    #[tokio::test]
    async fn mapping_roundtrip_over_http() {
        let dir = tempdir().unwrap();
        let api = routes(test_store(&dir));

        let res = warp::test::request()
            .method("GET")
            .path("/api/commissions/mapping")
            .reply(&api)
            .await;
        assert_eq!(res.status(), 200);
        assert_eq!(res.body(), r#"{"mapping":null}"#);

        let res = warp::test::request()
            .method("POST")
            .path("/api/commissions/mapping/save")
            .json(&json!({"structure": "wide", "comercial": "Vendedor"}))
            .reply(&api)
            .await;
        assert_eq!(res.status(), 200);
        assert_eq!(res.body(), r#"{"saved":true}"#);

        let res = warp::test::request()
            .method("GET")
            .path("/api/commissions/mapping")
            .reply(&api)
            .await;
        let body: Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body["mapping"]["comercial"], "Vendedor");
    }

    #[tokio::test]
    async fn mapping_save_rejects_non_objects() {
        let dir = tempdir().unwrap();
        let res = warp::test::request()
            .method("POST")
            .path("/api/commissions/mapping/save")
            .json(&json!([1, 2, 3]))
            .reply(&routes(test_store(&dir)))
            .await;
        assert_eq!(res.status(), 400);
        let body: Value = serde_json::from_slice(res.body()).unwrap();
        assert!(body["detail"].as_str().unwrap().contains("objeto JSON"));
    }

    #[test]
    fn preview_stringifies_and_pads() {
        let table = RawTable {
            columns: vec!["Comercial".into(), "Enero".into()],
            rows: vec![
                vec![Cell::Text("Ana".into()), Cell::Number(100.0)],
                vec![Cell::Empty],
            ],
        };
        let preview = rows_preview(&table, 5);
        assert_eq!(preview.len(), 2);
        assert_eq!(preview[0]["Comercial"], "Ana");
        assert_eq!(preview[0]["Enero"], "100");
        assert_eq!(preview[1]["Comercial"], "");
        assert_eq!(preview[1]["Enero"], "");
    }

    #[test]
    fn filter_lists_parse_leniently() {
        let upload = UploadForm {
            filename: String::new(),
            content: Vec::new(),
            fields: [
                ("comerciales_json".to_string(), r#"["Ana", "", 3]"#.to_string()),
                ("meses_json".to_string(), r#""no es lista""#.to_string()),
            ]
            .into_iter()
            .collect(),
        };
        let comerciales = parse_json_filter_list(&upload, "comerciales_json").unwrap();
        assert_eq!(comerciales, vec!["Ana", "3"]);
        let meses = parse_json_filter_list(&upload, "meses_json").unwrap();
        assert!(meses.is_empty());
        assert!(parse_json_filter_list(&upload, "ausente").unwrap().is_empty());
    }
}
