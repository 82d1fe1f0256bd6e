use std::collections::HashMap;

use bytes::BufMut;
use futures_util::TryStreamExt;
use warp::multipart::{FormData, Part};
use warp::Rejection;

use super::bad_request;

/// A fully buffered multipart upload: the spreadsheet bytes plus every text
/// field of the form. Files are loaded wholesale before processing starts.
pub struct UploadForm {
    pub filename: String,
    pub content: Vec<u8>,
    pub fields: HashMap<String, String>,
}

impl UploadForm {
    /// Text field by name; `None` for missing or blank fields.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }
}

pub async fn read_form(form: FormData) -> Result<UploadForm, Rejection> {
    let mut filename = String::new();
    let mut content: Option<Vec<u8>> = None;
    let mut fields = HashMap::new();

    let parts: Vec<Part> = form
        .try_collect()
        .await
        .map_err(|e| bad_request(format!("Formulario multipart invalido: {e}")))?;
    for part in parts {
        let name = part.name().to_string();
        if name == "file" {
            filename = part.filename().unwrap_or("").to_string();
            content = Some(collect_part(part).await?);
        } else {
            let raw = collect_part(part).await?;
            fields.insert(name, String::from_utf8_lossy(&raw).into_owned());
        }
    }

    let content = content.ok_or_else(|| bad_request("Falta el archivo a procesar."))?;
    Ok(UploadForm {
        filename,
        content,
        fields,
    })
}

async fn collect_part(part: Part) -> Result<Vec<u8>, Rejection> {
    part.stream()
        .try_fold(Vec::new(), |mut acc, data| {
            acc.put(data);
            async move { Ok(acc) }
        })
        .await
        .map_err(|e| bad_request(format!("No pude leer el formulario: {e}")))
}
