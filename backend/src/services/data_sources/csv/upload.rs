// Rust
use crate::config::AppConfig;
use crate::error::DispatchError;
use crate::services::data_sources::csv::load::{data_source_path, parse_table};
use crate::services::error_response;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder};
use common::model::datasource::DataSource;
use futures_util::StreamExt;
use log::info;
use md5::Context;
use std::fs;

/// HTTP handler wrapper that converts the internal result to an `HttpResponse`.
///
/// - On success: `200 OK` with the `DataSource` summary as JSON.
/// - On failure: `400 Bad Request` (or `503` for storage errors).
pub async fn process(config: web::Data<AppConfig>, payload: Multipart) -> impl Responder {
    match upload_data_source(&config, payload).await {
        Ok(data_source) => HttpResponse::Ok().json(data_source),
        Err(e) => error_response(&e),
    }
}

/// Stores the multipart `file` field under the data directory, named by the
/// MD5 of its bytes. Uploading the same file twice yields the same id.
pub async fn upload_data_source(
    config: &AppConfig,
    mut payload: Multipart,
) -> Result<DataSource, DispatchError> {
    let mut bytes: Option<Vec<u8>> = None;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| DispatchError::DataSource(e.to_string()))?;
        let name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));
        if name.as_deref() != Some("file") {
            continue;
        }

        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename().map(|f| f.to_string()))
            .unwrap_or_default();
        if !filename.to_ascii_lowercase().ends_with(".csv") {
            return Err(DispatchError::DataSource(
                "The file must end with .csv".to_string(),
            ));
        }

        let mut buf = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| DispatchError::DataSource(e.to_string()))?;
            buf.extend_from_slice(&chunk);
        }
        bytes = Some(buf);
    }

    let bytes = bytes.ok_or_else(|| DispatchError::DataSource("Missing file".to_string()))?;
    store_data_source(config, &bytes)
}

/// Validates `bytes` as a CSV table and writes it to the data directory.
pub fn store_data_source(config: &AppConfig, bytes: &[u8]) -> Result<DataSource, DispatchError> {
    let table = parse_table(bytes)?;

    let mut md5_hasher = Context::new();
    md5_hasher.consume(bytes);
    let id = format!("{:x}", md5_hasher.finalize());

    fs::create_dir_all(&config.data_dir)?;
    let path = data_source_path(&config.data_dir, &id)?;
    if !path.exists() {
        fs::write(&path, bytes)?;
    }
    info!(
        "data source {} stored ({} rows, columns: {})",
        id,
        table.len(),
        table.headers.join(", ")
    );

    Ok(DataSource {
        id,
        headers: table.headers,
        row_count: table.rows.len(),
    })
}
