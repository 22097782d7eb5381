pub mod data_sources;
pub mod dispatch;
pub mod jobs;
pub mod media;
pub mod templates;

use crate::error::DispatchError;
use actix_web::HttpResponse;

/// Maps a run-level error to the HTTP response every handler returns for it.
///
/// - Configuration errors: `422` with the offending names as JSON.
/// - Unknown template or data source: `404`.
/// - Bad template payloads: `400`.
/// - Anything else: `503` with the error text.
pub(crate) fn error_response(err: &DispatchError) -> HttpResponse {
    match err {
        DispatchError::Configuration { missing } => HttpResponse::UnprocessableEntity().json(
            serde_json::json!({ "error": err.to_string(), "missing": missing }),
        ),
        DispatchError::UnknownColumns { columns } => HttpResponse::UnprocessableEntity().json(
            serde_json::json!({ "error": err.to_string(), "columns": columns }),
        ),
        DispatchError::TemplateNotFound(_) => HttpResponse::NotFound().body(err.to_string()),
        DispatchError::DataSource(_) | DispatchError::Csv(_) => {
            HttpResponse::BadRequest().body(err.to_string())
        }
        DispatchError::InvalidTemplate(_) | DispatchError::Preview(_) => {
            HttpResponse::BadRequest().body(err.to_string())
        }
        _ => HttpResponse::ServiceUnavailable().body(err.to_string()),
    }
}
