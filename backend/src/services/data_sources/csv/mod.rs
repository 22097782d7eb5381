//! CSV data sources: the tables a dispatch run reads its records from.
//!
//! The provided routes are:
//! - `POST /api/data_sources/csv/upload`: multipart upload with a `file` field
//!   holding the CSV. The file is validated (non-empty header cells),
//!   stored under the data directory named by its MD5 digest, and its id,
//!   headers and row count are returned.
//! - `GET /api/data_sources/csv/{id}`: the same summary for a stored file.
//!
//! The delimiter is detected from the header line (`,`, `;`, tab or `|`).

use actix_web::web::{get, post, scope};
use actix_web::Scope;

mod get;
pub mod load;
pub mod upload;

const API_PATH: &str = "/api/data_sources/csv";

/// Configures and returns the Actix scope for CSV data source routes.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/upload", post().to(upload::process))
        .route("/{id}", get().to(get::process))
}
