use crate::config::AppConfig;
use crate::services::data_sources::csv::load::load_table;
use crate::services::error_response;
use actix_web::{web, HttpResponse, Responder};
use common::model::datasource::DataSource;

/// `GET /api/data_sources/csv/{id}`: headers and row count of a stored
/// data source.
pub(crate) async fn process(
    config: web::Data<AppConfig>,
    id: web::Path<String>,
) -> impl Responder {
    match load_table(&config.data_dir, &id) {
        Ok(table) => HttpResponse::Ok().json(DataSource {
            id: id.into_inner(),
            row_count: table.len(),
            headers: table.headers,
        }),
        Err(e) => error_response(&e),
    }
}
