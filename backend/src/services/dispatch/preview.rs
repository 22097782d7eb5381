use crate::config::AppConfig;
use crate::services::dispatch::render::preview;
use crate::services::dispatch::request::load_request;
use crate::services::error_response;
use crate::services::templates::store::TemplateStore;
use actix_web::{web, HttpResponse, Responder};
use common::requests::DispatchRequest;

/// `POST /api/dispatch/preview`: the message the first row would receive.
pub(crate) async fn process(
    store: web::Data<TemplateStore>,
    config: web::Data<AppConfig>,
    payload: web::Json<DispatchRequest>,
) -> impl Responder {
    let result = load_request(&payload, &store, &config)
        .and_then(|loaded| preview(&loaded.template, &loaded.mapping, &loaded.table));
    match result {
        Ok(preview) => HttpResponse::Ok().json(preview),
        Err(e) => error_response(&e),
    }
}
