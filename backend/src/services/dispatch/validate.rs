use crate::config::AppConfig;
use crate::services::dispatch::engine::DispatchEngine;
use crate::services::dispatch::request::load_request;
use crate::services::dispatch::resolver::extract_placeholders;
use crate::services::error_response;
use crate::services::templates::store::TemplateStore;
use actix_web::{web, HttpResponse, Responder};
use common::requests::DispatchRequest;

/// `POST /api/dispatch/validate`: runs the validation gate without sending.
/// Answers the template's placeholders on success, `422` naming every
/// missing field otherwise.
pub(crate) async fn process(
    store: web::Data<TemplateStore>,
    engine: web::Data<DispatchEngine>,
    config: web::Data<AppConfig>,
    payload: web::Json<DispatchRequest>,
) -> impl Responder {
    let loaded = match load_request(&payload, &store, &config) {
        Ok(loaded) => loaded,
        Err(e) => return error_response(&e),
    };
    match engine.validate(&loaded.template, &loaded.mapping, &loaded.table) {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "valid": true,
            "placeholders": extract_placeholders(&loaded.template.message),
        })),
        Err(e) => error_response(&e),
    }
}
