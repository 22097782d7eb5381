//! `GET /api/templates` and `GET /api/templates/{template_name}`.

use crate::services::error_response;
use crate::services::templates::store::TemplateStore;
use actix_web::{web, HttpResponse, Responder};

/// Lists every template, saved mappings included.
pub async fn list(store: web::Data<TemplateStore>) -> impl Responder {
    match store.load_all() {
        Ok(templates) => HttpResponse::Ok().json(templates),
        Err(e) => error_response(&e),
    }
}

/// Returns one template by name, or `404` when there is none.
pub async fn process(
    store: web::Data<TemplateStore>,
    template_name: web::Path<String>,
) -> impl Responder {
    match store.get(&template_name) {
        Ok(template) => HttpResponse::Ok().json(template),
        Err(e) => error_response(&e),
    }
}
