use crate::services::error_response;
use crate::services::templates::store::TemplateStore;
use actix_web::{web, HttpResponse, Responder};
use common::model::template::Template;
use log::info;

pub async fn create(
    store: web::Data<TemplateStore>,
    payload: web::Json<Template>,
) -> impl Responder {
    match store.append(&payload) {
        Ok(()) => {
            info!("template '{}' added", payload.template_name);
            HttpResponse::Created().json(payload.into_inner())
        }
        Err(e) => error_response(&e),
    }
}

/// Replaces the template's name, id and message. Saved mappings are kept.
pub async fn update(
    store: web::Data<TemplateStore>,
    template_name: web::Path<String>,
    payload: web::Json<Template>,
) -> impl Responder {
    match store.update(&template_name, &payload) {
        Ok(()) => {
            info!(
                "template '{}' updated as '{}'",
                template_name, payload.template_name
            );
            HttpResponse::Ok().body("Template updated")
        }
        Err(e) => error_response(&e),
    }
}
