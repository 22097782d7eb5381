use crate::services::error_response;
use crate::services::templates::store::TemplateStore;
use actix_web::{web, HttpResponse, Responder};
use log::info;

pub async fn process(
    store: web::Data<TemplateStore>,
    template_name: web::Path<String>,
) -> impl Responder {
    match store.delete(&template_name) {
        Ok(()) => {
            info!("template '{}' deleted", template_name);
            HttpResponse::NoContent().finish()
        }
        Err(e) => error_response(&e),
    }
}
