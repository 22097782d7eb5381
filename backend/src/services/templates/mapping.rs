use crate::services::error_response;
use crate::services::templates::store::TemplateStore;
use actix_web::{web, HttpResponse, Responder};
use common::requests::UpdateMappingRequest;

/// Saves a mapping for the template. Answers whether the stored mapping
/// actually changed.
pub async fn process(
    store: web::Data<TemplateStore>,
    template_name: web::Path<String>,
    payload: web::Json<UpdateMappingRequest>,
) -> impl Responder {
    match store.update_mapping(&template_name, &payload.mapping) {
        Ok(changed) => HttpResponse::Ok().json(serde_json::json!({ "changed": changed })),
        Err(e) => error_response(&e),
    }
}
