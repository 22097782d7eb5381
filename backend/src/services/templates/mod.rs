//! # Template Service Module
//!
//! HTTP routes over the template store, under `/api/templates`.
//!
//! ## Sub-modules:
//! - `store`: the SQLite-backed `TemplateStore`.
//! - `get`: listing and single-template retrieval.
//! - `save`: creating and updating templates.
//! - `delete`: removing templates.
//! - `mapping`: saving a template's field mapping.

mod delete;
mod get;
mod mapping;
mod save;
pub mod store;

use actix_web::web::{delete, get, post, put, scope};
use actix_web::Scope;

/// The base path for all template-related API endpoints.
const API_PATH: &str = "/api/templates";

/// Configures and returns the Actix `Scope` for all template-related routes.
///
/// # Registered Routes:
///
/// *   **`GET /`**: every template, with saved mappings.
/// *   **`POST /`**: append a template (`Template` JSON body).
/// *   **`GET /{template_name}`**: one template.
/// *   **`PUT /{template_name}`**: replace name, id and message.
/// *   **`DELETE /{template_name}`**: remove a template.
/// *   **`PUT /{template_name}/mapping`**: save the field mapping
///     (`UpdateMappingRequest` body); answers `{"changed": bool}`.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", get().to(get::list))
        .route("", post().to(save::create))
        .route("/{template_name}", get().to(get::process))
        .route("/{template_name}", put().to(save::update))
        .route("/{template_name}", delete().to(delete::process))
        .route("/{template_name}/mapping", put().to(mapping::process))
}
