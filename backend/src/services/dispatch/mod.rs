//! The dispatch engine and its HTTP routes.
//!
//! Engine, leaves first:
//! - `resolver`: field values for one record, and the validation gate.
//! - `render`: text rendering for previews.
//! - `task`: one `ResolvedTask` per record, including image priority.
//! - `client`: the notification API seam and its HTTP implementation.
//! - `scheduler`: bounded-concurrency execution and outcome classification.
//! - `collector`: merges completions back into row order.
//! - `report`: the output table with failure highlighting.
//! - `engine`: validate / run / build report, independent of HTTP.

pub mod client;
pub mod collector;
pub mod engine;
pub mod render;
pub mod report;
pub mod resolver;
pub mod scheduler;
pub mod task;

mod cancel;
mod download;
mod preview;
mod request;
pub mod start;
mod validate;

use actix_web::web::{get, post, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/dispatch";

/// Configures and returns the Actix `Scope` for all dispatch routes.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/validate", post().to(validate::process))
        .route("/preview", post().to(preview::process))
        .route("/start", post().to(start::process))
        .route("/cancel/{job_id}", post().to(cancel::process))
        .route("/report/{job_id}", get().to(download::process))
}
