//! Optional image hosting for the run-wide image.
//!
//! `POST /api/media/upload` takes a multipart `image` field and answers
//! `{"url": "..."}`. A failed upload is reported to the caller; a run started
//! afterwards simply has no run-wide image.

use actix_web::web::{post, scope};
use actix_web::Scope;

mod upload;
pub mod uploader;

const API_PATH: &str = "/api/media";

pub fn configure_routes() -> Scope {
    scope(API_PATH).route("/upload", post().to(upload::process))
}
