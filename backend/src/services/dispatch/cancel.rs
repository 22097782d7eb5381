use crate::job_controller::state::JobsState;
use actix_web::{web, HttpResponse, Responder};
use log::info;

/// `POST /api/dispatch/cancel/{job_id}`: rows not yet sent are skipped;
/// sends already in flight finish.
pub(crate) async fn process(
    state: web::Data<JobsState>,
    job_id: web::Path<String>,
) -> impl Responder {
    if state.cancel(&job_id).await {
        info!("dispatch job {} cancelled", job_id);
        HttpResponse::Accepted().body("Cancellation requested")
    } else {
        HttpResponse::NotFound().body("No running job with this ID")
    }
}
