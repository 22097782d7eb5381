use crate::job_controller::state::JobsState;
use actix_files::NamedFile;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpRequest, HttpResponse};
use common::jobs::JobStatus;
use std::path::Path;

/// `GET /api/dispatch/report/{job_id}`: the CSV report of a completed job.
pub(crate) async fn process(
    req: HttpRequest,
    state: web::Data<JobsState>,
    job_id: web::Path<String>,
) -> HttpResponse {
    let path = match state.status(&job_id).await {
        Some(JobStatus::Completed(path)) => path,
        Some(_) => return HttpResponse::Conflict().body("Job has not completed"),
        None => return HttpResponse::NotFound().body("Job ID not found"),
    };

    let file_name = Path::new(&path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report.csv".to_string());

    match NamedFile::open_async(&path).await {
        Ok(file) => file
            .set_content_disposition(ContentDisposition {
                disposition: DispositionType::Attachment,
                parameters: vec![DispositionParam::Filename(file_name)],
            })
            .into_response(&req),
        Err(e) => HttpResponse::ServiceUnavailable().body(format!("Report unavailable: {}", e)),
    }
}
