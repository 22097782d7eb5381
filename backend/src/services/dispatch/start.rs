//! # Dispatch Job Start Service
//!
//! `POST /api/dispatch/start` sends one WhatsApp message per row of a data
//! source and writes a report when every row has an outcome.
//!
//! ## Workflow:
//!
//! 1.  **Validation**: the template, mapping and data source are loaded and
//!     the validation gate runs before the request returns, so a missing
//!     mapping is answered with `422` and nothing is sent. Loading touches
//!     SQLite and the CSV file, so it runs under `spawn_blocking`.
//!
//! 2.  **Mapping persistence**: the mapping used for the run is saved with
//!     the template (only if it changed). Failing to save is logged, not
//!     fatal.
//!
//! 3.  **Job Scheduling**: a `job_id` is registered as `Pending` and returned
//!     immediately. A Tokio task runs the batch.
//!
//! 4.  **Progress Reporting**: each completed row is forwarded to the job
//!     controller as `InProgress(<rows done>)`.
//!
//! 5.  **Report**: once every row is terminal the report is written on the
//!     blocking pool (`spawn_blocking`) and the job becomes
//!     `Completed(<report path>)`. A report that cannot be written fails the
//!     job.

use crate::config::AppConfig;
use crate::error::DispatchError;
use crate::job_controller::state::{JobUpdate, JobsState};
use crate::services::dispatch::engine::DispatchEngine;
use crate::services::dispatch::request::{load_request, LoadedRequest};
use crate::services::dispatch::scheduler::DispatchProgress;
use crate::services::error_response;
use crate::services::templates::store::TemplateStore;
use actix_web::{web, HttpResponse, Responder};
use common::jobs::JobStatus;
use common::requests::DispatchRequest;
use log::{error, info, warn};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub(crate) async fn process(
    state: web::Data<JobsState>,
    store: web::Data<TemplateStore>,
    engine: web::Data<DispatchEngine>,
    config: web::Data<AppConfig>,
    payload: web::Json<DispatchRequest>,
) -> impl Responder {
    match schedule_dispatch_job(state, store, engine, config, payload.into_inner()).await {
        Ok(job_id) => HttpResponse::Accepted().json(serde_json::json!({ "job_id": job_id })),
        Err(err) => error_response(&err),
    }
}

/// Validates, saves the mapping, and spawns the background run.
pub async fn schedule_dispatch_job(
    state: web::Data<JobsState>,
    store: web::Data<TemplateStore>,
    engine: web::Data<DispatchEngine>,
    config: web::Data<AppConfig>,
    req: DispatchRequest,
) -> Result<String, DispatchError> {
    let image_url = req.image_url.clone().filter(|u| !u.trim().is_empty());
    let loaded = {
        let engine = engine.clone();
        tokio::task::spawn_blocking(move || prepare_run(&req, &store, &engine, &config)).await??
    };

    let job_id = Uuid::new_v4().to_string();
    let cancel = state.register(&job_id).await;
    let tx = state.tx.clone();
    let job_id_for_task = job_id.clone();

    tokio::spawn(async move {
        let status = match run_job(
            &engine,
            &tx,
            &job_id_for_task,
            loaded,
            image_url.as_deref(),
            &cancel,
        )
        .await
        {
            Ok(path) => JobStatus::Completed(path.display().to_string()),
            Err(e) => {
                error!("dispatch job {} failed: {}", job_id_for_task, e);
                JobStatus::Failed(e.to_string())
            }
        };
        let _ = tx
            .send(JobUpdate {
                job_id: job_id_for_task,
                status,
            })
            .await;
    });

    Ok(job_id)
}

/// Loads and validates the request, then saves its mapping. Blocking.
fn prepare_run(
    req: &DispatchRequest,
    store: &TemplateStore,
    engine: &DispatchEngine,
    config: &AppConfig,
) -> Result<LoadedRequest, DispatchError> {
    let loaded = load_request(req, store, config)?;
    engine.validate(&loaded.template, &loaded.mapping, &loaded.table)?;

    match store.update_mapping(&loaded.template.template_name, &loaded.mapping) {
        Ok(true) => info!("mapping saved for '{}'", loaded.template.template_name),
        Ok(false) => {}
        Err(e) => warn!(
            "could not save mapping for '{}': {}",
            loaded.template.template_name, e
        ),
    }
    Ok(loaded)
}

/// Runs the batch and writes its report, forwarding progress as it goes.
async fn run_job(
    engine: &web::Data<DispatchEngine>,
    tx: &mpsc::Sender<JobUpdate>,
    job_id: &str,
    loaded: LoadedRequest,
    image_url: Option<&str>,
    cancel: &CancellationToken,
) -> Result<PathBuf, DispatchError> {
    let LoadedRequest {
        template,
        mapping,
        table,
    } = loaded;
    let (progress_tx, mut progress_rx) = mpsc::channel::<DispatchProgress>(100);

    // Progress is forwarded from the same task so that no `InProgress`
    // update can overtake the final status.
    let run = async {
        let progress_tx = progress_tx;
        engine
            .run(&table, &template, &mapping, image_url, cancel, Some(&progress_tx))
            .await
    };
    let forward = async {
        while let Some(progress) = progress_rx.recv().await {
            let _ = tx
                .send(JobUpdate {
                    job_id: job_id.to_string(),
                    status: JobStatus::InProgress(progress.completed as u32),
                })
                .await;
        }
    };
    let (results, ()) = tokio::join!(run, forward);
    let results = results?;

    let suffix = job_id.get(..8).unwrap_or(job_id).to_string();
    let engine = engine.clone();
    tokio::task::spawn_blocking(move || engine.build_report(&table, &results, &suffix)).await?
}
