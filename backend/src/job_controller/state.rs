//! Tracks the state of background dispatch jobs.
//!
//! A dispatch run is started by `POST /api/dispatch/start` and keeps running
//! after the request returns. Its progress is published here so clients can
//! poll `GET /api/jobs/{job_id}`.
//!
//! - `JobsState`: clonable, shared through `web::Data`, holds every job's
//!   status and the cancellation handle of each running job.
//! - `JobUpdate`: a status change sent by a running job.
//! - `start_job_updater`: the single writer that applies `JobUpdate`s.

use common::jobs::JobStatus;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct JobsState {
    /// Job id to latest status. Read by the status endpoint, written by
    /// `start_job_updater`.
    pub jobs: Arc<RwLock<HashMap<String, JobStatus>>>,

    /// Cancellation handles of jobs that have not finished yet.
    pub cancellations: Arc<RwLock<HashMap<String, CancellationToken>>>,

    /// Running jobs push their `JobUpdate`s through this sender instead of
    /// writing `jobs` themselves.
    pub tx: mpsc::Sender<JobUpdate>,
}

impl JobsState {
    /// Creates the shared state and the receiver `start_job_updater` drains.
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<JobUpdate>) {
        let (tx, rx) = mpsc::channel(buffer);
        let state = JobsState {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            cancellations: Arc::new(RwLock::new(HashMap::new())),
            tx,
        };
        (state, rx)
    }

    /// Registers a new job as `Pending` and returns its cancellation token.
    pub async fn register(&self, job_id: &str) -> CancellationToken {
        let token = CancellationToken::new();
        self.jobs
            .write()
            .await
            .insert(job_id.to_string(), JobStatus::Pending);
        self.cancellations
            .write()
            .await
            .insert(job_id.to_string(), token.clone());
        token
    }

    /// Signals a running job to stop submitting rows. Returns false when the
    /// job is unknown or already finished.
    pub async fn cancel(&self, job_id: &str) -> bool {
        match self.cancellations.read().await.get(job_id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub async fn status(&self, job_id: &str) -> Option<JobStatus> {
        self.jobs.read().await.get(job_id).cloned()
    }
}

#[derive(Debug)]
pub struct JobUpdate {
    pub job_id: String,
    pub status: JobStatus,
}

/// Applies every `JobUpdate` received on `rx` to the shared state.
///
/// Meant to run for the lifetime of the server (spawned from `main`). A
/// finished job's cancellation handle is dropped here.
pub async fn start_job_updater(state: JobsState, mut rx: mpsc::Receiver<JobUpdate>) {
    while let Some(update) = rx.recv().await {
        if update.status.is_finished() {
            state.cancellations.write().await.remove(&update.job_id);
        }
        let mut jobs = state.jobs.write().await;
        jobs.insert(update.job_id, update.status);
    }
}
