use serde::Serialize;

/// Status of a background job as reported to polling clients.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum JobStatus {
    Pending,
    /// Number of rows that have reached a terminal state so far.
    InProgress(u32),
    /// Path of the written report.
    Completed(String),
    Failed(String),
}

impl JobStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, JobStatus::Completed(_) | JobStatus::Failed(_))
    }
}
