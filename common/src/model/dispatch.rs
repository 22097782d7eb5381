use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Terminal outcome of one send attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DispatchStatus {
    /// The API accepted the message (HTTP 200 or 202).
    Sent,
    /// The API answered with any other status.
    Failed,
    /// The call never produced a usable answer (timeout, connection, bad body).
    Error,
}

impl DispatchStatus {
    /// Rows with this status are highlighted in the report.
    pub fn is_failure(self) -> bool {
        !matches!(self, DispatchStatus::Sent)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DispatchStatus::Sent => "Sent",
            DispatchStatus::Failed => "Failed",
            DispatchStatus::Error => "Error",
        }
    }
}

impl fmt::Display for DispatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a single send task.
///
/// `Pending -> Sending -> {Sent | Failed | Error}`; the last three are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatchTaskState {
    Pending,
    Sending,
    Done(DispatchStatus),
}

/// The concrete payload for one record, ready to send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTask {
    pub row_index: usize,
    pub mobile_no: String,
    pub params: BTreeMap<String, String>,
    /// Empty when the message carries no image.
    pub image_url: String,
}

/// Outcome for one record. Created once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchResult {
    pub row_index: usize,
    pub status: DispatchStatus,
    pub message: String,
}

impl DispatchResult {
    pub fn new(row_index: usize, status: DispatchStatus, message: impl Into<String>) -> Self {
        Self {
            row_index,
            status,
            message: message.into(),
        }
    }
}

/// Counts per status for a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchSummary {
    pub sent: usize,
    pub failed: usize,
    pub error: usize,
}

impl DispatchSummary {
    pub fn from_results(results: &[DispatchResult]) -> Self {
        results.iter().fold(Self::default(), |mut acc, r| {
            match r.status {
                DispatchStatus::Sent => acc.sent += 1,
                DispatchStatus::Failed => acc.failed += 1,
                DispatchStatus::Error => acc.error += 1,
            }
            acc
        })
    }

    pub fn total(&self) -> usize {
        self.sent + self.failed + self.error
    }
}
