//! Runs send tasks under a bounded number of concurrent calls.
//!
//! Every task makes exactly one attempt. A task's outcome is captured as a
//! `DispatchResult` and never affects another task. Completions are merged
//! by row index, so the returned results are in row order whatever order the
//! calls finished in.

use crate::error::SendError;
use crate::services::dispatch::client::{ApiResponse, NotificationApi, NotificationPayload};
use crate::services::dispatch::collector::{CollectError, ResultCollector};
use common::model::dispatch::{DispatchResult, DispatchStatus, DispatchTaskState, ResolvedTask};
use futures_util::stream::{self, StreamExt};
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_SUCCESS_MESSAGE: &str = "Success";
pub const ABORTED_MESSAGE: &str = "Dispatch aborted before send";
pub(crate) const SUCCESS_STATUSES: [u16; 2] = [200, 202];

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub max_concurrency: usize,
    pub timeout: Duration,
    pub sender: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_concurrency: crate::config::DEFAULT_MAX_CONCURRENCY,
            timeout: Duration::from_secs(crate::config::DEFAULT_REQUEST_TIMEOUT_SECS),
            sender: crate::config::DEFAULT_SENDER.to_string(),
        }
    }
}

/// Progress after each completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchProgress {
    pub completed: usize,
    pub total: usize,
}

/// Maps one send attempt to its terminal outcome.
pub fn classify(row_index: usize, outcome: Result<ApiResponse, SendError>) -> DispatchResult {
    match outcome {
        Ok(ApiResponse { status, message }) if SUCCESS_STATUSES.contains(&status) => {
            DispatchResult::new(
                row_index,
                DispatchStatus::Sent,
                message.unwrap_or_else(|| DEFAULT_SUCCESS_MESSAGE.to_string()),
            )
        }
        Ok(ApiResponse { status, message }) => DispatchResult::new(
            row_index,
            DispatchStatus::Failed,
            message.unwrap_or_else(|| format!("HTTP {status}")),
        ),
        Err(err) => DispatchResult::new(row_index, DispatchStatus::Error, err.to_string()),
    }
}

#[derive(Clone)]
pub struct DispatchScheduler {
    api: Arc<dyn NotificationApi>,
    config: SchedulerConfig,
}

impl DispatchScheduler {
    pub fn new(api: Arc<dyn NotificationApi>, config: SchedulerConfig) -> Self {
        Self { api, config }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Sends every task and returns one result per task, in row order.
    ///
    /// Rows not yet started when `cancel` fires are not sent; they get an
    /// `Error` result. Calls already in flight finish normally.
    pub async fn run(
        &self,
        template_id: &str,
        tasks: Vec<ResolvedTask>,
        cancel: &CancellationToken,
        progress: Option<&mpsc::Sender<DispatchProgress>>,
    ) -> Result<Vec<DispatchResult>, CollectError> {
        let total = tasks.len();
        let mut collector = ResultCollector::new(total);
        debug!("{} tasks {:?}", total, DispatchTaskState::Pending);

        let mut completions = stream::iter(tasks)
            .map(|task| async move {
                if cancel.is_cancelled() {
                    return DispatchResult::new(task.row_index, DispatchStatus::Error, ABORTED_MESSAGE);
                }
                self.send_one(template_id, &task).await
            })
            .buffer_unordered(self.config.max_concurrency.max(1));

        while let Some(result) = completions.next().await {
            if result.status.is_failure() {
                warn!(
                    "row {} {}: {}",
                    result.row_index, result.status, result.message
                );
            }
            let completed = collector.record(result)?;
            if let Some(tx) = progress {
                let _ = tx.send(DispatchProgress { completed, total }).await;
            }
        }

        collector.finish()
    }

    async fn send_one(&self, template_id: &str, task: &ResolvedTask) -> DispatchResult {
        debug!("row {} {:?}", task.row_index, DispatchTaskState::Sending);
        let payload = NotificationPayload::for_task(task, &self.config.sender, template_id);

        let outcome = match tokio::time::timeout(self.config.timeout, self.api.push(&payload)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(SendError::Timeout(self.config.timeout)),
        };

        let result = classify(task.row_index, outcome);
        debug!(
            "row {} {:?}",
            task.row_index,
            DispatchTaskState::Done(result.status)
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Answers by recipient number: "fail" -> 400, "boom" -> transport error,
    /// "slow" -> sleeps past any short timeout, anything else -> 200.
    #[derive(Default)]
    struct ScriptedApi {
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        seen: Mutex<Vec<NotificationPayload>>,
    }

    #[async_trait]
    impl NotificationApi for ScriptedApi {
        async fn push(&self, payload: &NotificationPayload) -> Result<ApiResponse, SendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            self.seen.lock().unwrap().push(payload.clone());

            let number = payload.user_details.number.clone();
            let delay = if number == "slow" { 500 } else { 10 };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            match number.as_str() {
                "fail" => Ok(ApiResponse {
                    status: 400,
                    message: Some("invalid number".into()),
                }),
                "boom" => Err(SendError::Transport("connection reset".into())),
                _ => Ok(ApiResponse {
                    status: 200,
                    message: None,
                }),
            }
        }
    }

    fn task(row: usize, number: &str) -> ResolvedTask {
        ResolvedTask {
            row_index: row,
            mobile_no: number.into(),
            params: BTreeMap::new(),
            image_url: String::new(),
        }
    }

    fn scheduler(api: Arc<ScriptedApi>, max_concurrency: usize, timeout_ms: u64) -> DispatchScheduler {
        DispatchScheduler::new(
            api,
            SchedulerConfig {
                max_concurrency,
                timeout: Duration::from_millis(timeout_ms),
                sender: "9193".into(),
            },
        )
    }

    #[test]
    fn classification() {
        let sent = classify(0, Ok(ApiResponse { status: 202, message: None }));
        assert_eq!(sent, DispatchResult::new(0, DispatchStatus::Sent, "Success"));

        let failed = classify(1, Ok(ApiResponse { status: 503, message: None }));
        assert_eq!(failed, DispatchResult::new(1, DispatchStatus::Failed, "HTTP 503"));

        let rejected = classify(
            2,
            Ok(ApiResponse {
                status: 400,
                message: Some("bad template".into()),
            }),
        );
        assert_eq!(rejected.message, "bad template");

        let error = classify(3, Err(SendError::Transport("refused".into())));
        assert_eq!(error.status, DispatchStatus::Error);
        assert_eq!(error.message, "transport error: refused");
    }

    #[tokio::test]
    async fn failures_stay_in_their_row() {
        let api = Arc::new(ScriptedApi::default());
        let tasks = vec![task(0, "111"), task(1, "boom"), task(2, "222"), task(3, "fail")];

        let results = scheduler(api.clone(), 4, 1_000)
            .run("tpl", tasks, &CancellationToken::new(), None)
            .await
            .unwrap();

        let statuses: Vec<DispatchStatus> = results.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![
                DispatchStatus::Sent,
                DispatchStatus::Error,
                DispatchStatus::Sent,
                DispatchStatus::Failed
            ]
        );
        assert_eq!(results[3].message, "invalid number");
        assert_eq!(api.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn concurrency_is_bounded() {
        let api = Arc::new(ScriptedApi::default());
        let tasks: Vec<ResolvedTask> = (0..12).map(|i| task(i, "111")).collect();

        let results = scheduler(api.clone(), 3, 1_000)
            .run("tpl", tasks, &CancellationToken::new(), None)
            .await
            .unwrap();

        assert_eq!(results.len(), 12);
        assert!(api.max_in_flight.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn slow_call_times_out_as_error() {
        let api = Arc::new(ScriptedApi::default());
        let results = scheduler(api, 2, 50)
            .run("tpl", vec![task(0, "slow"), task(1, "111")], &CancellationToken::new(), None)
            .await
            .unwrap();

        assert_eq!(results[0].status, DispatchStatus::Error);
        assert!(results[0].message.contains("timed out"));
        assert_eq!(results[1].status, DispatchStatus::Sent);
    }

    #[tokio::test]
    async fn cancelled_batch_sends_nothing_new() {
        let api = Arc::new(ScriptedApi::default());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let results = scheduler(api.clone(), 2, 1_000)
            .run("tpl", vec![task(0, "111"), task(1, "222")], &cancel, None)
            .await
            .unwrap();

        assert_eq!(api.calls.load(Ordering::SeqCst), 0);
        assert!(results
            .iter()
            .all(|r| r.status == DispatchStatus::Error && r.message == ABORTED_MESSAGE));
    }

    /// Accepts every call and cancels the batch during the first one.
    struct CancelOnFirstPush {
        calls: AtomicUsize,
        cancel: CancellationToken,
    }

    #[async_trait]
    impl NotificationApi for CancelOnFirstPush {
        async fn push(&self, _payload: &NotificationPayload) -> Result<ApiResponse, SendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.cancel.cancel();
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok(ApiResponse {
                status: 200,
                message: None,
            })
        }
    }

    #[tokio::test]
    async fn cancel_mid_batch_finishes_in_flight_and_skips_the_rest() {
        let cancel = CancellationToken::new();
        let api = Arc::new(CancelOnFirstPush {
            calls: AtomicUsize::new(0),
            cancel: cancel.clone(),
        });
        let scheduler = DispatchScheduler::new(
            api.clone(),
            SchedulerConfig {
                max_concurrency: 1,
                timeout: Duration::from_secs(1),
                sender: "9193".into(),
            },
        );

        let results = scheduler
            .run("tpl", vec![task(0, "1"), task(1, "2"), task(2, "3")], &cancel, None)
            .await
            .unwrap();

        assert_eq!(
            results,
            vec![
                DispatchResult::new(0, DispatchStatus::Sent, DEFAULT_SUCCESS_MESSAGE),
                DispatchResult::new(1, DispatchStatus::Error, ABORTED_MESSAGE),
                DispatchResult::new(2, DispatchStatus::Error, ABORTED_MESSAGE),
            ]
        );
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn progress_counts_every_completion() {
        let api = Arc::new(ScriptedApi::default());
        let (tx, mut rx) = mpsc::channel(16);

        scheduler(api, 2, 1_000)
            .run(
                "tpl",
                vec![task(0, "1"), task(1, "2"), task(2, "3")],
                &CancellationToken::new(),
                Some(&tx),
            )
            .await
            .unwrap();
        drop(tx);

        let mut seen = Vec::new();
        while let Some(p) = rx.recv().await {
            seen.push(p.completed);
            assert_eq!(p.total, 3);
        }
        assert_eq!(seen, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn payload_uses_configured_sender_and_template() {
        let api = Arc::new(ScriptedApi::default());
        scheduler(api.clone(), 1, 1_000)
            .run("tpl_9", vec![task(0, "111")], &CancellationToken::new(), None)
            .await
            .unwrap();

        let seen = api.seen.lock().unwrap();
        assert_eq!(seen[0].notification.sender, "9193");
        assert_eq!(seen[0].notification.template_id, "tpl_9");
        assert_eq!(seen[0].notification.kind, "whatsapp");
    }
}
