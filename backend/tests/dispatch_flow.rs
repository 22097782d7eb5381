//! End-to-end runs of the dispatch engine against a fake notification API.

use async_trait::async_trait;
use common::model::dispatch::DispatchStatus;
use common::model::mapping::{FieldMapping, MappingSpec, IMAGE_COLUMN, MOBILE_NO};
use common::model::record::Table;
use common::model::template::Template;
use rand::Rng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wa_dispatch::error::{DispatchError, SendError};
use wa_dispatch::services::dispatch::client::{ApiResponse, NotificationApi, NotificationPayload};
use wa_dispatch::services::dispatch::engine::DispatchEngine;
use wa_dispatch::services::dispatch::scheduler::SchedulerConfig;

/// Sleeps a random few milliseconds per call so completions arrive out of
/// order, then answers according to the recipient number.
#[derive(Default)]
struct JitteryApi {
    calls: AtomicUsize,
    payloads: Mutex<Vec<NotificationPayload>>,
}

#[async_trait]
impl NotificationApi for JitteryApi {
    async fn push(&self, payload: &NotificationPayload) -> Result<ApiResponse, SendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.payloads.lock().unwrap().push(payload.clone());
        let delay = rand::rng().random_range(1..25);
        tokio::time::sleep(Duration::from_millis(delay)).await;

        let number = payload.user_details.number.as_str();
        match number {
            n if n.starts_with("err") => Err(SendError::Transport("connection reset".into())),
            n if n.starts_with("bad") => Ok(ApiResponse {
                status: 400,
                message: Some(format!("rejected {n}")),
            }),
            n => Ok(ApiResponse {
                status: 200,
                message: Some(format!("queued {n}")),
            }),
        }
    }
}

fn engine(api: Arc<JitteryApi>, report_dir: &TempDir, strict: bool) -> DispatchEngine {
    DispatchEngine::new(
        api,
        SchedulerConfig {
            max_concurrency: 4,
            timeout: Duration::from_secs(2),
            sender: "919311239211".into(),
        },
        report_dir.path(),
        strict,
    )
}

fn template() -> Template {
    Template::new("welcome", "tpl_welcome", "Hi {{name}}, your code is {{code}}")
}

fn mapping() -> MappingSpec {
    MappingSpec::new()
        .with(MOBILE_NO, FieldMapping::column("Phone"))
        .with("name", FieldMapping::column("Name"))
        .with("code", FieldMapping::literal("X1"))
}

fn table(numbers: &[&str]) -> Table {
    Table::new(
        vec!["Name".into(), "Phone".into(), "Banner".into()],
        numbers
            .iter()
            .enumerate()
            .map(|(i, n)| vec![format!("user{i}"), n.to_string(), String::new()])
            .collect(),
    )
}

#[tokio::test]
async fn results_follow_input_order_under_random_completion() {
    let dir = TempDir::new().unwrap();
    let api = Arc::new(JitteryApi::default());
    let numbers: Vec<String> = (0..40).map(|i| format!("9100{i:04}")).collect();
    let refs: Vec<&str> = numbers.iter().map(String::as_str).collect();

    let results = engine(api.clone(), &dir, false)
        .run(&table(&refs), &template(), &mapping(), None, &CancellationToken::new(), None)
        .await
        .unwrap();

    assert_eq!(results.len(), 40);
    for (i, result) in results.iter().enumerate() {
        assert_eq!(result.row_index, i);
        assert_eq!(result.status, DispatchStatus::Sent);
        assert_eq!(result.message, format!("queued {}", numbers[i]));
    }
    assert_eq!(api.calls.load(Ordering::SeqCst), 40);
}

#[tokio::test]
async fn a_transport_failure_only_affects_its_row() {
    let dir = TempDir::new().unwrap();
    let api = Arc::new(JitteryApi::default());

    let results = engine(api, &dir, false)
        .run(
            &table(&["111", "err-222", "333"]),
            &template(),
            &mapping(),
            None,
            &CancellationToken::new(),
            None,
        )
        .await
        .unwrap();

    let statuses: Vec<DispatchStatus> = results.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![DispatchStatus::Sent, DispatchStatus::Error, DispatchStatus::Sent]
    );
    let rows: Vec<usize> = results.iter().map(|r| r.row_index).collect();
    assert_eq!(rows, vec![0, 1, 2]);
    assert_eq!(results[0].message, "queued 111");
    assert_eq!(results[2].message, "queued 333");
}

#[tokio::test]
async fn missing_mapping_sends_nothing() {
    let dir = TempDir::new().unwrap();
    let api = Arc::new(JitteryApi::default());
    let incomplete = MappingSpec::new().with("name", FieldMapping::column("Name"));

    let err = engine(api.clone(), &dir, false)
        .run(&table(&["111", "222"]), &template(), &incomplete, None, &CancellationToken::new(), None)
        .await
        .unwrap_err();

    match err {
        DispatchError::Configuration { missing } => assert_eq!(missing, vec!["mobile_no", "code"]),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(api.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn strict_mode_refuses_unknown_columns() {
    let dir = TempDir::new().unwrap();
    let api = Arc::new(JitteryApi::default());
    let mapping = mapping().with("name", FieldMapping::column("FullName"));

    let err = engine(api.clone(), &dir, true)
        .run(&table(&["111"]), &template(), &mapping, None, &CancellationToken::new(), None)
        .await
        .unwrap_err();

    assert!(matches!(err, DispatchError::UnknownColumns { ref columns } if columns == &vec!["FullName".to_string()]));
    assert_eq!(api.calls.load(Ordering::SeqCst), 0);

    // The lenient default sends with an empty value instead.
    let results = engine(api.clone(), &dir, false)
        .run(&table(&["111"]), &template(), &mapping, None, &CancellationToken::new(), None)
        .await
        .unwrap();
    assert_eq!(results[0].status, DispatchStatus::Sent);
    assert_eq!(api.payloads.lock().unwrap()[0].notification.params["name"], "");
}

#[tokio::test]
async fn run_wide_image_reaches_every_payload() {
    let dir = TempDir::new().unwrap();
    let api = Arc::new(JitteryApi::default());
    let mapping = mapping().with(IMAGE_COLUMN, FieldMapping::column("Banner"));

    engine(api.clone(), &dir, false)
        .run(
            &table(&["111", "222"]),
            &template(),
            &mapping,
            Some("https://i.ibb.co/run.png"),
            &CancellationToken::new(),
            None,
        )
        .await
        .unwrap();

    let payloads = api.payloads.lock().unwrap();
    assert_eq!(payloads.len(), 2);
    for payload in payloads.iter() {
        let media = payload.notification.media.as_ref().unwrap();
        assert_eq!(media.media_link, "https://i.ibb.co/run.png");
        assert!(!payload.notification.params.contains_key(IMAGE_COLUMN));
    }
}

#[tokio::test]
async fn report_marks_failed_and_errored_rows() {
    let dir = TempDir::new().unwrap();
    let api = Arc::new(JitteryApi::default());
    let engine = engine(api, &dir, false);
    let table = table(&["111", "bad-222", "err-333"]);

    let results = engine
        .run(&table, &template(), &mapping(), None, &CancellationToken::new(), None)
        .await
        .unwrap();
    let path = engine.build_report(&table, &results, "test").unwrap();

    let csv = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "Name,Phone,Banner,Status,API Response");
    assert_eq!(lines[1], "user0,111,,Sent,queued 111");
    assert_eq!(lines[2], "user1,bad-222,,Failed,rejected bad-222");
    assert!(lines[3].starts_with("user2,err-333,,Error,"));

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path.with_extension("json")).unwrap()).unwrap();
    let highlighted: Vec<bool> = json["rows"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["highlighted"].as_bool().unwrap())
        .collect();
    assert_eq!(highlighted, vec![false, true, true]);
}
