//! The request/response surface of a dispatch run: validate a mapping,
//! run a batch, build its report. Nothing here depends on the HTTP layer.

use crate::config::AppConfig;
use crate::error::{DispatchError, SendError};
use crate::services::dispatch::client::{HttpNotificationApi, NotificationApi};
use crate::services::dispatch::report::{report_stem, Report};
use crate::services::dispatch::resolver::{validate_columns, validate_mapping};
use crate::services::dispatch::scheduler::{DispatchProgress, DispatchScheduler, SchedulerConfig};
use crate::services::dispatch::task::build_tasks;
use common::model::dispatch::{DispatchResult, DispatchSummary};
use common::model::mapping::MappingSpec;
use common::model::record::Table;
use common::model::template::Template;
use log::info;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub struct DispatchEngine {
    scheduler: DispatchScheduler,
    report_dir: PathBuf,
    strict_columns: bool,
}

impl DispatchEngine {
    pub fn new(
        api: Arc<dyn NotificationApi>,
        scheduler_config: SchedulerConfig,
        report_dir: impl AsRef<Path>,
        strict_columns: bool,
    ) -> Self {
        Self {
            scheduler: DispatchScheduler::new(api, scheduler_config),
            report_dir: report_dir.as_ref().to_path_buf(),
            strict_columns,
        }
    }

    /// Engine sending through the HTTP notification API configured in `config`.
    pub fn from_config(config: &AppConfig) -> Result<Self, SendError> {
        let api = HttpNotificationApi::new(
            config.api_url.clone(),
            config.api_key.clone(),
            config.request_timeout,
        )?;
        Ok(Self::new(
            Arc::new(api),
            SchedulerConfig {
                max_concurrency: config.max_concurrency,
                timeout: config.request_timeout,
                sender: config.sender.clone(),
            },
            &config.report_dir,
            config.strict_columns,
        ))
    }

    /// The gate every run passes before any task is built.
    pub fn validate(
        &self,
        template: &Template,
        mapping: &MappingSpec,
        table: &Table,
    ) -> Result<(), DispatchError> {
        validate_mapping(&template.message, mapping)?;
        if self.strict_columns {
            validate_columns(mapping, table)?;
        }
        Ok(())
    }

    /// Sends one message per row of `table` and returns the results in row
    /// order. Fails only if validation fails, in which case nothing is sent.
    pub async fn run(
        &self,
        table: &Table,
        template: &Template,
        mapping: &MappingSpec,
        run_image: Option<&str>,
        cancel: &CancellationToken,
        progress: Option<&mpsc::Sender<DispatchProgress>>,
    ) -> Result<Vec<DispatchResult>, DispatchError> {
        self.validate(template, mapping, table)?;

        let tasks = build_tasks(table, mapping, run_image);
        info!(
            "dispatching template '{}' to {} rows (concurrency {})",
            template.template_name,
            tasks.len(),
            self.scheduler.config().max_concurrency
        );

        let results = self
            .scheduler
            .run(&template.template_id, tasks, cancel, progress)
            .await?;

        let summary = DispatchSummary::from_results(&results);
        info!(
            "template '{}' done: {}/{} sent, {} failed, {} errors",
            template.template_name,
            summary.sent,
            summary.total(),
            summary.failed,
            summary.error
        );
        Ok(results)
    }

    /// Writes the report for a finished run and returns the CSV path.
    pub fn build_report(
        &self,
        table: &Table,
        results: &[DispatchResult],
        suffix: &str,
    ) -> Result<PathBuf, DispatchError> {
        let report = Report::build(table, results)?;
        let path = report.persist(&self.report_dir, &report_stem(suffix))?;
        info!("report written to {}", path.display());
        Ok(path)
    }
}
