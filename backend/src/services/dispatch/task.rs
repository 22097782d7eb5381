//! Builds one `ResolvedTask` per record.

use crate::services::dispatch::resolver::resolve;
use common::model::dispatch::ResolvedTask;
use common::model::mapping::MappingSpec;
use common::model::record::{DispatchRecord, Table};
use std::collections::BTreeMap;

/// True for values that look like an absolute http(s) URL.
pub fn has_url_scheme(value: &str) -> bool {
    let lower = value.get(..8).unwrap_or(value).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Image for one record, by priority: the run-wide image, then the record's
/// `image_column` value if it is a URL, then none.
pub fn resolve_image(
    record: &DispatchRecord<'_>,
    mapping: &MappingSpec,
    run_image: Option<&str>,
) -> String {
    if let Some(url) = run_image.filter(|u| !u.trim().is_empty()) {
        return url.trim().to_string();
    }
    mapping
        .image_column()
        .map(|m| resolve(record, m))
        .filter(|value| has_url_scheme(value))
        .unwrap_or_default()
}

pub fn build_task(
    record: &DispatchRecord<'_>,
    mapping: &MappingSpec,
    run_image: Option<&str>,
) -> ResolvedTask {
    let mobile_no = mapping
        .mobile()
        .map(|m| resolve(record, m))
        .unwrap_or_default();
    let params: BTreeMap<String, String> = mapping
        .params()
        .map(|(field, m)| (field.clone(), resolve(record, m)))
        .collect();

    ResolvedTask {
        row_index: record.index,
        mobile_no,
        params,
        image_url: resolve_image(record, mapping, run_image),
    }
}

/// One task per row, in row order.
pub fn build_tasks(table: &Table, mapping: &MappingSpec, run_image: Option<&str>) -> Vec<ResolvedTask> {
    table
        .records()
        .map(|record| build_task(&record, mapping, run_image))
        .collect()
}
