//! Best-effort text rendering of a template, used for previews only. The
//! send path transmits parameters as structured data instead.

use crate::error::DispatchError;
use crate::services::dispatch::resolver::{placeholder_regex, resolve};
use common::model::mapping::MappingSpec;
use common::model::record::Table;
use common::model::template::Template;
use serde::Serialize;
use std::collections::BTreeMap;

/// Replaces each `{{field}}` with `params[field]` in a single left-to-right
/// pass. Tokens without a value are kept verbatim; substituted values are
/// never rescanned.
pub fn render(body: &str, params: &BTreeMap<String, String>) -> String {
    placeholder_regex()
        .replace_all(body, |caps: &regex::Captures| match params.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preview {
    pub to: String,
    pub message: String,
}

/// Renders the message the first record would receive.
pub fn preview(
    template: &Template,
    mapping: &MappingSpec,
    table: &Table,
) -> Result<Preview, DispatchError> {
    let record = table
        .record(0)
        .ok_or_else(|| DispatchError::Preview("data source has no rows".to_string()))?;
    let mobile = mapping
        .mobile()
        .ok_or_else(|| DispatchError::Preview("mobile_no is not mapped".to_string()))?;

    let params: BTreeMap<String, String> = mapping
        .params()
        .map(|(field, m)| (field.clone(), resolve(&record, m)))
        .collect();

    Ok(Preview {
        to: resolve(&record, mobile),
        message: render(&template.message, &params),
    })
}
