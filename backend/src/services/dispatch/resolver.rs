//! Resolves mapped fields to concrete values for one record, and the
//! validation gate that runs before any task is built.

use crate::error::DispatchError;
use common::model::mapping::{FieldMapping, MappingSpec, MOBILE_NO};
use common::model::record::{DispatchRecord, Table};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

pub(crate) fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{(.*?)\}\}").expect("placeholder regex is valid"))
}

/// Distinct `{{name}}` tokens of a template body, in order of first use.
pub fn extract_placeholders(body: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    placeholder_regex()
        .captures_iter(body)
        .map(|caps| caps[1].to_string())
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

/// Value of one field for one record.
///
/// A column binding reads the record and trims surrounding whitespace; a
/// column the record does not have resolves to an empty string. A literal is
/// returned as is. Never fails and performs no I/O.
pub fn resolve(record: &DispatchRecord<'_>, mapping: &FieldMapping) -> String {
    match mapping {
        FieldMapping::Column(name) => record
            .get(name)
            .map(|value| value.trim().to_string())
            .unwrap_or_default(),
        FieldMapping::Literal(value) => value.clone(),
    }
}

/// Checks that `mapping` binds `mobile_no` and every placeholder of `body`.
///
/// The error names every missing field, `mobile_no` first, then placeholders
/// in template order.
pub fn validate_mapping(body: &str, mapping: &MappingSpec) -> Result<(), DispatchError> {
    let missing: Vec<String> = std::iter::once(MOBILE_NO.to_string())
        .chain(extract_placeholders(body))
        .filter(|field| !mapping.contains(field))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(DispatchError::Configuration { missing })
    }
}

/// Checks that every column binding names a column of `table`.
pub fn validate_columns(mapping: &MappingSpec, table: &Table) -> Result<(), DispatchError> {
    let columns: BTreeSet<String> = mapping
        .iter()
        .filter_map(|(_, m)| m.column_name())
        .filter(|name| !table.has_column(name))
        .map(str::to_string)
        .collect();

    if columns.is_empty() {
        Ok(())
    } else {
        Err(DispatchError::UnknownColumns {
            columns: columns.into_iter().collect(),
        })
    }
}
