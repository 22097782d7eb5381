//! Field bindings between a template and the columns of a data source.
//!
//! Every mapped field, including the reserved `mobile_no` and `image_column`
//! keys, is a [`FieldMapping`]. The serialized shape is the one the template
//! store has always used: `{"type": "column", "value": "Name"}` for a column
//! reference and `{"type": "custom", "value": "X1"}` for a literal. A bare
//! string is read as a column reference, which is how older stores saved the
//! image column.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Reserved key holding the recipient number binding.
pub const MOBILE_NO: &str = "mobile_no";
/// Reserved key holding the per-record image URL binding.
pub const IMAGE_COLUMN: &str = "image_column";

/// Where the value of one field comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum FieldMapping {
    /// Read the named field of the current record.
    Column(String),
    /// Use the same fixed value for every record.
    #[serde(rename = "custom")]
    Literal(String),
}

impl FieldMapping {
    pub fn column(name: impl Into<String>) -> Self {
        FieldMapping::Column(name.into())
    }

    pub fn literal(value: impl Into<String>) -> Self {
        FieldMapping::Literal(value.into())
    }

    /// The column name, if this binding reads from the record.
    pub fn column_name(&self) -> Option<&str> {
        match self {
            FieldMapping::Column(name) => Some(name),
            FieldMapping::Literal(_) => None,
        }
    }
}

#[derive(Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
enum TaggedFieldMapping {
    Column(String),
    #[serde(rename = "custom", alias = "literal")]
    Literal(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFieldMapping {
    Tagged(TaggedFieldMapping),
    Bare(String),
}

impl<'de> Deserialize<'de> for FieldMapping {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawFieldMapping::deserialize(deserializer).map(FieldMapping::from)
    }
}

impl From<RawFieldMapping> for FieldMapping {
    fn from(raw: RawFieldMapping) -> Self {
        match raw {
            RawFieldMapping::Tagged(TaggedFieldMapping::Column(name)) => FieldMapping::Column(name),
            RawFieldMapping::Tagged(TaggedFieldMapping::Literal(value)) => {
                FieldMapping::Literal(value)
            }
            RawFieldMapping::Bare(name) => FieldMapping::Column(name),
        }
    }
}

/// Field name to binding, for one template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MappingSpec(BTreeMap<String, FieldMapping>);

impl MappingSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        field: impl Into<String>,
        mapping: FieldMapping,
    ) -> Option<FieldMapping> {
        self.0.insert(field.into(), mapping)
    }

    pub fn with(mut self, field: impl Into<String>, mapping: FieldMapping) -> Self {
        self.insert(field, mapping);
        self
    }

    pub fn get(&self, field: &str) -> Option<&FieldMapping> {
        self.0.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldMapping)> {
        self.0.iter()
    }

    pub fn mobile(&self) -> Option<&FieldMapping> {
        self.get(MOBILE_NO)
    }

    pub fn image_column(&self) -> Option<&FieldMapping> {
        self.get(IMAGE_COLUMN)
    }

    /// Bindings that become message parameters: everything except the
    /// reserved keys.
    pub fn params(&self) -> impl Iterator<Item = (&String, &FieldMapping)> {
        self.0
            .iter()
            .filter(|(field, _)| field.as_str() != MOBILE_NO && field.as_str() != IMAGE_COLUMN)
    }
}

impl FromIterator<(String, FieldMapping)> for MappingSpec {
    fn from_iter<T: IntoIterator<Item = (String, FieldMapping)>>(iter: T) -> Self {
        MappingSpec(iter.into_iter().collect())
    }
}
