use crate::model::mapping::MappingSpec;
use serde::{Deserialize, Serialize};

/// Body of `POST /api/dispatch/validate`, `/preview` and `/start`.
///
/// When `mapping` is absent the mapping saved with the template is used.
/// `image_url` is the run-wide image that overrides every per-record one.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DispatchRequest {
    pub template_name: String,
    pub data_source_id: String,
    #[serde(default)]
    pub mapping: Option<MappingSpec>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Body of `PUT /api/templates/{name}/mapping`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpdateMappingRequest {
    pub mapping: MappingSpec,
}
