use crate::model::mapping::MappingSpec;
use serde::{Deserialize, Serialize};

/// A reusable WhatsApp message template as kept in the template store.
///
/// `message` carries `{{placeholder}}` tokens; `template_id` is the identifier
/// the notification API knows the approved template by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub template_name: String,
    pub template_id: String,
    pub message: String,
    #[serde(default)]
    pub mappings: MappingSpec,
}

impl Template {
    pub fn new(
        template_name: impl Into<String>,
        template_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            template_name: template_name.into(),
            template_id: template_id.into(),
            message: message.into(),
            mappings: MappingSpec::default(),
        }
    }
}
