use crate::config::AppConfig;
use crate::error::DispatchError;
use crate::services::data_sources::csv::load::load_table;
use crate::services::templates::store::TemplateStore;
use common::model::mapping::MappingSpec;
use common::model::record::Table;
use common::model::template::Template;
use common::requests::DispatchRequest;

/// Everything a request names, loaded: the template, the mapping to use
/// (the request's, else the saved one) and the data source table.
pub(crate) struct LoadedRequest {
    pub template: Template,
    pub mapping: MappingSpec,
    pub table: Table,
}

pub(crate) fn load_request(
    req: &DispatchRequest,
    store: &TemplateStore,
    config: &AppConfig,
) -> Result<LoadedRequest, DispatchError> {
    let template = store.get(&req.template_name)?;
    let mapping = req
        .mapping
        .clone()
        .unwrap_or_else(|| template.mappings.clone());
    let table = load_table(&config.data_dir, &req.data_source_id)?;
    Ok(LoadedRequest {
        template,
        mapping,
        table,
    })
}
