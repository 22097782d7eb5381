use serde::{Deserialize, Serialize};

/// Summary of an uploaded CSV data source, returned after upload and
/// used by clients to pick columns for a mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSource {
    /// MD5 of the uploaded bytes; also the stored file name.
    pub id: String,
    pub headers: Vec<String>,
    pub row_count: usize,
}
