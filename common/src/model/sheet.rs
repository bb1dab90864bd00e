use crate::model::file_record::Row;
use serde::{Deserialize, Serialize};

/// Content of a single sheet of an uploaded file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetData {
    pub file_id: String,
    pub sheet_name: String,
    pub column_headers: Vec<String>,
    pub rows: Vec<Row>,
}
