use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// One parsed spreadsheet row: column header -> cell value.
///
/// Empty cells are left out of the map, so two rows of the same sheet may carry
/// different key sets.
pub type Row = Map<String, Value>;

/// A persisted upload: one spreadsheet file and the parsed content of each of its sheets.
///
/// `sheet_names` is never empty while the record exists, and every name in it has a
/// matching entry in both `parsed_data` and `column_headers`. The backend keeps those
/// two properties when it deletes sheets: removing the last sheet removes the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// UUID assigned by the store when the record is created. Sent as `_id`.
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    /// The uploading user. Only this user may read or delete the record.
    pub owner_id: String,
    pub original_file_name: String,
    /// Sheet names in workbook order.
    pub sheet_names: Vec<String>,
    /// Rows of each sheet, keyed by sheet name.
    pub parsed_data: BTreeMap<String, Vec<Row>>,
    /// Header row of each sheet, keyed by sheet name.
    pub column_headers: BTreeMap<String, Vec<String>>,
    /// Hex MD5 digest of the uploaded bytes.
    pub content_md5: String,
    /// Bumped on every mutation of the record.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FileRecord {
    /// The history-list view of this record.
    pub fn summary(&self) -> FileSummary {
        FileSummary {
            id: self.id.clone(),
            original_file_name: self.original_file_name.clone(),
            sheet_names: self.sheet_names.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Entry of the upload history list. Carries no sheet content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSummary {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub original_file_name: String,
    pub sheet_names: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
