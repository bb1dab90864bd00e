use serde::{Deserialize, Serialize};

/// What a deletion request actually did.
///
/// A sheet deletion can turn into a file deletion when it targets the last sheet of a
/// file, so clients should look at the outcome (and re-fetch the history) instead of
/// assuming the kind of deletion they asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum DeletionOutcome {
    /// The whole record is gone.
    FileDeleted { file_id: String },
    /// One sheet was removed; `sheet_names` is what the record holds now.
    SheetDeleted {
        file_id: String,
        sheet_names: Vec<String>,
    },
}

impl DeletionOutcome {
    /// Human readable summary, returned alongside the outcome.
    pub fn message(&self) -> &'static str {
        match self {
            DeletionOutcome::FileDeleted { .. } => "File deleted successfully",
            DeletionOutcome::SheetDeleted { .. } => "Sheet deleted successfully",
        }
    }
}
