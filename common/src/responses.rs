use crate::model::deletion::DeletionOutcome;
use crate::model::file_record::FileSummary;
use serde::{Deserialize, Serialize};

/// Body of every error response, and of plain acknowledgements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Body of `POST /api/upload`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    pub file: FileSummary,
}

/// Body of the two deletion endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeletionResponse {
    pub message: String,
    #[serde(flatten)]
    pub outcome: DeletionOutcome,
}

impl From<DeletionOutcome> for DeletionResponse {
    fn from(outcome: DeletionOutcome) -> Self {
        Self {
            message: outcome.message().to_string(),
            outcome,
        }
    }
}
