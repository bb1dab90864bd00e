//! Error taxonomy of the service and its mapping onto HTTP responses.
//!
//! Every handler returns `ServiceResult`; actix turns the error side into a JSON
//! `{ "message": ... }` body through the `ResponseError` impl below. Server-side
//! failures are logged with their detail and answered with a generic message.

use actix_web::http::header;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use common::responses::MessageResponse;
use log::error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Not authorized, no valid token")]
    Unauthorized,
    #[error("Not authorized to access this file")]
    Forbidden,
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("Could not read spreadsheet: {0}")]
    Parse(String),
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn file_not_found() -> Self {
        ServiceError::NotFound("File not found".to_string())
    }

    pub fn sheet_not_found(sheet_name: &str) -> Self {
        ServiceError::NotFound(format!("Sheet '{}' not found", sheet_name))
    }
}

impl From<tokio::task::JoinError> for ServiceError {
    fn from(err: tokio::task::JoinError) -> Self {
        ServiceError::Internal(format!("join error: {}", err))
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Unauthorized => StatusCode::UNAUTHORIZED,
            ServiceError::Forbidden => StatusCode::FORBIDDEN,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::Parse(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::Store(_)
            | ServiceError::Serialization(_)
            | ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = if status.is_server_error() {
            error!("{}", self);
            "Server error".to_string()
        } else {
            self.to_string()
        };

        let mut builder = HttpResponse::build(status);
        if status == StatusCode::UNAUTHORIZED {
            builder.insert_header((header::WWW_AUTHENTICATE, "Bearer"));
        }
        builder.json(MessageResponse::new(message))
    }
}
