//! Upload history API.
//!
//! The provided routes are:
//! - `POST /api/upload`: multipart upload of one `.xls`/`.xlsx` file (field `excelFile`,
//!   `file` is accepted too). The workbook is parsed and stored as a new record.
//! - `GET /api/upload/history`: the caller's uploads, newest first.
//! - `GET /api/upload/{file_id}`: one record with the parsed content of all its sheets.
//! - `GET /api/upload/{file_id}/sheet/{sheet_name}`: the content of a single sheet.
//! - `PUT /api/upload/{file_id}/sheet/{sheet_name}`: deletes a sheet. When it is the last
//!   sheet of the file, the whole file is deleted instead; the response says which
//!   happened.
//! - `DELETE /api/upload/{file_id}`: deletes a file and all of its sheets.
//!
//! Every route requires `Authorization: Bearer <token>` and only ever acts on the
//! caller's own records.

use crate::error::ServiceResult;
use actix_web::web::{delete, get, post, put, scope};
use actix_web::Scope;
use serde::Deserialize;

mod delete_file;
mod delete_sheet;
mod get_file;
mod get_sheet;
mod history;
mod upload;


pub use upload::UploadLimits;

const API_PATH: &str = "/api/upload";

/// Path parameters of the single-sheet routes.
#[derive(Debug, Deserialize)]
pub(crate) struct SheetPath {
    file_id: String,
    sheet_name: String,
}

/// Configures and returns the Actix scope for the upload history routes.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", post().to(upload::process))
        // Registered before `/{file_id}` so it is not taken for a file id.
        .route("/history", get().to(history::process))
        .route("/{file_id}", get().to(get_file::process))
        .route("/{file_id}", delete().to(delete_file::process))
        .route("/{file_id}/sheet/{sheet_name}", get().to(get_sheet::process))
        .route("/{file_id}/sheet/{sheet_name}", put().to(delete_sheet::process))
}

/// Runs store or parsing work on the blocking pool.
async fn blocking<T, F>(f: F) -> ServiceResult<T>
where
    F: FnOnce() -> ServiceResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}
