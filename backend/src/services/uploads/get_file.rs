//! # File Retrieval Service
//!
//! Backs `GET /api/upload/{file_id}`: one record with the parsed rows and headers of all
//! of its sheets, as stored at upload time minus any sheets deleted since.

use super::blocking;
use crate::auth::AuthenticatedOwner;
use crate::error::ServiceResult;
use crate::reconciler::Reconciler;
use actix_web::{web, HttpResponse};

/// Actix web handler for `GET /api/upload/{file_id}`.
///
/// # Returns
///
/// - `200 OK` with the `FileRecord` as JSON.
/// - `404 Not Found` when no such file exists, `403 Forbidden` when it belongs to
///   another owner.
pub(crate) async fn process(
    owner: AuthenticatedOwner,
    file_id: web::Path<String>,
    reconciler: web::Data<Reconciler>,
) -> ServiceResult<HttpResponse> {
    let file_id = file_id.into_inner();
    let record = blocking(move || reconciler.get_file(owner.id(), &file_id)).await?;
    Ok(HttpResponse::Ok().json(record))
}
