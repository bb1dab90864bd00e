//! # Sheet Retrieval Service
//!
//! Backs `GET /api/upload/{file_id}/sheet/{sheet_name}`: the headers and rows of a single
//! sheet, for clients that render one sheet at a time.

use super::{blocking, SheetPath};
use crate::auth::AuthenticatedOwner;
use crate::error::ServiceResult;
use crate::reconciler::Reconciler;
use actix_web::{web, HttpResponse};

/// Actix web handler for `GET /api/upload/{file_id}/sheet/{sheet_name}`.
///
/// The sheet name is percent-decoded from the path, so names containing spaces work.
///
/// # Returns
///
/// - `200 OK` with a `SheetData` JSON body.
/// - `404 Not Found` when the file or the sheet does not exist, `403 Forbidden` when the
///   file belongs to another owner.
pub(crate) async fn process(
    owner: AuthenticatedOwner,
    path: web::Path<SheetPath>,
    reconciler: web::Data<Reconciler>,
) -> ServiceResult<HttpResponse> {
    let SheetPath {
        file_id,
        sheet_name,
    } = path.into_inner();
    let sheet = blocking(move || reconciler.get_sheet(owner.id(), &file_id, &sheet_name)).await?;
    Ok(HttpResponse::Ok().json(sheet))
}
