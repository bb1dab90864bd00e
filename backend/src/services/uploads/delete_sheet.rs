use super::{blocking, SheetPath};
use crate::auth::AuthenticatedOwner;
use crate::error::ServiceResult;
use crate::reconciler::Reconciler;
use actix_web::{web, HttpResponse};
use common::responses::DeletionResponse;

/// `PUT /api/upload/{file_id}/sheet/{sheet_name}`.
///
/// The outcome may be a file deletion (last sheet), so the body always carries it.
pub(crate) async fn process(
    owner: AuthenticatedOwner,
    path: web::Path<SheetPath>,
    reconciler: web::Data<Reconciler>,
) -> ServiceResult<HttpResponse> {
    let SheetPath {
        file_id,
        sheet_name,
    } = path.into_inner();
    let outcome = blocking(move || {
        reconciler.request_sheet_deletion(owner.id(), &file_id, &sheet_name)
    })
    .await?;
    Ok(HttpResponse::Ok().json(DeletionResponse::from(outcome)))
}
