use super::blocking;
use crate::auth::AuthenticatedOwner;
use crate::error::ServiceResult;
use crate::reconciler::Reconciler;
use actix_web::{web, HttpResponse};
use common::responses::DeletionResponse;

/// `DELETE /api/upload/{file_id}`. Permanent; there is no undo.
pub(crate) async fn process(
    owner: AuthenticatedOwner,
    file_id: web::Path<String>,
    reconciler: web::Data<Reconciler>,
) -> ServiceResult<HttpResponse> {
    let file_id = file_id.into_inner();
    let outcome = blocking(move || reconciler.request_file_deletion(owner.id(), &file_id)).await?;
    Ok(HttpResponse::Ok().json(DeletionResponse::from(outcome)))
}
