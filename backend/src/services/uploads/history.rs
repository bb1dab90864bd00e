//! # Upload History Service
//!
//! Backs `GET /api/upload/history`: the caller's uploads, newest first. Each entry is a
//! `FileSummary` (id, file name, sheet names, timestamps) without any sheet content, so
//! the list stays small however large the workbooks are.

use super::blocking;
use crate::auth::AuthenticatedOwner;
use crate::error::ServiceResult;
use crate::reconciler::Reconciler;
use actix_web::{web, HttpResponse};

/// Actix web handler for `GET /api/upload/history`.
///
/// # Returns
///
/// `200 OK` with a JSON array of `FileSummary`, empty when the caller has uploaded
/// nothing. Records of other owners are never listed.
pub(crate) async fn process(
    owner: AuthenticatedOwner,
    reconciler: web::Data<Reconciler>,
) -> ServiceResult<HttpResponse> {
    let history = blocking(move || reconciler.list_history(owner.id())).await?;
    Ok(HttpResponse::Ok().json(history))
}
