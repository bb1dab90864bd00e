//! Bearer-token authentication.
//!
//! Handlers take an [`AuthenticatedOwner`] argument; actix resolves it before the
//! handler body runs, so a request without a valid token never reaches the store's
//! record tables. Tokens themselves are issued elsewhere and provisioned into the
//! `api_tokens` table (see `Store::register_token`).

use crate::error::ServiceError;
use crate::store::Store;
use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;
use log::warn;

/// The user a request acts for, resolved from its `Authorization: Bearer` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedOwner(pub String);

impl AuthenticatedOwner {
    pub fn id(&self) -> &str {
        &self.0
    }
}

impl FromRequest for AuthenticatedOwner {
    type Error = ServiceError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let token = bearer_token(req);
        let store = req.app_data::<web::Data<Store>>().cloned();
        let path = req.path().to_string();

        Box::pin(async move {
            let Some(token) = token else {
                warn!("Rejected {}: missing bearer token", path);
                return Err(ServiceError::Unauthorized);
            };
            let store = store
                .ok_or_else(|| ServiceError::Internal("store is not configured".to_string()))?;

            let owner = tokio::task::spawn_blocking(move || store.resolve_token(&token)).await??;
            match owner {
                Some(owner_id) => Ok(AuthenticatedOwner(owner_id)),
                None => {
                    warn!("Rejected {}: unknown or expired token", path);
                    Err(ServiceError::Unauthorized)
                }
            }
        })
    }
}

/// Token from `Authorization: Bearer <token>`; the scheme is matched case-insensitively.
fn bearer_token(req: &HttpRequest) -> Option<String> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return None;
    }
    Some(token.to_string())
}
