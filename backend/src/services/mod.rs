pub mod uploads;

use actix_cors::Cors;
use actix_web::http::{header, Method};
use actix_web::HttpResponse;
use common::responses::MessageResponse;

/// Cross-origin policy for browser clients served from `origins`.
///
/// Preflight requests are answered by the middleware itself; requests from any other
/// origin get no CORS headers and are refused by the browser.
pub fn cors(origins: &[String]) -> Cors {
    origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allowed_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::PATCH])
        .allowed_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .supports_credentials()
        .max_age(3600)
}

/// `GET /`: liveness probe.
pub async fn api_status() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body("API is running")
}

/// Fallback for every unknown route.
pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(MessageResponse::new("Not Found"))
}
