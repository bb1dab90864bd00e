mod auth;
mod config;
mod error;
mod reconciler;
mod services;
mod store;
mod workbook;

use crate::config::AppConfig;
use crate::reconciler::Reconciler;
use crate::services::uploads::UploadLimits;
use crate::store::Store;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use env_logger::Env;
use log::{info, warn};
use std::io;

fn startup_error(err: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err.to_string())
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    let dotenv = config::load_dotenv();
    env_logger::init_from_env(Env::default().default_filter_or("info"));
    match dotenv {
        Ok(Some(path)) => info!("Loaded environment from {}", path.display()),
        Ok(None) => {}
        Err(e) => warn!("Ignoring unreadable .env file: {}", e),
    }

    let config = AppConfig::from_env().map_err(startup_error)?;
    let url = config.url();

    let store = Store::open_path(&config.database_path).map_err(startup_error)?;
    info!("Using database {}", config.database_path.display());

    for (owner_id, token) in &config.api_tokens {
        store
            .register_token(owner_id, token, None)
            .map_err(startup_error)?;
    }
    if !config.api_tokens.is_empty() {
        info!("Provisioned {} API token(s)", config.api_tokens.len());
    }

    let reconciler = Reconciler::new(store.clone());
    let limits = UploadLimits {
        max_file_bytes: config.max_upload_bytes,
    };
    let cors_origins = config.cors_origins.clone();
    info!("Allowing cross-origin requests from {:?}", cors_origins);

    info!("Server running at {}", url);

    HttpServer::new(move || {
        App::new()
            .wrap(services::cors(&cors_origins))
            .wrap(Logger::default())
            .app_data(web::Data::new(store.clone()))
            .app_data(web::Data::new(reconciler.clone()))
            .app_data(web::Data::new(limits))
            .route("/", web::get().to(services::api_status))
            .service(services::uploads::configure_routes())
            .default_service(web::route().to(services::not_found))
    })
        .bind((config.host.as_str(), config.port))?
        .run()
        .await
}
