use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use std::sync::Arc;

mod api;
mod attendance;
mod auth;
mod config;
mod db;
mod docs;
mod error;
mod model;
mod models;
mod routes;
mod utils;

use attendance::clock::{Clock, SystemClock};
use attendance::photo::PhotoStore;
use config::Config;
use db::{init_db, run_migrations};
use routes::RateLimits;

use crate::docs::ApiDoc;
use crate::utils::email_registry;
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url, config.db_max_connections).await?;
    if config.run_migrations {
        run_migrations(&pool).await?;
        info!("Migrations applied");
    }

    let photos = Data::new(PhotoStore::open(&config.upload_dir, &config.public_base_url)?);
    info!(dir = %photos.dir().display(), "Photo store ready");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let clock = Data::from(clock);

    let limits = RateLimits::from_config(&config)?;

    let pool_for_warmup = pool.clone();
    actix_web::rt::spawn(async move {
        // Cache employees seen in the last 30 days
        if let Err(e) = email_registry::warmup(&pool_for_warmup, 30, 250).await {
            warn!(error = ?e, "Failed to warm up email registry");
        }
    });

    let server_addr = config.server_addr.clone();
    let config = Data::new(config);
    let pool = Data::new(pool);

    HttpServer::new(move || {
        let photo_limit = config.max_photo_bytes;
        let routes_config = config.clone();
        let routes_limits = limits.clone();

        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(api::attendance::multipart_config(photo_limit))
            .app_data(pool.clone())
            .app_data(config.clone())
            .app_data(photos.clone())
            .app_data(clock.clone())
            .configure(move |cfg| routes::configure(cfg, &routes_config, &routes_limits))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}
