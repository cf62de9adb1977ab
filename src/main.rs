use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use anyhow::Context;

mod api;
mod auth;
mod config;
mod db;
mod docs;
mod error;
mod ledger;
mod model;
mod models;
mod report;
mod repository;
mod routes;
mod utils;

use config::Config;
use db::{init_db, run_migrations};
use ledger::TimeRecordLedger;
use report::{ReportRenderer, pdf::PdfReportRenderer};
use repository::{
    EmployeeDirectory, TimeRecordStore,
    mysql::{MySqlEmployeeDirectory, MySqlTimeRecordStore},
};

use crate::docs::ApiDoc;
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(config.log_level)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url)
        .await
        .context("failed to connect to database")?;
    run_migrations(&pool)
        .await
        .context("failed to run migrations")?;

    if let Some(bootstrap) = &config.bootstrap_superuser {
        auth::handlers::bootstrap_superuser(&pool, bootstrap).await?;
    }

    let store: Arc<dyn TimeRecordStore> = Arc::new(MySqlTimeRecordStore::new(pool.clone()));
    let ledger = Data::new(TimeRecordLedger::new(store));
    let directory: Data<dyn EmployeeDirectory> =
        Data::from(Arc::new(MySqlEmployeeDirectory::new(pool.clone())) as Arc<dyn EmployeeDirectory>);
    let renderer: Data<dyn ReportRenderer> =
        Data::from(Arc::new(PdfReportRenderer) as Arc<dyn ReportRenderer>);

    let pool = Data::new(pool);
    let server_addr = config.server_addr.clone();
    let config_data = Data::new(config.clone());

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(pool.clone())
            .app_data(config_data.clone())
            .app_data(ledger.clone())
            .app_data(directory.clone())
            .app_data(renderer.clone())
            // Configure auth + protected routes with rate limiting
            .configure(|cfg| routes::configure(cfg, config.clone()))
    })
    .bind(&server_addr)
    .with_context(|| format!("failed to bind {server_addr}"))?
    .run()
    .await?;

    Ok(())
}
