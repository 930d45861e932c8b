use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use cafe_recs_engine::config::Config;
use cafe_recs_engine::data_access::HttpDataAccessLayer;
use cafe_recs_engine::handlers::{build_app_state, evaluate, recommend};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[actix_web::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().map_err(|e| {
        tracing::error!("failed to load configuration: {}", e);
        anyhow::anyhow!("configuration error: {}", e)
    })?;

    tracing::info!(
        "starting cafe-recs-engine v{}",
        env!("CARGO_PKG_VERSION")
    );
    tracing::info!(base_url = %config.collaborator.base_url, "collaborator API configured");

    let dal: Arc<dyn cafe_recs_engine::data_access::DataAccessLayer> = Arc::new(HttpDataAccessLayer::new(
        config.collaborator.base_url.clone(),
        &config.cache,
        config.collaborator.fetch_timeout,
    ));

    let port = config.service.http_port;
    let app_state = build_app_state(&config, dal);

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .route("/health", web::get().to(|| async { "OK" }))
            .service(recommend)
            .service(evaluate)
    })
    .bind(("0.0.0.0", port))
    .context("failed to bind HTTP server")?
    .run()
    .await
    .context("HTTP server exited with an error")
}
