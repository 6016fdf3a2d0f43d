use std::error::Error;

use axum::extract::DefaultBodyLimit;
use tokio::net::TcpListener;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use server::db::AppState;
use server::storage::PictureStore;
use server::{config, cors, db, health, openapi, telemetry};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();
    telemetry::init_logging();

    let config = config::app_config();
    if config.features.telemetry {
        telemetry::init_telemetry();
    }
    health::record_start_time();

    let pool = db::create_pool()?;
    db::run_migrations(&pool).await?;
    tracing::info!("database migrations applied");

    let pictures = PictureStore::from_config(config).await?;
    let state = AppState { pool, pictures };

    let mut router = openapi::app_router(state, config);
    if config.features.telemetry {
        router = router.layer(telemetry::OtelTraceLayer);
    }
    let router = router
        .layer(DefaultBodyLimit::max(config.server.max_upload_bytes))
        .layer(cors::cors_layer(&config.server.cors_origins))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "evidence server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    telemetry::shutdown();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received, draining connections");
}
