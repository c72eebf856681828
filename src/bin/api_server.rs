// src/bin/api_server.rs

use jansetu_platform::infra::config::{CorsOrigins, OtpStoreKind};
use jansetu_platform::infra::logging;
use jansetu_platform::{
    create_router, ApiDoc, AppState, Config, DatabaseService, LogDelivery, MemoryOtpStore,
    OtpStore, PostgresOtpStore,
};
use axum::http::{HeaderValue, Method};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

const OTP_PURGE_INTERVAL: Duration = Duration::from_secs(60);

fn cors_layer(origins: &CorsOrigins) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);
    match origins {
        CorsOrigins::Any => layer.allow_origin(Any),
        CorsOrigins::List(list) => {
            let parsed: Vec<HeaderValue> = list
                .iter()
                .filter_map(|o| match o.parse::<HeaderValue>() {
                    Ok(v) => Some(v),
                    Err(_) => {
                        tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                        None
                    }
                })
                .collect();
            layer.allow_origin(parsed)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    logging::init(config.log_format);

    if config.uses_default_secrets() {
        tracing::warn!("AADHAAR_HASH_SALT or JWT_SECRET_KEY is using its development default");
    }

    // --- Service Initialization ---
    tracing::info!("initializing DatabaseService");
    let db_service = DatabaseService::new(&config).await?;

    let otp_store: Arc<dyn OtpStore> = match config.otp.store {
        OtpStoreKind::Memory => Arc::new(MemoryOtpStore::new()),
        OtpStoreKind::Postgres => Arc::new(PostgresOtpStore::new(db_service.pool().clone())),
    };
    tracing::info!(store = ?config.otp.store, ttl_secs = config.otp.ttl.as_secs(), "OTP service ready");

    let bind_addr = config.bind_addr;
    let cors = cors_layer(&config.cors_origins);
    let app_state = AppState::new(db_service, config, otp_store, Arc::new(LogDelivery));

    let otp_service = app_state.otp.clone();
    otp_service.clone().start_purge_task(OTP_PURGE_INTERVAL);

    // --- API Server Initialization ---
    let app = create_router(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors);
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("API server listening on http://{}", bind_addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for shutdown signal");
            }
            tracing::info!("shutdown signal received");
        })
        .await?;

    otp_service.shutdown();
    tracing::info!("graceful shutdown complete");
    Ok(())
}
