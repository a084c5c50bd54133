// src/bin/api_server.rs

use hospital_ledger_gateway::infra::logging::{init_logging, LogFormat};
use hospital_ledger_gateway::transport;
use hospital_ledger_gateway::{
    AppConfig, EthLedger, HospitalService, IpfsStore, ServiceSettings, TracingCodeDelivery,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_logging("info", LogFormat::Pretty);
            error!(error = %e, "invalid configuration");
            return Err(e);
        }
    };
    init_logging("info,hospital_ledger_gateway=debug,tower_http=info", config.log_format);
    info!(?config, "configuration loaded");

    // --- Ledger ---
    let ledger = Arc::new(EthLedger::connect(&config).await?);
    let event_pump = ledger.start_event_pump();
    info!("ledger event pump started");

    // --- Content store ---
    let store = Arc::new(IpfsStore::new(&config.ipfs_api_url, config.ipfs_timeout)?);
    info!(ipfs = %config.ipfs_api_url, "content store configured");

    // --- Service ---
    let service = HospitalService::new(
        ledger.clone(),
        store,
        Arc::new(TracingCodeDelivery),
        ServiceSettings::from_config(&config),
    );
    let app_state = transport::http::AppState {
        service: Arc::new(service),
    };

    // --- API Server ---
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    let app = transport::http::create_router(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", transport::http::ApiDoc::openapi()))
        .layer(cors);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "API server listening");
    info!("Swagger UI available at http://localhost:{}/swagger-ui", config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to listen for shutdown signal");
            }
            info!("shutdown signal received");
        })
        .await?;

    ledger.shutdown();
    if let Err(e) = event_pump.await {
        error!(error = %e, "ledger event pump panicked");
    }
    info!("graceful shutdown complete");
    Ok(())
}
