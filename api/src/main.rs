use std::sync::Arc;

use actix_web::{web, HttpServer};
use og_api::{create_app, logging, AppState};
use og_core::{CleanupConfig, GateConfig, OtpGate, RecordCleanupService};
use og_shared::AppConfig;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env();

    if let Err(e) = logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "Invalid configuration");
        return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e));
    }

    tracing::info!(
        environment = %config.environment,
        store = %config.store,
        provider = %config.provider.kind,
        "Starting OTP gate API server"
    );

    let infra = og_infra::initialize(&config).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to initialize infrastructure");
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;

    let gate_config = GateConfig::from_app_config(&config);
    tracing::info!(
        cooldown_seconds = gate_config.cooldown.as_secs(),
        hourly_cap = gate_config.hourly_cap,
        phone_region = %gate_config.phone_region,
        "OTP gate configured"
    );

    if let Some(interval) = config.rate_limit.cleanup_interval() {
        let cleanup = Arc::new(RecordCleanupService::new(
            infra.store.clone(),
            CleanupConfig {
                interval_seconds: interval.as_secs(),
                cooldown: gate_config.cooldown,
                enabled: true,
            },
        ));
        cleanup.start_background_task();
    }

    let gate = Arc::new(OtpGate::new(infra.store, infra.provider, gate_config));
    let app_state = web::Data::new(AppState::new(gate, config.clone()));

    let bind_address = config.server.bind_address();
    tracing::info!("Server will bind to: {}", bind_address);

    let mut server = HttpServer::new(move || create_app(app_state.clone()))
        .keep_alive(std::time::Duration::from_secs(config.server.keep_alive));
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server.bind(&bind_address)?.run().await
}
