//! # GuitarNotepad API Server
//!
//! The main entry point for the Actix-web HTTP server.

use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

#[cfg(feature = "scheduler")]
mod background;
mod config;
mod handlers;
mod middleware;
mod observability;
mod state;
mod telemetry;

use config::AppConfig;
use observability::RequestIdMiddleware;
use state::AppState;
use telemetry::TelemetryConfig;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing before anything else logs
    telemetry::init_telemetry(&TelemetryConfig::from_env());

    let config = AppConfig::from_env();

    tracing::info!(
        host = %config.host,
        port = config.port,
        "Starting GuitarNotepad API server"
    );

    let state = AppState::new(&config).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to initialize application state");
        std::io::Error::other(e)
    })?;

    #[cfg(feature = "scheduler")]
    let mut scheduler = if config.scheduler.enabled {
        let scheduler =
            background::start_block_sweep(config.scheduler.clone(), state.moderation.clone())
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, "Failed to start scheduler");
                    std::io::Error::other(e)
                })?;
        Some(scheduler)
    } else {
        tracing::info!("Scheduler disabled");
        None
    };

    let data = web::Data::new(state);
    let result = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .wrap(RequestIdMiddleware)
            .app_data(data.clone())
            .configure(handlers::configure_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await;

    #[cfg(feature = "scheduler")]
    {
        if let Some(scheduler) = scheduler.as_mut() {
            if let Err(e) = scheduler.shutdown().await {
                tracing::warn!(error = %e, "Scheduler did not shut down cleanly");
            }
        }
    }

    tracing::info!("Server stopped");
    result
}
