//! Meridian API Server
//!
//! Main entry point for the Meridian banking service.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use meridian_api::{AppState, create_router};
use meridian_core::processing::{BankService, SystemClock};
use meridian_core::settlement::{MockAchGateway, MockSwiftGateway};
use meridian_shared::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "meridian=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load()?;

    // Wire the service with the mock settlement networks
    let service = Arc::new(BankService::new(
        config.bank.clone(),
        Arc::new(SystemClock),
        Arc::new(MockAchGateway::new()),
        Arc::new(MockSwiftGateway::new()),
    ));

    // Background sweep: confirm, submit, and poll eligible transactions
    let sweep_service = Arc::clone(&service);
    let sweep_interval = Duration::from_secs(config.bank.sweep_interval_secs);
    let sweep_limit = config.bank.sweep_batch_limit;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_interval);
        loop {
            ticker.tick().await;
            let counts = sweep_service.process_eligible(sweep_limit, false).await;
            if counts.examined > 0 {
                info!(
                    examined = counts.examined,
                    confirmed = counts.confirmed,
                    submitted = counts.submitted,
                    completed = counts.completed,
                    failed = counts.failed,
                    "sweep iteration finished"
                );
            }
        }
    });

    // Create router
    let app = create_router(AppState { service });

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
