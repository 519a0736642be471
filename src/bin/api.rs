use financial_report_orchestrator::{
    api::start_server,
    config::{ServiceConfig, CREDENTIAL_VAR},
    orchestrator::ReportOrchestrator,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load environment variables
    let config = ServiceConfig::from_env()?;

    if config.provider.api_key.is_none() {
        warn!("{} not set; report requests will fail until it is configured", CREDENTIAL_VAR);
    }

    info!("Financial Report Orchestrator - API Server");
    info!("Port: {}", config.port);
    info!("Model: {} via {}", config.provider.model, config.provider.api_url);

    let orchestrator = Arc::new(ReportOrchestrator::from_config(&config)?);

    info!("Orchestrator initialized");

    start_server(orchestrator, config.port).await?;

    Ok(())
}
