use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;

use sheet_charts::{
    config, logging, routes,
    services::queue::{log_outcomes, JobQueue},
    AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = config::load_config()?;

    // Initialize logging
    logging::init_logging(config.log_json)?;

    // Start the analysis worker and its completion listener
    let (queue, outcomes) = JobQueue::start(config.worker_concurrency, config.analysis);
    tokio::spawn(log_outcomes(outcomes));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    // Build our application state
    let state = Arc::new(AppState::new(config, queue));
    let app = routes::app(state);

    // Run it
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
