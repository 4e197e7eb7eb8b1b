use std::sync::Arc;

use tracing::error;
use tracing_subscriber::{fmt, EnvFilter};

use crate::{config::AppConfig, error::ApiError, utils::startup_utils};

mod api;
mod config;
mod error;
mod models;
mod services;
mod utils;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        error!("Fatal: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), ApiError> {
    let config = Arc::new(AppConfig::from_env()?);
    let db = startup_utils::get_db(&config).await?;

    let scheduler_controller = startup_utils::get_scheduler_controller(Arc::clone(&db), &config);
    // keep the scheduler alive for the lifetime of the server
    let _scheduler = startup_utils::schedule_tasks(Arc::clone(&scheduler_controller), &config).await?;

    let state = startup_utils::AppState::new(config, db, scheduler_controller);
    startup_utils::create_server(state).await
}
