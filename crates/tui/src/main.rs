mod app;
mod input;

use anyhow::Result;
use std::{
    fs::{self, OpenOptions},
    sync::Mutex,
};

use tracing_subscriber::{prelude::*, EnvFilter};
use wanich_core::{
    config::{self, AppConfig},
    gateway,
    session::LendingSession,
};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    config::ensure_default_config()?;
    let config = AppConfig::load()?;
    tracing::info!(gateway = ?config.gateway.kind, admin = config.admin_enabled, "Configuration loaded");

    let gateway = gateway::from_config(&config.gateway)?;
    let session = LendingSession::from_config(&config);

    let mut app = app::WanichApp::new(session, gateway);
    app.run().await
}

// The terminal is in raw mode while the app runs, so logs only go to a file.
fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("wanich.log"))?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(Mutex::new(log_file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
