mod api;
mod batches;
mod bootstrap;
mod config;
mod contracts;
mod customers;
mod deliveries;
mod error;
mod husbandry;
mod ledger;
mod middleware;
mod server;
mod settlements;

use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Initialize logging and tracing
fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,tower_http=debug,henhouse=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    info!("🚀 Starting henhouse egg subscription backend");

    let config = Arc::new(config::Config::from_env().context("loading configuration")?);
    let bind_address = config.bind_address.clone();

    let state = bootstrap::initialize_app_state(config)
        .await
        .context("initializing application state")?;

    let app = server::create_app(state).await;

    server::run_server(app, &bind_address)
        .await
        .context("serving HTTP")?;

    info!("👋 Server stopped");
    Ok(())
}
