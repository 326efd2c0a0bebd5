mod error;
mod models;
mod server;
mod services;

use anyhow::Result;
use dotenv::dotenv;
use std::env;

use server::create_router;
use services::WebhookClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger
    env_logger::init();

    // Load environment variables
    dotenv().ok();

    log::info!("🚀 Starting NutriSnap analysis relay...");

    // The webhook URL is resolved per request, so a missing value is only a
    // warning here rather than a startup failure.
    match env::var("WEBHOOK_URL") {
        Ok(url) => log::info!("✅ Analysis webhook: {}", url),
        Err(_) => log::warn!("⚠️ WEBHOOK_URL not set, analyze requests will fail until it is"),
    }

    let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let app = create_router(WebhookClient::new());

    log::info!("🌐 Relay server listening on {}", bind_addr);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("🛑 Shutting down...");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", err);
    }
}
