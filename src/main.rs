// src/main.rs
// DOCUMENTATION: Application entry point
// PURPOSE: Initialize config, pool registry, and start HTTP server

mod config;
mod db;
mod errors;
mod handlers;
mod models;
mod services;

use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::{anyhow, Context};
use config::Config;
use dotenv::dotenv;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load environment variables
    dotenv().ok();

    // 2. Load configuration
    let config = Config::from_env();

    // 3. Initialize logging
    if std::env::var("RUST_LOG").is_err() {
        let log_level = if !config.log_level.is_empty() {
            config.log_level.as_str()
        } else {
            "info,actix_web=info"
        };
        std::env::set_var("RUST_LOG", log_level);
    }
    env_logger::init();

    config
        .validate()
        .map_err(|e| anyhow!("Configuration error: {}", e))?;

    log::info!("Starting OJET troubleshooter backend...");
    log::info!("Environment: {}", config.environment);
    log::info!(
        "Server Address: {}:{} ({} worker(s))",
        config.server_address,
        config.server_port,
        config.server_workers
    );

    // 4. Pool registry; pools open lazily on first use
    let registry = web::Data::new(config::init_pool_registry(&config));

    // 5. Start HTTP server
    let server_addr = format!("{}:{}", config.server_address, config.server_port);
    let config_data = web::Data::new(config.clone());
    let app_registry = registry.clone();

    HttpServer::new(move || {
        App::new()
            // Application state (pool registry and config)
            .app_data(app_registry.clone())
            .app_data(config_data.clone())
            // Middleware
            .wrap(Logger::default())
            .wrap(actix_web::middleware::Compress::default())
            // Routes
            .configure(handlers::configure)
    })
    .workers(config.server_workers)
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind {}", server_addr))?
    .run()
    .await
    .context("HTTP server error")?;

    // 6. Server stopped (SIGINT/SIGTERM); drain every pool before exit
    log::info!("Shutting down, closing connection pools...");
    let summary = registry.close_all().await;
    log::info!(
        "Shutdown complete: {} pools closed, {} failed",
        summary.closed,
        summary.failed
    );

    Ok(())
}
