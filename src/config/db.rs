// src/config/db.rs
// DOCUMENTATION: Connection pool registry initialization
// PURPOSE: Build the Oracle pool registry shared by all handlers

use crate::config::Config;
use crate::db::{OraclePoolFactory, PoolRegistry};
use std::sync::Arc;

/// Build the pool registry
/// DOCUMENTATION: Called once during application startup in main.rs.
/// No pool is opened here; pools are created lazily per endpoint.
pub fn init_pool_registry(config: &Config) -> PoolRegistry {
    let bounds = config.pool_bounds();
    log::info!(
        "Initializing Oracle pool registry (min={}, max={}, increment={}, close grace={}s)",
        bounds.min,
        bounds.max,
        bounds.increment,
        config.pool_close_grace_secs
    );

    if let Some(descriptor) = &config.default_descriptor {
        log::info!("Default Oracle endpoint: {}", descriptor.connect_string());
    }

    PoolRegistry::new(Arc::new(OraclePoolFactory))
        .with_bounds(bounds)
        .with_close_grace(config.close_grace())
        .with_default_descriptor(config.default_descriptor.clone())
}
