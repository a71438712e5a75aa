// src/config/env.rs
// DOCUMENTATION: Environment variable management
// PURPOSE: Load and validate configuration from .env files

use crate::db::{PoolBounds, QueryOptions, MAX_ROWS};
use crate::models::{DbDescriptor, DEFAULT_ORACLE_PORT};
use crate::services::StriimTimeouts;
use dotenv::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration loaded from environment variables
/// DOCUMENTATION: Centralizes all configuration in one struct
/// Load with Config::from_env() at application startup
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (default "0.0.0.0")
    pub server_address: String,

    /// Server listen port (default 3001)
    pub server_port: u16,

    /// HTTP worker count; 1 keeps a single event loop
    pub server_workers: usize,

    /// Environment: development, staging, production
    pub environment: String,

    /// Log level: debug, info, warn, error
    pub log_level: String,

    /// Oracle session pool sizing
    pub pool_min: u32,
    pub pool_max: u32,
    pub pool_increment: u32,

    /// Row cap per query
    pub max_rows: usize,

    /// Seconds busy connections get when a pool is closed
    pub pool_close_grace_secs: u64,

    /// Striim REST timeouts in seconds
    pub striim_reachability_timeout_secs: u64,
    pub striim_auth_timeout_secs: u64,
    pub striim_command_timeout_secs: u64,

    /// Endpoint used when a request carries no descriptor and nothing was connected
    pub default_descriptor: Option<DbDescriptor>,
}

impl Config {
    /// Load configuration from environment variables
    /// DOCUMENTATION: Reads from .env or process environment
    /// Called once at application startup
    pub fn from_env() -> Self {
        dotenv().ok();

        Config {
            server_address: env::var("SERVER_ADDRESS").unwrap_or_else(|_| "0.0.0.0".to_string()),

            server_port: parse_or("SERVER_PORT", 3001),

            server_workers: parse_or("SERVER_WORKERS", 1),

            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            pool_min: parse_or("ORACLE_POOL_MIN", 1),
            pool_max: parse_or("ORACLE_POOL_MAX", 5),
            pool_increment: parse_or("ORACLE_POOL_INCREMENT", 1),

            max_rows: parse_or("ORACLE_MAX_ROWS", MAX_ROWS),

            pool_close_grace_secs: parse_or("ORACLE_POOL_CLOSE_GRACE_SECS", 10),

            striim_reachability_timeout_secs: parse_or("STRIIM_REACHABILITY_TIMEOUT_SECS", 5),
            striim_auth_timeout_secs: parse_or("STRIIM_AUTH_TIMEOUT_SECS", 10),
            striim_command_timeout_secs: parse_or("STRIIM_COMMAND_TIMEOUT_SECS", 15),

            default_descriptor: default_descriptor_from_env(),
        }
    }

    /// Validate critical configuration
    /// DOCUMENTATION: Ensures application can start safely
    pub fn validate(&self) -> Result<(), String> {
        if self.server_workers == 0 {
            return Err("SERVER_WORKERS must be at least 1".to_string());
        }

        if self.pool_max == 0 || self.pool_min > self.pool_max {
            return Err(format!(
                "Invalid pool bounds: ORACLE_POOL_MIN={} ORACLE_POOL_MAX={}",
                self.pool_min, self.pool_max
            ));
        }

        if self.max_rows == 0 {
            return Err("ORACLE_MAX_ROWS must be at least 1".to_string());
        }

        if self.default_descriptor.is_none() {
            log::info!("No default Oracle descriptor configured - requests must connect first");
        }

        Ok(())
    }

    pub fn pool_bounds(&self) -> PoolBounds {
        PoolBounds {
            min: self.pool_min,
            max: self.pool_max,
            increment: self.pool_increment.max(1),
        }
    }

    pub fn query_options(&self) -> QueryOptions {
        QueryOptions {
            max_rows: self.max_rows,
        }
    }

    pub fn close_grace(&self) -> Duration {
        Duration::from_secs(self.pool_close_grace_secs)
    }

    pub fn striim_timeouts(&self) -> StriimTimeouts {
        StriimTimeouts {
            reachability: Duration::from_secs(self.striim_reachability_timeout_secs),
            auth: Duration::from_secs(self.striim_auth_timeout_secs),
            command: Duration::from_secs(self.striim_command_timeout_secs),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server_address: "0.0.0.0".to_string(),
            server_port: 3001,
            server_workers: 1,
            environment: "development".to_string(),
            log_level: "info".to_string(),
            pool_min: 1,
            pool_max: 5,
            pool_increment: 1,
            max_rows: MAX_ROWS,
            pool_close_grace_secs: 10,
            striim_reachability_timeout_secs: 5,
            striim_auth_timeout_secs: 10,
            striim_command_timeout_secs: 15,
            default_descriptor: None,
        }
    }
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

/// ORACLE_HOST, ORACLE_SID and ORACLE_USERNAME must all be set
fn default_descriptor_from_env() -> Option<DbDescriptor> {
    let host = env::var("ORACLE_HOST").ok().filter(|v| !v.is_empty())?;
    let sid = env::var("ORACLE_SID").ok().filter(|v| !v.is_empty())?;
    let username = env::var("ORACLE_USERNAME").ok().filter(|v| !v.is_empty())?;

    Some(DbDescriptor::new(
        host,
        parse_or("ORACLE_PORT", DEFAULT_ORACLE_PORT),
        sid,
        username,
        env::var("ORACLE_PASSWORD").unwrap_or_default(),
    ))
}
