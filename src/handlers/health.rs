// src/handlers/health.rs
// DOCUMENTATION: Health check handler
// PURPOSE: Report service liveness and connection pool state

use crate::db::PoolRegistry;
use actix_web::{web, HttpResponse, Responder};
use serde_json::json;

pub async fn health_check(registry: web::Data<PoolRegistry>) -> impl Responder {
    let stats = registry.stats().await;

    HttpResponse::Ok().json(json!({
        "status": "ok",
        "service": "ojet-troubleshooter",
        "version": env!("CARGO_PKG_VERSION"),
        "connected": stats.keyed_pools > 0 || stats.legacy_pool,
        "pools": stats.keyed_pools,
        "legacyPool": stats.legacy_pool,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/health", web::get().to(health_check));
}
