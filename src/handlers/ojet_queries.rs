// src/handlers/ojet_queries.rs
// DOCUMENTATION: OJET runtime query handler
// PURPOSE: Run one of the predefined capture/apply/memory views by slug

use super::{optional_body, resolve_pool};
use crate::config::Config;
use crate::db::PoolRegistry;
use crate::errors::OjetError;
use crate::models::ConnectionRequest;
use crate::services::OjetQuery;
use actix_web::{web, HttpResponse, Responder};
use serde_json::json;

/// POST /api/ojet-queries/{id}
pub async fn run_ojet_query(
    registry: web::Data<PoolRegistry>,
    config: web::Data<Config>,
    path: web::Path<String>,
    body: web::Bytes,
) -> Result<impl Responder, OjetError> {
    let query: OjetQuery = path.into_inner().parse()?;
    let request: ConnectionRequest = optional_body(&body)?;

    let pool = resolve_pool(&registry, &request.connection).await?;
    let result = query.run(pool.as_ref(), &config.query_options()).await?;

    log::info!("OJET query {} returned {} rows", query, result.rows.len());

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "results": result.rows,
        "columns": result.columns
    })))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/ojet-queries/{id}", web::post().to(run_ojet_query));
}
