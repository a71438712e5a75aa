// src/handlers/checks.rs
// DOCUMENTATION: OJET readiness check and action handlers
// PURPOSE: Expose the fixed diagnostic checks and setup actions via REST endpoints

use super::{optional_body, resolve_pool};
use crate::config::Config;
use crate::db::{PoolRegistry, QueryResult};
use crate::errors::OjetError;
use crate::models::{ConnectionRequest, PrepareTablesRequest, RowsResponse, TableCheckRequest};
use crate::services::CheckService;
use actix_web::{web, HttpResponse, Responder};
use serde_json::json;
use validator::Validate;

/// Descriptor-only bodies may be empty
type OptionalBody = web::Bytes;

fn connection_request(body: &OptionalBody) -> Result<ConnectionRequest, OjetError> {
    optional_body(body)
}

fn rows_response(result: QueryResult) -> HttpResponse {
    HttpResponse::Ok().json(RowsResponse {
        success: true,
        data: result.rows,
        columns: result.columns,
    })
}

/// POST /api/check/dictionary-dumps
/// Archive logs carrying a LogMiner dictionary build
pub async fn dictionary_dumps(
    registry: web::Data<PoolRegistry>,
    config: web::Data<Config>,
    body: OptionalBody,
) -> Result<impl Responder, OjetError> {
    let request = connection_request(&body)?;
    let pool = resolve_pool(&registry, &request.connection).await?;
    let result = CheckService::dictionary_dumps(pool.as_ref(), &config.query_options()).await?;
    Ok(rows_response(result))
}

/// POST /api/check/table-instantiation
pub async fn table_instantiation(
    registry: web::Data<PoolRegistry>,
    config: web::Data<Config>,
    body: web::Json<TableCheckRequest>,
) -> Result<impl Responder, OjetError> {
    if let Err(e) = body.validate() {
        return Err(OjetError::ValidationError(e.to_string()));
    }

    let pool = resolve_pool(&registry, &body.connection).await?;
    let result = CheckService::table_instantiation(
        pool.as_ref(),
        &body.table_owner,
        &body.table_list(),
        &config.query_options(),
    )
    .await?;

    Ok(rows_response(result))
}

/// POST /api/check/scn-validation
pub async fn scn_validation(
    registry: web::Data<PoolRegistry>,
    config: web::Data<Config>,
    body: web::Json<TableCheckRequest>,
) -> Result<impl Responder, OjetError> {
    if let Err(e) = body.validate() {
        return Err(OjetError::ValidationError(e.to_string()));
    }

    let pool = resolve_pool(&registry, &body.connection).await?;
    let scn = CheckService::scn_validation(
        pool.as_ref(),
        &body.table_owner,
        &body.table_list(),
        &config.query_options(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": scn
    })))
}

/// POST /api/check/open-transactions
pub async fn open_transactions(
    registry: web::Data<PoolRegistry>,
    config: web::Data<Config>,
    body: OptionalBody,
) -> Result<impl Responder, OjetError> {
    let request = connection_request(&body)?;
    let pool = resolve_pool(&registry, &request.connection).await?;
    let result = CheckService::open_transactions(pool.as_ref(), &config.query_options()).await?;
    Ok(rows_response(result))
}

/// POST /api/check/db-values
pub async fn db_values(
    registry: web::Data<PoolRegistry>,
    config: web::Data<Config>,
    body: OptionalBody,
) -> Result<impl Responder, OjetError> {
    let request = connection_request(&body)?;
    let pool = resolve_pool(&registry, &request.connection).await?;
    let result = CheckService::db_values(pool.as_ref(), &config.query_options()).await?;
    Ok(rows_response(result))
}

/// POST /api/action/build-dictionary
pub async fn build_dictionary(
    registry: web::Data<PoolRegistry>,
    config: web::Data<Config>,
    body: OptionalBody,
) -> Result<impl Responder, OjetError> {
    let request = connection_request(&body)?;
    let pool = resolve_pool(&registry, &request.connection).await?;
    CheckService::build_dictionary(pool.as_ref(), &config.query_options()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Dictionary build executed successfully"
    })))
}

/// POST /api/action/prepare-tables
/// Prepare each listed table for instantiation
///
/// DOCUMENTATION: Answers 200 even when some tables fail; `success` is the
/// aggregate and `results` carries one entry per table.
pub async fn prepare_tables(
    registry: web::Data<PoolRegistry>,
    config: web::Data<Config>,
    body: web::Json<PrepareTablesRequest>,
) -> Result<impl Responder, OjetError> {
    if let Err(e) = body.validate() {
        return Err(OjetError::ValidationError(e.to_string()));
    }

    let pool = resolve_pool(&registry, &body.connection).await?;
    let results = CheckService::prepare_tables(pool.as_ref(), &body.tables, &config.query_options()).await?;

    let all_prepared = results.iter().all(|r| r.success);
    log::info!(
        "Prepared {}/{} tables for instantiation",
        results.iter().filter(|r| r.success).count(),
        results.len()
    );

    let message = if all_prepared {
        "All tables prepared successfully"
    } else {
        "Some tables failed to prepare"
    };

    Ok(HttpResponse::Ok().json(json!({
        "success": all_prepared,
        "message": message,
        "results": results
    })))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/check")
            .route("/dictionary-dumps", web::post().to(dictionary_dumps))
            .route("/table-instantiation", web::post().to(table_instantiation))
            .route("/scn-validation", web::post().to(scn_validation))
            .route("/open-transactions", web::post().to(open_transactions))
            .route("/db-values", web::post().to(db_values)),
    )
    .service(
        web::scope("/api/action")
            .route("/build-dictionary", web::post().to(build_dictionary))
            .route("/prepare-tables", web::post().to(prepare_tables)),
    );
}
