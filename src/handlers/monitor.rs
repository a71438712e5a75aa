// src/handlers/monitor.rs
// DOCUMENTATION: Striim monitor handler
// PURPOSE: Proxy status, memory and mon commands for one OJET source

use crate::config::Config;
use crate::errors::OjetError;
use crate::models::MonitorRequest;
use crate::services::{monitor_commands, MonitorSession, StriimClient};
use actix_web::{web, HttpResponse, Responder};
use serde_json::json;
use validator::Validate;

/// POST /api/monitor-source
/// Authenticate against Striim and run the monitor commands for a source
///
/// DOCUMENTATION: Connectivity and authentication failures fail the request.
/// Once authenticated, every command runs and reports its own outcome.
pub async fn monitor_source(
    config: web::Data<Config>,
    body: web::Json<MonitorRequest>,
) -> Result<impl Responder, OjetError> {
    if let Err(e) = body.validate() {
        return Err(OjetError::ValidationError(e.to_string()));
    }

    let client = StriimClient::new(&body.striim_url, config.striim_timeouts())?;
    log::info!(
        "Monitoring {}.{} via {}",
        body.namespace,
        body.source_name,
        client.base_url()
    );

    let mut session = MonitorSession::new(client);
    session.authenticate(&body.username, &body.password).await?;

    let results = session
        .run(&monitor_commands(&body.namespace, &body.source_name))
        .await?;

    let failed = results.iter().filter(|r| !r.success).count();
    let message = if failed == 0 {
        "Monitoring data retrieved".to_string()
    } else {
        format!("{} of {} commands failed", failed, results.len())
    };

    Ok(HttpResponse::Ok().json(json!({
        "success": failed == 0,
        "message": message,
        "results": results
    })))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/monitor-source", web::post().to(monitor_source));
}
