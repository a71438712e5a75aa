// src/handlers/connection.rs
// DOCUMENTATION: Connection, ad-hoc query and cleanup handlers
// PURPOSE: Connect the dashboard to a database and tear pools down on request

use super::resolve_pool;
use crate::config::Config;
use crate::db::{PoolRegistry, QueryGateway, Statement};
use crate::errors::OjetError;
use crate::models::{ConnectionRequest, ExecuteQueryRequest, RowsResponse};
use crate::services::CheckService;
use actix_web::{web, HttpResponse, Responder};
use serde_json::json;
use validator::Validate;

/// POST /api/test-connection
/// Install the default pool for this endpoint and ping it
///
/// DOCUMENTATION: Replaces any previous default pool. Later requests without
/// an inline descriptor run here.
pub async fn test_connection(
    registry: web::Data<PoolRegistry>,
    config: web::Data<Config>,
    body: web::Json<ConnectionRequest>,
) -> Result<impl Responder, OjetError> {
    let descriptor = body.connection.resolve()?.ok_or_else(|| {
        OjetError::ValidationError("host, sid, username and password are required".to_string())
    })?;

    log::info!("Testing connection to {}", descriptor.connect_string());

    let pool = registry.get_legacy_pool(&descriptor).await?;
    CheckService::test_connection(pool.as_ref(), &config.query_options()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Connection successful"
    })))
}

/// POST /api/execute-query
/// Run caller-supplied SQL with named binds
///
/// DOCUMENTATION: Nothing is committed; DML sent here is rolled back when the
/// connection goes back to the pool.
pub async fn execute_query(
    registry: web::Data<PoolRegistry>,
    config: web::Data<Config>,
    body: web::Json<ExecuteQueryRequest>,
) -> Result<impl Responder, OjetError> {
    if let Err(e) = body.validate() {
        return Err(OjetError::ValidationError(e.to_string()));
    }

    let request = body.into_inner();
    let pool = resolve_pool(&registry, &request.connection).await?;
    let statement = Statement::adhoc(request.query, request.params);

    let result = QueryGateway::execute(pool.as_ref(), &statement, &config.query_options()).await?;

    Ok(HttpResponse::Ok().json(RowsResponse {
        success: true,
        data: result.rows,
        columns: result.columns,
    }))
}

/// POST /api/cleanup
/// Close every pool the service holds
pub async fn cleanup(registry: web::Data<PoolRegistry>) -> impl Responder {
    let summary = registry.close_all().await;

    let message = if summary.failed == 0 {
        format!("Closed {} connection pools", summary.closed)
    } else {
        format!(
            "Closed {} connection pools, {} failed to close",
            summary.closed, summary.failed
        )
    };

    HttpResponse::Ok().json(json!({
        "success": summary.failed == 0,
        "message": message,
        "closed": summary.closed
    }))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/test-connection", web::post().to(test_connection))
        .route("/api/execute-query", web::post().to(execute_query))
        .route("/api/cleanup", web::post().to(cleanup));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::{rows, MockFactory};
    use crate::db::StatementKind;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use serde_json::Value;
    use std::sync::Arc;

    fn descriptor_json() -> Value {
        json!({
            "host": "db1.example.com",
            "port": "1521",
            "sid": "ORCLPDB1",
            "username": "c##striim",
            "password": "secret"
        })
    }

    fn registry(factory: &Arc<MockFactory>) -> web::Data<PoolRegistry> {
        web::Data::new(PoolRegistry::new(factory.clone()))
    }

    #[actix_web::test]
    async fn test_query_without_any_pool_is_not_initialized() {
        let factory = MockFactory::new();
        let app = test::init_service(
            App::new()
                .app_data(registry(&factory))
                .app_data(web::Data::new(Config::default()))
                .configure(config),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/execute-query")
            .set_json(json!({ "query": "SELECT 1 FROM DUAL" }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "NOT_INITIALIZED");
        assert_eq!(factory.created(), 0);
    }

    #[actix_web::test]
    async fn test_identical_descriptors_share_one_pool() {
        let factory = MockFactory::with_responder(rows(&["X"], vec![vec![json!(1)]]));
        let app = test::init_service(
            App::new()
                .app_data(registry(&factory))
                .app_data(web::Data::new(Config::default()))
                .configure(config),
        )
        .await;

        for _ in 0..2 {
            let mut body = descriptor_json();
            body["query"] = json!("SELECT 1 AS X FROM DUAL");
            let req = test::TestRequest::post()
                .uri("/api/execute-query")
                .set_json(body)
                .to_request();
            let body: Value = test::call_and_read_body_json(&app, req).await;
            assert_eq!(body["data"][0]["X"], 1);
            assert_eq!(body["columns"], json!(["X"]));
        }

        assert_eq!(factory.created(), 1);
        let pool = factory.pool(0);
        assert_eq!(pool.acquired(), 2);
        assert_eq!(pool.released(), 2);
    }

    #[actix_web::test]
    async fn test_connect_then_query_uses_default_pool() {
        let factory = MockFactory::new();
        let app = test::init_service(
            App::new()
                .app_data(registry(&factory))
                .app_data(web::Data::new(Config::default()))
                .configure(config),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/test-connection")
            .set_json(descriptor_json())
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["message"], "Connection successful");

        let req = test::TestRequest::post()
            .uri("/api/execute-query")
            .set_json(json!({
                "query": "BEGIN DBMS_LOCK.SLEEP(:secs); END;",
                "params": { "secs": 1 }
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        assert_eq!(factory.created(), 1);
        let pool = factory.pool(0);
        let executed = pool.executed.lock().unwrap();
        assert_eq!(executed.len(), 2);
        assert_eq!(executed[1].kind, StatementKind::Call);
        assert!(!executed[1].commit);
    }

    #[actix_web::test]
    async fn test_adhoc_dml_is_never_committed() {
        let factory = MockFactory::new();
        let app = test::init_service(
            App::new()
                .app_data(registry(&factory))
                .app_data(web::Data::new(Config::default()))
                .configure(config),
        )
        .await;

        let mut body = descriptor_json();
        body["query"] = json!("DELETE FROM soe.orders WHERE order_id = :id");
        body["params"] = json!({ "id": 42 });
        let req = test::TestRequest::post()
            .uri("/api/execute-query")
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let executed = factory.pool(0).executed.lock().unwrap().clone();
        assert_eq!(executed[0].kind, StatementKind::Call);
        assert!(!executed[0].commit);
    }

    #[actix_web::test]
    async fn test_named_database_with_bad_port_never_reaches_default_pool() {
        let factory = MockFactory::new();
        let registry = PoolRegistry::new(factory.clone()).with_default_descriptor(Some(
            crate::models::DbDescriptor::new("dflt-host", 1521, "ORCL", "u", "p"),
        ));
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(registry))
                .app_data(web::Data::new(Config::default()))
                .configure(config),
        )
        .await;

        let mut body = descriptor_json();
        body["host"] = json!("other-db");
        body["port"] = json!("15x21");
        body["query"] = json!("SELECT 1 FROM DUAL");
        let req = test::TestRequest::post()
            .uri("/api/execute-query")
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(factory.created(), 0);
    }

    #[actix_web::test]
    async fn test_invalid_descriptor_is_rejected() {
        let factory = MockFactory::new();
        let app = test::init_service(
            App::new()
                .app_data(registry(&factory))
                .app_data(web::Data::new(Config::default()))
                .configure(config),
        )
        .await;

        let mut body = descriptor_json();
        body["host"] = json!("");
        let req = test::TestRequest::post()
            .uri("/api/test-connection")
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(factory.created(), 0);
    }

    #[actix_web::test]
    async fn test_cleanup_then_fresh_pool() {
        let factory = MockFactory::new();
        let app = test::init_service(
            App::new()
                .app_data(registry(&factory))
                .app_data(web::Data::new(Config::default()))
                .configure(config),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/test-connection")
            .set_json(descriptor_json())
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::post().uri("/api/cleanup").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["closed"], 1);
        assert_eq!(factory.pool(0).closed(), 1);

        let mut query = descriptor_json();
        query["query"] = json!("SELECT 1 FROM DUAL");
        let req = test::TestRequest::post()
            .uri("/api/execute-query")
            .set_json(query)
            .to_request();
        test::call_service(&app, req).await;

        assert_eq!(factory.created(), 2);
    }
}
