// src/handlers/mod.rs
// DOCUMENTATION: Handlers module organization
// PURPOSE: Re-export handler components and register every route

pub mod checks;
pub mod connection;
pub mod health;
pub mod monitor;
pub mod ojet_queries;

pub use checks::config as checks_config;
pub use connection::config as connection_config;
pub use health::config as health_config;
pub use monitor::config as monitor_config;
pub use ojet_queries::config as ojet_queries_config;

use crate::db::{PoolHandle, PoolRegistry};
use crate::errors::OjetError;
use crate::models::InlineDescriptor;
use actix_web::web;
use serde::de::DeserializeOwned;

/// Register every endpoint, in the order main.rs serves them
pub fn configure(cfg: &mut web::ServiceConfig) {
    health_config(cfg);
    connection_config(cfg);
    checks_config(cfg);
    ojet_queries_config(cfg);
    monitor_config(cfg);
}

/// Resolve inline descriptor fields, then pick the pool the request runs on
pub(crate) async fn resolve_pool(
    registry: &PoolRegistry,
    inline: &InlineDescriptor,
) -> Result<PoolHandle, OjetError> {
    let descriptor = inline.resolve()?;
    registry.resolve(descriptor.as_ref()).await
}

/// Parse a body that may be left out entirely
/// DOCUMENTATION: Only an empty body falls back to the defaults. Malformed
/// JSON is reported, never treated as "no descriptor".
pub(crate) fn optional_body<T>(body: &[u8]) -> Result<T, OjetError>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }

    serde_json::from_slice(body)
        .map_err(|e| OjetError::ValidationError(format!("Malformed request body: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::testing::{rows, MockFactory};
    use crate::models::{ConnectionRequest, DbDescriptor};
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn test_every_route_is_reachable_in_server_order() {
        let factory = MockFactory::with_responder(rows(&["VALUE"], vec![vec![json!(1)]]));
        let registry = PoolRegistry::new(factory.clone())
            .with_default_descriptor(Some(DbDescriptor::new("db1", 1521, "ORCL", "u", "p")));
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(registry))
                .app_data(web::Data::new(Config::default()))
                .configure(configure),
        )
        .await;

        for uri in [
            "/api/check/db-values",
            "/api/check/dictionary-dumps",
            "/api/check/open-transactions",
            "/api/action/build-dictionary",
            "/api/ojet-queries/streams-pool",
            "/api/execute-query",
        ] {
            let body = if uri == "/api/execute-query" {
                json!({ "query": "SELECT 1 AS VALUE FROM DUAL" })
            } else {
                json!({})
            };
            let req = test::TestRequest::post().uri(uri).set_json(body).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK, "POST {}", uri);
        }

        // Reaches the handler, which rejects the empty fields
        let req = test::TestRequest::post()
            .uri("/api/monitor-source")
            .set_json(json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["connected"], true);

        let req = test::TestRequest::post().uri("/api/cleanup").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["closed"], 1);
    }

    #[::core::prelude::v1::test]
    fn test_optional_body_only_defaults_when_empty() {
        let empty: ConnectionRequest = optional_body(b"  ").unwrap();
        assert!(empty.connection.is_empty());

        let malformed = optional_body::<ConnectionRequest>(br#"{"host": 12"#);
        assert!(matches!(malformed, Err(OjetError::ValidationError(_))));

        let wrong_type = optional_body::<ConnectionRequest>(br#"{"host": 12}"#);
        assert!(matches!(wrong_type, Err(OjetError::ValidationError(_))));
    }
}
