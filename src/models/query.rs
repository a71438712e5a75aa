// src/models/query.rs
// DOCUMENTATION: Request/response bodies for checks, actions and ad-hoc queries
// PURPOSE: Every body may inline descriptor fields; without any the default pool is used

use crate::db::{BindParams, Record};
use crate::models::InlineDescriptor;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

/// Body carrying only an optional endpoint descriptor
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectionRequest {
    #[serde(flatten)]
    pub connection: InlineDescriptor,
}

/// POST /api/execute-query
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ExecuteQueryRequest {
    #[validate(length(min = 1, message = "query is required"))]
    pub query: String,

    #[serde(default)]
    pub params: BindParams,

    #[serde(flatten)]
    pub connection: InlineDescriptor,
}

/// Owner plus comma separated table names
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TableCheckRequest {
    #[validate(length(min = 1, message = "tableOwner is required"))]
    pub table_owner: String,

    #[validate(length(min = 1, message = "tableNames is required"))]
    pub table_names: String,

    #[serde(flatten)]
    pub connection: InlineDescriptor,
}

impl TableCheckRequest {
    /// Trimmed, non-empty table names
    pub fn table_list(&self) -> Vec<String> {
        self.table_names
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableRef {
    pub schema: String,
    pub table: String,
}

impl TableRef {
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.table)
    }
}

/// POST /api/action/prepare-tables
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PrepareTablesRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Tables array is required"))]
    pub tables: Vec<TableRef>,

    #[serde(flatten)]
    pub connection: InlineDescriptor,
}

/// Standard `{success, data, columns}` reply for row-returning checks
#[derive(Debug, Clone, Serialize)]
pub struct RowsResponse {
    pub success: bool,
    pub data: Vec<Record>,
    pub columns: Vec<String>,
}

/// SCN check summary; values are passed through as the database returned them
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScnValidation {
    pub max_instantiation_scn: Value,
    pub min_required_capture_scn: Value,
}

/// Per-table outcome of PREPARE_TABLE_INSTANTIATION
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TablePreparation {
    pub table: String,
    pub success: bool,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_inline_descriptor_is_optional() {
        let without: TableCheckRequest = serde_json::from_value(json!({
            "tableOwner": "SOE", "tableNames": "ORDERS"
        }))
        .unwrap();
        assert!(without.connection.resolve().unwrap().is_none());

        let with: TableCheckRequest = serde_json::from_value(json!({
            "tableOwner": "SOE", "tableNames": "ORDERS",
            "host": "h1", "port": "1521", "sid": "ORCL", "username": "u", "password": "p"
        }))
        .unwrap();
        assert_eq!(with.connection.resolve().unwrap().unwrap().host, "h1");
    }

    #[test]
    fn test_table_list_trims_and_skips_blanks() {
        let request: TableCheckRequest = serde_json::from_value(json!({
            "tableOwner": "SOE", "tableNames": " ORDERS, CUSTOMERS ,,ORDER_ITEMS "
        }))
        .unwrap();

        assert_eq!(request.table_list(), vec!["ORDERS", "CUSTOMERS", "ORDER_ITEMS"]);
    }

    #[test]
    fn test_prepare_tables_requires_tables() {
        let request: PrepareTablesRequest = serde_json::from_value(json!({})).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_named_database_with_bad_port_is_not_dropped() {
        let request: TableCheckRequest = serde_json::from_value(json!({
            "tableOwner": "SOE", "tableNames": "ORDERS",
            "host": "other-db", "port": "15x21", "sid": "ORCL", "username": "u", "password": "p"
        }))
        .unwrap();

        assert!(!request.connection.is_empty());
        assert!(request.connection.resolve().is_err());
    }
}
