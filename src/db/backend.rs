// src/db/backend.rs
// DOCUMENTATION: Driver seam between the pool registry/gateway and Oracle
// PURPOSE: Keep pooling and execution logic independent of the concrete driver

use crate::errors::OjetError;
use crate::models::DbDescriptor;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Scalar value bound to a named placeholder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BindValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<&str> for BindValue {
    fn from(value: &str) -> Self {
        BindValue::Text(value.to_string())
    }
}

impl From<String> for BindValue {
    fn from(value: String) -> Self {
        BindValue::Text(value)
    }
}

impl From<i64> for BindValue {
    fn from(value: i64) -> Self {
        BindValue::Int(value)
    }
}

/// Placeholder name (without the leading colon) to value
pub type BindParams = BTreeMap<String, BindValue>;

/// Whether a statement produces rows or is executed for its side effects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Query,
    Call,
}

impl StatementKind {
    /// Guess the kind of ad-hoc SQL from its leading keyword
    pub fn infer(sql: &str) -> Self {
        let leading = sql
            .trim_start_matches(|c: char| c.is_whitespace() || c == '(')
            .split(|c: char| c.is_whitespace() || c == '(')
            .next()
            .unwrap_or("")
            .to_ascii_uppercase();

        match leading.as_str() {
            "SELECT" | "WITH" => StatementKind::Query,
            _ => StatementKind::Call,
        }
    }
}

/// One statement to run on a borrowed connection
#[derive(Debug, Clone)]
pub struct Statement {
    pub sql: String,
    pub binds: BindParams,
    pub kind: StatementKind,
    /// Commit after a call succeeds; otherwise the work is rolled back on release
    pub commit: bool,
}

impl Statement {
    pub fn query(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            binds: BindParams::new(),
            kind: StatementKind::Query,
            commit: false,
        }
    }

    pub fn call(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            binds: BindParams::new(),
            kind: StatementKind::Call,
            commit: false,
        }
    }

    /// Caller-supplied SQL; its kind is inferred and it is never committed
    pub fn adhoc(sql: impl Into<String>, binds: BindParams) -> Self {
        let sql = sql.into();
        Self {
            kind: StatementKind::infer(&sql),
            sql,
            binds,
            commit: false,
        }
    }

    pub fn committed(mut self) -> Self {
        self.commit = true;
        self
    }

    pub fn bind(mut self, name: impl Into<String>, value: impl Into<BindValue>) -> Self {
        self.binds.insert(name.into(), value.into());
        self
    }
}

/// Rows exactly as the driver produced them, before they are keyed by column
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRows {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// Pool sizing, fixed for the lifetime of a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolBounds {
    pub min: u32,
    pub max: u32,
    pub increment: u32,
}

impl Default for PoolBounds {
    fn default() -> Self {
        Self {
            min: 1,
            max: 5,
            increment: 1,
        }
    }
}

/// A connection borrowed from a pool for exactly one gateway call
#[async_trait]
pub trait DbConnection: Send {
    /// Run one statement, fetching at most `max_rows` rows
    async fn run(&mut self, statement: &Statement, max_rows: usize) -> Result<RawRows, OjetError>;

    /// Give the connection back to its pool
    async fn release(self: Box<Self>) -> Result<(), OjetError>;
}

/// A live connection pool
#[async_trait]
pub trait DbPool: Send + Sync {
    async fn acquire(&self) -> Result<Box<dyn DbConnection>, OjetError>;

    /// Close the pool, giving busy connections up to `grace` to come back
    async fn close(&self, grace: Duration) -> Result<(), OjetError>;
}

pub type PoolHandle = Arc<dyn DbPool>;

/// Opens new pools for the registry
#[async_trait]
pub trait PoolFactory: Send + Sync {
    async fn create_pool(
        &self,
        descriptor: &DbDescriptor,
        bounds: PoolBounds,
    ) -> Result<PoolHandle, OjetError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_infer_statement_kind() {
        assert_eq!(StatementKind::infer("  select 1 from dual"), StatementKind::Query);
        assert_eq!(StatementKind::infer("WITH t AS (SELECT 1 FROM dual) SELECT * FROM t"), StatementKind::Query);
        assert_eq!(StatementKind::infer("BEGIN NULL; END;"), StatementKind::Call);
        assert_eq!(StatementKind::infer("update t set a = 1"), StatementKind::Call);
        assert_eq!(StatementKind::infer(""), StatementKind::Call);
    }

    #[test]
    fn test_infer_skips_leading_parentheses() {
        assert_eq!(
            StatementKind::infer("(SELECT 1 FROM DUAL) UNION (SELECT 2 FROM DUAL)"),
            StatementKind::Query
        );
        assert_eq!(StatementKind::infer(" ( (with t as (select 1 from dual) select * from t))"), StatementKind::Query);
        assert_eq!(StatementKind::infer("(("), StatementKind::Call);
    }

    #[test]
    fn test_adhoc_statements_are_not_committed() {
        let dml = Statement::adhoc("UPDATE soe.orders SET status = 1", BindParams::new());
        assert_eq!(dml.kind, StatementKind::Call);
        assert!(!dml.commit);

        let select = Statement::adhoc("(SELECT 1 FROM DUAL)", BindParams::new());
        assert_eq!(select.kind, StatementKind::Query);

        assert!(Statement::call("BEGIN NULL; END;").committed().commit);
    }

    #[test]
    fn test_bind_values_from_json() {
        let binds: BindParams = serde_json::from_value(json!({
            "owner": "SOE", "limit": 10, "ratio": 0.5, "flag": true, "none": null
        }))
        .unwrap();

        assert_eq!(binds["owner"], BindValue::Text("SOE".into()));
        assert_eq!(binds["limit"], BindValue::Int(10));
        assert_eq!(binds["ratio"], BindValue::Float(0.5));
        assert_eq!(binds["flag"], BindValue::Bool(true));
        assert_eq!(binds["none"], BindValue::Null);
    }
}
