// src/db/gateway.rs
// DOCUMENTATION: Query execution gateway
// PURPOSE: Borrow one connection, run statements, always give the connection back

use super::backend::{DbConnection, DbPool, RawRows, Statement};
use crate::errors::OjetError;
use serde::Serialize;
use serde_json::{Map, Value};

/// Server-side row cap; larger result sets are truncated silently
pub const MAX_ROWS: usize = 1000;

pub type Record = Map<String, Value>;

#[derive(Debug, Clone, Copy)]
pub struct QueryOptions {
    pub max_rows: usize,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self { max_rows: MAX_ROWS }
    }
}

/// Rows keyed by column name, plus the column order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryResult {
    pub rows: Vec<Record>,
    pub columns: Vec<String>,
}

impl QueryResult {
    /// First row's value for `column`, if any
    pub fn first_value(&self, column: &str) -> Option<&Value> {
        self.rows.first().and_then(|row| row.get(column))
    }
}

/// Query gateway
/// DOCUMENTATION: Single attempt, no retries. Every call borrows exactly one
/// connection and releases it on every exit path; a release failure is only
/// logged and never replaces the statement's own outcome.
pub struct QueryGateway;

impl QueryGateway {
    /// Run one statement on a freshly borrowed connection
    pub async fn execute(
        pool: &dyn DbPool,
        statement: &Statement,
        options: &QueryOptions,
    ) -> Result<QueryResult, OjetError> {
        let mut connection = Self::acquire(pool).await?;
        let outcome = Self::run_on(connection.as_mut(), statement, options).await;
        Self::release(connection).await;
        outcome
    }

    /// Run several statements in order on one borrowed connection
    /// DOCUMENTATION: Returns one result per statement. A failing statement does
    /// not stop the ones after it; only a failed borrow fails the whole call.
    pub async fn execute_all(
        pool: &dyn DbPool,
        statements: &[Statement],
        options: &QueryOptions,
    ) -> Result<Vec<Result<QueryResult, OjetError>>, OjetError> {
        let mut connection = Self::acquire(pool).await?;

        let mut outcomes = Vec::with_capacity(statements.len());
        for statement in statements {
            outcomes.push(Self::run_on(connection.as_mut(), statement, options).await);
        }

        Self::release(connection).await;
        Ok(outcomes)
    }

    async fn acquire(pool: &dyn DbPool) -> Result<Box<dyn DbConnection>, OjetError> {
        pool.acquire().await.map_err(|e| {
            log::error!("Failed to acquire connection: {}", e);
            match e {
                OjetError::PoolUnavailable(_) => e,
                other => OjetError::PoolUnavailable(other.to_string()),
            }
        })
    }

    async fn run_on(
        connection: &mut dyn DbConnection,
        statement: &Statement,
        options: &QueryOptions,
    ) -> Result<QueryResult, OjetError> {
        let raw = connection
            .run(statement, options.max_rows)
            .await
            .map_err(|e| {
                log::error!("Statement failed: {}", e);
                match e {
                    OjetError::StatementFailed(_) => e,
                    other => OjetError::StatementFailed(other.to_string()),
                }
            })?;

        into_records(raw, options.max_rows)
    }

    async fn release(connection: Box<dyn DbConnection>) {
        if let Err(e) = connection.release().await {
            log::error!("Error closing connection: {}", e);
        }
    }
}

/// Key each row by its column names
fn into_records(raw: RawRows, max_rows: usize) -> Result<QueryResult, OjetError> {
    let RawRows { columns, rows } = raw;

    let mut records = Vec::with_capacity(rows.len().min(max_rows));
    for (index, row) in rows.into_iter().take(max_rows).enumerate() {
        if row.len() != columns.len() {
            return Err(OjetError::InternalError(format!(
                "row {} has {} values for {} columns",
                index,
                row.len(),
                columns.len()
            )));
        }
        records.push(columns.iter().cloned().zip(row).collect::<Record>());
    }

    Ok(QueryResult {
        rows: records,
        columns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::{handle, rows, MockPool};
    use serde_json::json;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use tokio_test::{assert_err, assert_ok};

    fn balanced(pool: &MockPool) {
        assert_eq!(pool.acquired(), pool.released());
    }

    #[tokio::test]
    async fn test_execute_returns_rows_and_columns() {
        let mock = MockPool::new(rows(
            &["NAME", "VALUE"],
            vec![
                vec![json!("db_name"), json!("ORCL")],
                vec![json!("streams_pool_size"), json!("268435456")],
            ],
        ));
        let pool = handle(&mock);

        let result = assert_ok!(
            QueryGateway::execute(
                pool.as_ref(),
                &Statement::query("SELECT name, value FROM v$parameter"),
                &QueryOptions::default()
            )
            .await
        );

        assert_eq!(result.columns, vec!["NAME", "VALUE"]);
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.rows[0]["VALUE"], json!("ORCL"));
        assert_eq!(mock.acquired(), 1);
        balanced(&mock);
    }

    #[tokio::test]
    async fn test_statement_failure_still_releases() {
        let mock = MockPool::new(Arc::new(|_: &Statement| {
            Err::<RawRows, _>(OjetError::StatementFailed(
                "ORA-00942: table or view does not exist".into(),
            ))
        }));
        let pool = handle(&mock);

        let err = assert_err!(
            QueryGateway::execute(pool.as_ref(), &Statement::query("SELECT * FROM nope"), &QueryOptions::default()).await
        );

        assert_eq!(err.to_string(), "ORA-00942: table or view does not exist");
        assert_eq!(mock.released(), 1);
        balanced(&mock);
    }

    #[tokio::test]
    async fn test_post_processing_failure_still_releases() {
        let mock = MockPool::new(rows(&["A", "B"], vec![vec![json!(1)]]));
        let pool = handle(&mock);

        let err = assert_err!(
            QueryGateway::execute(pool.as_ref(), &Statement::query("SELECT a, b FROM t"), &QueryOptions::default()).await
        );

        assert!(matches!(err, OjetError::InternalError(_)));
        assert_eq!(mock.released(), 1);
        balanced(&mock);
    }

    #[tokio::test]
    async fn test_release_failure_does_not_mask_result() {
        let mock = MockPool::new(rows(&["X"], vec![vec![json!(1)]]));
        mock.fail_release.store(true, Ordering::SeqCst);
        let pool = handle(&mock);

        let result = assert_ok!(
            QueryGateway::execute(pool.as_ref(), &Statement::query("SELECT 1 x FROM dual"), &QueryOptions::default()).await
        );

        assert_eq!(result.rows.len(), 1);
        balanced(&mock);
    }

    #[tokio::test]
    async fn test_acquire_failure_is_reported_distinctly() {
        let mock = MockPool::new(rows(&[], vec![]));
        mock.fail_acquire.store(true, Ordering::SeqCst);
        let pool = handle(&mock);

        let err = assert_err!(
            QueryGateway::execute(pool.as_ref(), &Statement::query("SELECT 1 FROM dual"), &QueryOptions::default()).await
        );

        assert!(matches!(err, OjetError::PoolUnavailable(_)));
        assert_eq!(mock.acquired(), 0);
        assert_eq!(mock.released(), 0);
    }

    #[tokio::test]
    async fn test_row_cap_truncates_silently() {
        let many = (0..1500).map(|i| vec![json!(i)]).collect();
        let mock = MockPool::new(rows(&["N"], many));
        let pool = handle(&mock);

        let result = assert_ok!(
            QueryGateway::execute(pool.as_ref(), &Statement::query("SELECT n FROM big"), &QueryOptions::default()).await
        );

        assert_eq!(result.rows.len(), MAX_ROWS);
        assert_eq!(mock.max_rows_seen.lock().unwrap()[0], MAX_ROWS);
    }

    #[tokio::test]
    async fn test_execute_all_reports_each_statement() {
        let mock = MockPool::new(Arc::new(|statement: &Statement| {
            if statement.sql.contains("BAD") {
                Err(OjetError::StatementFailed("ORA-20001: bad table".into()))
            } else {
                Ok(RawRows::default())
            }
        }));
        let pool = handle(&mock);

        let statements = vec![
            Statement::call("BEGIN ok1; END;"),
            Statement::call("BEGIN BAD; END;"),
            Statement::call("BEGIN ok2; END;"),
        ];

        let outcomes = assert_ok!(
            QueryGateway::execute_all(pool.as_ref(), &statements, &QueryOptions::default()).await
        );

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].is_ok());
        assert!(outcomes[1].is_err());
        assert!(outcomes[2].is_ok());
        assert_eq!(mock.executed.lock().unwrap().len(), 3);
        assert_eq!(mock.acquired(), 1);
        balanced(&mock);
    }
}
