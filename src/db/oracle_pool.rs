// src/db/oracle_pool.rs
// DOCUMENTATION: Oracle implementation of the pool/connection seam
// PURPOSE: Drive the blocking `oracle` crate from async handlers

use super::backend::{
    BindValue, DbConnection, DbPool, PoolBounds, PoolFactory, PoolHandle, RawRows, Statement,
    StatementKind,
};
use crate::errors::OjetError;
use crate::models::DbDescriptor;
use async_trait::async_trait;
use oracle::pool::{CloseMode, Pool, PoolBuilder};
use oracle::sql_type::{OracleType, ToSql};
use oracle::{Connection, SqlValue};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Interval between polite close attempts while busy connections drain
const CLOSE_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Run a blocking driver call on tokio's blocking pool
async fn blocking<T, F>(f: F) -> Result<T, OjetError>
where
    F: FnOnce() -> Result<T, OjetError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| OjetError::InternalError(format!("driver task failed: {}", e)))?
}

/// Opens Oracle session pools
pub struct OraclePoolFactory;

#[async_trait]
impl PoolFactory for OraclePoolFactory {
    async fn create_pool(
        &self,
        descriptor: &DbDescriptor,
        bounds: PoolBounds,
    ) -> Result<PoolHandle, OjetError> {
        let username = descriptor.username.clone();
        let password = descriptor.password.clone();
        let connect_string = descriptor.connect_string();

        let pool = blocking(move || {
            PoolBuilder::new(username, password, connect_string)
                .min_connections(bounds.min)
                .max_connections(bounds.max)
                .connection_increment(bounds.increment)
                .build()
                .map_err(|e| OjetError::DatabaseError(e.to_string()))
        })
        .await?;

        log::info!(
            "Oracle pool created for {} (min {}, max {}, increment {})",
            descriptor.connect_string(),
            bounds.min,
            bounds.max,
            bounds.increment
        );
        Ok(Arc::new(OraclePool {
            inner: Arc::new(pool),
        }))
    }
}

pub struct OraclePool {
    inner: Arc<Pool>,
}

#[async_trait]
impl DbPool for OraclePool {
    async fn acquire(&self) -> Result<Box<dyn DbConnection>, OjetError> {
        let pool = Arc::clone(&self.inner);
        let connection = blocking(move || {
            pool.get()
                .map_err(|e| OjetError::PoolUnavailable(e.to_string()))
        })
        .await?;

        Ok(Box::new(OracleConnection {
            inner: Arc::new(connection),
        }))
    }

    /// DOCUMENTATION: Retries a normal close until busy connections come back
    /// or `grace` runs out, then forces the close.
    async fn close(&self, grace: Duration) -> Result<(), OjetError> {
        let deadline = Instant::now() + grace;

        loop {
            let pool = Arc::clone(&self.inner);
            let attempt = blocking(move || {
                pool.close(&CloseMode::Default)
                    .map_err(|e| OjetError::DatabaseError(e.to_string()))
            })
            .await;

            match attempt {
                Ok(()) => return Ok(()),
                Err(e) if Instant::now() >= deadline => {
                    log::warn!("Pool did not drain within {:?} ({}), forcing close", grace, e);
                    break;
                }
                Err(_) => tokio::time::sleep(CLOSE_POLL_INTERVAL).await,
            }
        }

        let pool = Arc::clone(&self.inner);
        blocking(move || {
            pool.close(&CloseMode::Force)
                .map_err(|e| OjetError::DatabaseError(e.to_string()))
        })
        .await
    }
}

pub struct OracleConnection {
    inner: Arc<Connection>,
}

#[async_trait]
impl DbConnection for OracleConnection {
    async fn run(&mut self, statement: &Statement, max_rows: usize) -> Result<RawRows, OjetError> {
        let connection = Arc::clone(&self.inner);
        let statement = statement.clone();
        blocking(move || run_blocking(&connection, &statement, max_rows)).await
    }

    async fn release(self: Box<Self>) -> Result<(), OjetError> {
        let connection = self.inner;
        blocking(move || {
            // Uncommitted ad-hoc work must not leak into the next borrower
            if let Err(e) = connection.rollback() {
                log::warn!("Rollback before release failed: {}", e);
            }
            connection
                .close()
                .map_err(|e| OjetError::InternalError(e.to_string()))
        })
        .await
    }
}

/// Owned bind value the driver can borrow as `&dyn ToSql`
enum OracleParam {
    Null(Option<String>),
    Int(i64),
    Float(f64),
    Text(String),
}

impl OracleParam {
    fn from_bind(value: &BindValue) -> Self {
        match value {
            BindValue::Null => OracleParam::Null(None),
            BindValue::Bool(flag) => OracleParam::Int(i64::from(*flag)),
            BindValue::Int(number) => OracleParam::Int(*number),
            BindValue::Float(number) => OracleParam::Float(*number),
            BindValue::Text(text) => OracleParam::Text(text.clone()),
        }
    }

    fn as_sql(&self) -> &dyn ToSql {
        match self {
            OracleParam::Null(value) => value,
            OracleParam::Int(value) => value,
            OracleParam::Float(value) => value,
            OracleParam::Text(value) => value,
        }
    }
}

fn run_blocking(
    connection: &Connection,
    statement: &Statement,
    max_rows: usize,
) -> Result<RawRows, OjetError> {
    let owned: Vec<(&str, OracleParam)> = statement
        .binds
        .iter()
        .map(|(name, value)| (name.as_str(), OracleParam::from_bind(value)))
        .collect();
    let params: Vec<(&str, &dyn ToSql)> = owned
        .iter()
        .map(|(name, value)| (*name, value.as_sql()))
        .collect();

    let failed = |e: oracle::Error| OjetError::StatementFailed(e.to_string());

    match statement.kind {
        StatementKind::Call => {
            connection
                .execute_named(&statement.sql, &params)
                .map_err(failed)?;
            if statement.commit {
                connection.commit().map_err(failed)?;
            }
            Ok(RawRows::default())
        }
        StatementKind::Query => {
            let result_set = connection
                .query_named(&statement.sql, &params)
                .map_err(failed)?;

            let columns = result_set
                .column_info()
                .iter()
                .map(|info| info.name().to_string())
                .collect();

            let mut rows = Vec::new();
            for row in result_set.take(max_rows) {
                let row = row.map_err(failed)?;
                rows.push(row.sql_values().iter().map(to_json).collect());
            }

            Ok(RawRows { columns, rows })
        }
    }
}

/// Numbers stay numbers when they fit, everything else goes out as text
fn to_json(value: &SqlValue) -> Value {
    if value.is_null().unwrap_or(true) {
        return Value::Null;
    }

    let numeric = matches!(
        value.oracle_type(),
        Ok(OracleType::Number(_, _))
            | Ok(OracleType::BinaryFloat)
            | Ok(OracleType::BinaryDouble)
            | Ok(OracleType::Int64)
            | Ok(OracleType::UInt64)
    );

    if numeric {
        if let Ok(number) = value.get::<i64>() {
            return Value::from(number);
        }
        if let Ok(number) = value.get::<f64>() {
            if let Some(number) = serde_json::Number::from_f64(number) {
                return Value::Number(number);
            }
        }
    }

    value
        .get::<String>()
        .map(Value::String)
        .unwrap_or(Value::Null)
}
