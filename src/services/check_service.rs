// src/services/check_service.rs
// DOCUMENTATION: OJET readiness checks and setup actions
// PURPOSE: Fixed diagnostic SQL run through the query gateway

use crate::db::{DbPool, QueryGateway, QueryOptions, QueryResult, Statement};
use crate::errors::OjetError;
use crate::models::{ScnValidation, TablePreparation, TableRef};
use serde_json::Value;

/// Archive logs holding a LogMiner dictionary dump, last three days.
/// Crossed BEGIN/END flags across two consecutive logs are fine: the build
/// did not fit in one file.
const DICTIONARY_DUMPS_SQL: &str = "\
SELECT name, thread#, sequence# as SEQ, status, first_time, next_time,
       FIRST_CHANGE#, NEXT_CHANGE#, DICTIONARY_BEGIN, DICTIONARY_END, deleted
FROM v$archived_log
WHERE standby_dest = 'NO'
  AND COMPLETION_TIME > sysdate - 3
  AND (DICTIONARY_BEGIN = 'YES' OR DICTIONARY_END = 'YES')
ORDER BY SEQUENCE# DESC";

const TABLE_INSTANTIATION_SQL: &str = "\
SELECT TABLE_OWNER, TABLE_NAME, TIMESTAMP, scn as SCN_TO_START_TABLE
FROM dba_capture_prepared_tables
WHERE table_owner = :tableOwner
  AND table_name IN ({tables})";

const MAX_PREPARED_SCN_SQL: &str = "\
SELECT MAX(SCN) as MAX_SCN
FROM DBA_CAPTURE_PREPARED_TABLES
WHERE TABLE_OWNER = :tableOwner
  AND TABLE_NAME IN ({tables})";

const MIN_REQUIRED_SCN_SQL: &str = r#"SELECT "MIN_REQUIRED_CAPTURE_CHANGE#" FROM V$DATABASE"#;

const OPEN_TRANSACTIONS_SQL: &str = "\
SELECT MIN(START_TIME) as MIN_START_TIME,
       MIN(START_SCN) as MIN_START_SCN,
       COUNT(*) as OPEN_TXN_COUNT
FROM GV$TRANSACTION";

const DB_VALUES_SQL: &str = "\
SELECT name, value
FROM v$parameter
WHERE name IN (
  'db_name',
  'db_unique_name',
  'log_archive_dest_1',
  'enable_goldengate_replication',
  'log_archive_dest_2',
  'log_archive_dest_state_1',
  'log_archive_dest_state_2',
  'fal_client',
  'fal_server',
  'standby_file_management',
  'dg_broker_start',
  'dg_broker_config_file1',
  'dg_broker_config_file2',
  'log_archive_config',
  'service_names',
  'streams_pool_size'
)
AND value IS NOT NULL
UNION
SELECT 'global_name' as name, GLOBAL_NAME as value
FROM global_name
ORDER BY name";

const BUILD_DICTIONARY_SQL: &str =
    "BEGIN DBMS_LOGMNR_D.BUILD(OPTIONS => DBMS_LOGMNR_D.STORE_IN_REDO_LOGS); END;";

const PREPARE_TABLE_SQL: &str = "\
BEGIN
  DBMS_CAPTURE_ADM.PREPARE_TABLE_INSTANTIATION(
    table_name           => :tableName,
    supplemental_logging => 'NONE',
    container            => 'CURRENT'
  );
END;";

const PING_SQL: &str = "SELECT 1 FROM DUAL";

pub const TABLE_PREPARED: &str = "Table prepared successfully";

/// Diagnostic checks and actions
pub struct CheckService;

impl CheckService {
    /// Borrow a connection and run a trivial query
    pub async fn test_connection(pool: &dyn DbPool, options: &QueryOptions) -> Result<(), OjetError> {
        QueryGateway::execute(pool, &Statement::query(PING_SQL), options).await?;
        Ok(())
    }

    pub async fn dictionary_dumps(
        pool: &dyn DbPool,
        options: &QueryOptions,
    ) -> Result<QueryResult, OjetError> {
        QueryGateway::execute(pool, &Statement::query(DICTIONARY_DUMPS_SQL), options).await
    }

    /// Prepared-for-instantiation rows for the given tables
    pub async fn table_instantiation(
        pool: &dyn DbPool,
        table_owner: &str,
        tables: &[String],
        options: &QueryOptions,
    ) -> Result<QueryResult, OjetError> {
        let statement = table_statement(TABLE_INSTANTIATION_SQL, table_owner, tables)?;
        QueryGateway::execute(pool, &statement, options).await
    }

    /// Highest prepared SCN for the tables next to the database's minimum required capture SCN
    /// DOCUMENTATION: Both statements run on one connection and both must succeed.
    /// Values are passed through untouched; a missing row gives `null`.
    pub async fn scn_validation(
        pool: &dyn DbPool,
        table_owner: &str,
        tables: &[String],
        options: &QueryOptions,
    ) -> Result<ScnValidation, OjetError> {
        let statements = vec![
            table_statement(MAX_PREPARED_SCN_SQL, table_owner, tables)?,
            Statement::query(MIN_REQUIRED_SCN_SQL),
        ];

        let mut outcomes = QueryGateway::execute_all(pool, &statements, options)
            .await?
            .into_iter();

        let max_scn = next_outcome(&mut outcomes)?;
        let min_required = next_outcome(&mut outcomes)?;

        Ok(ScnValidation {
            max_instantiation_scn: max_scn.first_value("MAX_SCN").cloned().unwrap_or(Value::Null),
            min_required_capture_scn: min_required
                .first_value("MIN_REQUIRED_CAPTURE_CHANGE#")
                .cloned()
                .unwrap_or(Value::Null),
        })
    }

    pub async fn open_transactions(
        pool: &dyn DbPool,
        options: &QueryOptions,
    ) -> Result<QueryResult, OjetError> {
        QueryGateway::execute(pool, &Statement::query(OPEN_TRANSACTIONS_SQL), options).await
    }

    pub async fn db_values(pool: &dyn DbPool, options: &QueryOptions) -> Result<QueryResult, OjetError> {
        QueryGateway::execute(pool, &Statement::query(DB_VALUES_SQL), options).await
    }

    /// Write a LogMiner dictionary into the redo logs
    pub async fn build_dictionary(pool: &dyn DbPool, options: &QueryOptions) -> Result<(), OjetError> {
        log::info!("Running DBMS_LOGMNR_D.BUILD");
        QueryGateway::execute(pool, &Statement::call(BUILD_DICTIONARY_SQL).committed(), options).await?;
        Ok(())
    }

    /// Prepare each table for instantiation, one call per table on one connection
    /// DOCUMENTATION: A failing table is reported in its own entry and the rest
    /// still run.
    pub async fn prepare_tables(
        pool: &dyn DbPool,
        tables: &[TableRef],
        options: &QueryOptions,
    ) -> Result<Vec<TablePreparation>, OjetError> {
        let statements: Vec<Statement> = tables
            .iter()
            .map(|t| {
                Statement::call(PREPARE_TABLE_SQL)
                    .bind("tableName", t.qualified_name())
                    .committed()
            })
            .collect();

        let outcomes = QueryGateway::execute_all(pool, &statements, options).await?;

        Ok(tables
            .iter()
            .zip(outcomes)
            .map(|(table, outcome)| {
                let table = table.qualified_name();
                match outcome {
                    Ok(_) => {
                        log::info!("Prepared {} for instantiation", table);
                        TablePreparation {
                            table,
                            success: true,
                            message: TABLE_PREPARED.to_string(),
                        }
                    }
                    Err(e) => {
                        log::warn!("Failed to prepare {}: {}", table, e);
                        TablePreparation {
                            table,
                            success: false,
                            message: e.to_string(),
                        }
                    }
                }
            })
            .collect())
    }
}

/// Fill `{tables}` with one bind placeholder per table name
fn table_statement(template: &str, table_owner: &str, tables: &[String]) -> Result<Statement, OjetError> {
    if tables.is_empty() {
        return Err(OjetError::InvalidInput("At least one table name is required".to_string()));
    }

    let placeholders: Vec<String> = (0..tables.len()).map(|i| format!(":t{}", i)).collect();
    let sql = template.replace("{tables}", &placeholders.join(", "));

    Ok(tables.iter().enumerate().fold(
        Statement::query(sql).bind("tableOwner", table_owner),
        |statement, (i, table)| statement.bind(format!("t{}", i), table.as_str()),
    ))
}

fn next_outcome(
    outcomes: &mut impl Iterator<Item = Result<QueryResult, OjetError>>,
) -> Result<QueryResult, OjetError> {
    outcomes
        .next()
        .unwrap_or_else(|| Err(OjetError::InternalError("missing statement result".to_string())))
}
