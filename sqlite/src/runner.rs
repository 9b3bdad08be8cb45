//! Statement execution against compiled artifacts.
//!
//! Provides [`StatementRunner`], which loads a named artifact from the
//! [`ArtifactStore`], acquires a scoped connection, executes exactly one
//! logical unit of work, and releases the connection.
//!
//! # Example
//!
//! ```no_run
//! use sqlforge_core::ColumnValue;
//! use sqlforge_db::ArtifactStore;
//! use sqlforge_sqlite::{Connector, StatementRunner};
//!
//! let runner = StatementRunner::new(
//!     Connector::new("data/main.db"),
//!     ArtifactStore::new("artifacts/ddl", "artifacts/dml"),
//! );
//!
//! runner.run_ddl_batch(&["CREATE_WIDGET"], false).unwrap();
//! runner
//!     .run_insert("WIDGET", &["w1".into(), "Button".into(), false.into()])
//!     .unwrap();
//!
//! let widget = runner.run_select_by_key("WIDGET", &ColumnValue::text("w1")).unwrap();
//! println!("{}", serde_json::to_string_pretty(&widget).unwrap());
//! ```

use rusqlite::params_from_iter;
use rusqlite::types::Value;
use sqlforge_core::{ColumnValue, Verb, artifact_name, select_columns};
use sqlforge_db::ArtifactStore;
use tracing::{debug, error, info, warn};

use crate::connection::Connector;
use crate::convert::{ColumnarResult, to_sql_value};
use crate::error::{Result, SqliteError};

/// Outcome of a committed DDL batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Artifact names executed, in order.
    pub executed: Vec<String>,
}

impl BatchReport {
    /// Number of statements committed.
    pub fn len(&self) -> usize {
        self.executed.len()
    }

    /// Returns `true` for an empty batch.
    pub fn is_empty(&self) -> bool {
        self.executed.is_empty()
    }
}

/// Executes compiled artifacts against one store.
///
/// Callers supply values in the authoritative column order recorded when
/// the table was compiled; no name-based checking happens here.
#[derive(Debug, Clone)]
pub struct StatementRunner {
    connector: Connector,
    store: ArtifactStore,
}

impl StatementRunner {
    /// Creates a runner over a store file and an artifact store.
    pub fn new(connector: Connector, store: ArtifactStore) -> Self {
        Self { connector, store }
    }

    /// The connector used for every operation.
    pub fn connector(&self) -> &Connector {
        &self.connector
    }

    /// The artifact store statements are loaded from.
    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Runs `SELECT_ALL_{table}` and returns every row column-wise.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::EmptyArtifact`] if the artifact is missing
    /// and [`SqliteError::MalformedTemplate`] if its projection cannot be
    /// read.
    pub fn run_select_all(&self, table: &str) -> Result<ColumnarResult> {
        self.select(Verb::SelectAll, table, Vec::new())
    }

    /// Runs `SELECT_BY_PK_{table}` for one key value.
    ///
    /// An unmatched key yields every column bound to an empty sequence.
    pub fn run_select_by_key(&self, table: &str, key: &ColumnValue) -> Result<ColumnarResult> {
        self.select(Verb::SelectByPk, table, vec![to_sql_value(key)])
    }

    fn select(&self, verb: Verb, table: &str, params: Vec<Value>) -> Result<ColumnarResult> {
        let name = artifact_name(verb, table);
        let sql = self.store.load(&name)?;
        let columns = select_columns(&sql)?;

        let conn = self.connector.connect(true)?;
        let mut result = ColumnarResult::with_columns(columns);
        {
            let mut stmt = conn.prepare(&sql)?;
            let width = stmt.column_count();
            if width != result.column_count() {
                return Err(SqliteError::MalformedTemplate(name));
            }
            let mut rows = stmt.query(params_from_iter(params))?;
            while let Some(row) = rows.next()? {
                let mut values = Vec::with_capacity(width);
                for i in 0..width {
                    values.push(row.get::<_, Value>(i)?);
                }
                result.push_row(values);
            }
        }
        conn.disconnect();
        debug!(artifact = %name, rows = result.row_count(), "select complete");
        Ok(result)
    }

    /// Runs named DDL artifacts in one transaction.
    ///
    /// Every artifact is loaded before the transaction opens. If any
    /// statement fails the whole batch is rolled back and
    /// [`SqliteError::TransactionFailure`] names the failing artifact.
    pub fn run_ddl_batch<S: AsRef<str>>(
        &self,
        names: &[S],
        enforce_foreign_keys: bool,
    ) -> Result<BatchReport> {
        let statements = names
            .iter()
            .map(|n| {
                let name = n.as_ref().to_string();
                self.store.load(&name).map(|sql| (name, sql))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut conn = self.connector.connect(enforce_foreign_keys)?;
        let tx = conn.transaction()?;
        let mut report = BatchReport::default();
        for (name, sql) in statements {
            if let Err(e) = tx.execute_batch(&sql) {
                error!(statement = %name, error = %e, "batch failed; rolling back");
                if let Err(rollback) = tx.rollback() {
                    warn!(error = %rollback, "rollback reported an error");
                }
                return Err(SqliteError::TransactionFailure {
                    statement: name,
                    source: e,
                });
            }
            debug!(statement = %name, "executed");
            report.executed.push(name);
        }
        tx.commit()?;
        conn.disconnect();
        info!(statements = report.len(), "batch committed");
        Ok(report)
    }

    /// Runs `INSERT_{table}` with a full row in column order.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::ConstraintViolation`] if the store rejects
    /// the row.
    pub fn run_insert(&self, table: &str, values: &[ColumnValue]) -> Result<usize> {
        let params = values.iter().map(to_sql_value).collect();
        self.execute(Verb::Insert, table, params)
    }

    /// Runs `UPDATE_{table}`: non-key values in column order, then the key.
    pub fn run_update(
        &self,
        table: &str,
        key: &ColumnValue,
        values: &[ColumnValue],
    ) -> Result<usize> {
        let mut params: Vec<Value> = values.iter().map(to_sql_value).collect();
        params.push(to_sql_value(key));
        self.execute(Verb::Update, table, params)
    }

    /// Runs `DELETE_{table}` for one key value.
    pub fn run_delete(&self, table: &str, key: &ColumnValue) -> Result<usize> {
        self.execute(Verb::Delete, table, vec![to_sql_value(key)])
    }

    fn execute(&self, verb: Verb, table: &str, params: Vec<Value>) -> Result<usize> {
        let name = artifact_name(verb, table);
        let sql = self.store.load(&name)?;

        let conn = self.connector.connect(true)?;
        let changed = conn
            .execute(&sql, params_from_iter(params))
            .map_err(|e| constraint_or_database(table, e))?;
        conn.disconnect();
        debug!(artifact = %name, rows = changed, "executed");
        Ok(changed)
    }
}

fn constraint_or_database(table: &str, err: rusqlite::Error) -> SqliteError {
    if err.sqlite_error_code() == Some(rusqlite::ErrorCode::ConstraintViolation) {
        SqliteError::ConstraintViolation {
            table: table.to_string(),
            message: err.to_string(),
        }
    } else {
        SqliteError::Database(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlforge_core::{PrimaryKey, TableDeclaration, compile_table};

    fn runner(dir: &std::path::Path) -> StatementRunner {
        let store = ArtifactStore::new(dir.join("ddl"), dir.join("dml"));
        let widget = TableDeclaration::new("WIDGET")
            .column("id", "")
            .column("label", "")
            .column("active", true)
            .primary_key(PrimaryKey::new("id"));
        store.persist_table(&compile_table(&widget).unwrap()).unwrap();
        StatementRunner::new(Connector::new(dir.join("store.db")), store)
    }

    #[test]
    fn test_insert_select_update_delete() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(dir.path());
        runner.run_ddl_batch(&["CREATE_WIDGET"], false).unwrap();

        let key = ColumnValue::text("w1");
        runner
            .run_insert("WIDGET", &["w1".into(), "Button".into(), false.into()])
            .unwrap();
        assert_eq!(
            runner
                .run_update("WIDGET", &key, &["Knob".into(), true.into()])
                .unwrap(),
            1
        );

        let row = runner.run_select_by_key("WIDGET", &key).unwrap();
        assert_eq!(row.get("label").unwrap(), &[Value::Text("Knob".into())]);
        assert_eq!(row.get("active").unwrap(), &[Value::Integer(1)]);

        assert_eq!(runner.run_delete("WIDGET", &key).unwrap(), 1);
        assert!(runner.run_select_all("WIDGET").unwrap().is_empty());
    }

    #[test]
    fn test_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let err = runner(dir.path()).run_select_all("GADGET").unwrap_err();
        assert!(matches!(err, SqliteError::EmptyArtifact(name) if name == "SELECT_ALL_GADGET"));
    }

    #[test]
    fn test_missing_artifact_fails_before_batch_starts() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(dir.path());
        let err = runner
            .run_ddl_batch(&["CREATE_WIDGET", "CREATE_GADGET"], false)
            .unwrap_err();
        assert!(matches!(err, SqliteError::EmptyArtifact(_)));
        assert!(!dir.path().join("store.db").exists());
    }

    #[test]
    fn test_duplicate_key_is_constraint_violation() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(dir.path());
        runner.run_ddl_batch(&["CREATE_WIDGET"], false).unwrap();

        let row: Vec<ColumnValue> = vec!["w1".into(), "Button".into(), false.into()];
        runner.run_insert("WIDGET", &row).unwrap();
        let err = runner.run_insert("WIDGET", &row).unwrap_err();
        assert!(matches!(err, SqliteError::ConstraintViolation { table, .. } if table == "WIDGET"));
    }

    #[test]
    fn test_empty_batch_commits() {
        let dir = tempfile::tempdir().unwrap();
        let report = runner(dir.path())
            .run_ddl_batch::<&str>(&[], false)
            .unwrap();
        assert!(report.is_empty());
    }
}
