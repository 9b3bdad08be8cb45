//! Backup, archive and restore of the store file.
//!
//! Each operation is a whole-file copy plus an optional row in the backup
//! log table. Logging is skipped when the log table does not exist yet, so
//! backups work before the schema has been created. A logging failure never
//! stops the copy; only [`SqliteError::CopyFailure`] is returned.
//!
//! # Example
//!
//! ```no_run
//! use sqlforge_sqlite::BackupCoordinator;
//!
//! let backups = BackupCoordinator::new("BACKUP_LOG", "nightly");
//! let outcome = backups.backup("data/main.db", "data/main.db.bak").unwrap();
//! println!("copied {} bytes (logged: {})", outcome.bytes_copied, outcome.logged);
//!
//! let archived = backups.archive("data/main.db").unwrap();
//! println!("archived to {}", archived.record.destination);
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sqlforge_core::{
    CheckConstraint, ColumnValue, CompiledTable, PrimaryKey, TableDeclaration, Verb, artifact_name,
    compile_table,
};
use sqlforge_db::BackupConfig;
use tracing::{info, warn};
use uuid::Uuid;

use crate::connection::{Connector, table_exists};
use crate::convert::to_sql_value;
use crate::error::{Result, SqliteError};

/// Kind of copy recorded in the backup log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupOperation {
    /// Copy of the main store to the backup path.
    Backup,
    /// Timestamped copy of the main store.
    Archive,
    /// Copy of a backup over the main store.
    Restore,
}

impl BackupOperation {
    /// All operations, in log-check order.
    pub const ALL: [BackupOperation; 3] = [Self::Backup, Self::Archive, Self::Restore];

    /// Value stored in the `operation` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Backup => "backup",
            Self::Archive => "archive",
            Self::Restore => "restore",
        }
    }
}

impl FromStr for BackupOperation {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| format!("unknown backup operation: {s}"))
    }
}

impl fmt::Display for BackupOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the backup log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupRecord {
    /// UUID v4 identifier.
    pub id: String,
    /// Human label from configuration.
    pub label: String,
    /// RFC 3339 UTC timestamp.
    pub timestamp: String,
    /// Operation kind.
    pub operation: BackupOperation,
    /// Copy source path.
    pub source: String,
    /// Copy destination path.
    pub destination: String,
    /// Free-text notes.
    pub notes: String,
}

impl BackupRecord {
    fn new(label: &str, operation: BackupOperation, source: &Path, destination: &Path) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            label: label.to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            operation,
            source: source.display().to_string(),
            destination: destination.display().to_string(),
            notes: String::new(),
        }
    }

    fn values(&self) -> Vec<ColumnValue> {
        vec![
            self.id.as_str().into(),
            self.label.as_str().into(),
            self.timestamp.as_str().into(),
            self.operation.as_str().into(),
            self.source.as_str().into(),
            self.destination.as_str().into(),
            self.notes.as_str().into(),
        ]
    }
}

/// Result of one backup, archive or restore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupOutcome {
    /// Record describing the copy.
    pub record: BackupRecord,
    /// Bytes written to the destination.
    pub bytes_copied: u64,
    /// Whether the record was written to the log table.
    pub logged: bool,
}

/// Declaration of the backup log table.
///
/// # Examples
///
/// ```
/// use sqlforge_sqlite::backup_log_declaration;
///
/// let table = backup_log_declaration("BACKUP_LOG");
/// assert_eq!(
///     table.physical_columns(),
///     vec!["id", "label", "timestamp", "operation", "source", "destination", "notes"]
/// );
/// ```
pub fn backup_log_declaration(table: &str) -> TableDeclaration {
    TableDeclaration::new(table)
        .column("id", "")
        .column("label", "")
        .column("timestamp", "")
        .column("operation", BackupOperation::Backup.as_str())
        .column("source", "")
        .column("destination", "")
        .column("notes", "")
        .primary_key(PrimaryKey::new("id"))
        .check(CheckConstraint::new(
            "operation",
            BackupOperation::ALL.iter().map(|op| op.as_str()),
        ))
        .order_by("timestamp")
}

/// Copies store files and records each copy in the backup log.
#[derive(Debug, Clone)]
pub struct BackupCoordinator {
    log_table: String,
    label: String,
    archive_dir: Option<PathBuf>,
}

impl BackupCoordinator {
    /// Creates a coordinator writing to `log_table` with `label`.
    pub fn new(log_table: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            log_table: log_table.into(),
            label: label.into(),
            archive_dir: None,
        }
    }

    /// Creates a coordinator from the backup section of the configuration.
    pub fn from_config(config: &BackupConfig) -> Self {
        Self {
            log_table: config.log_table.clone(),
            label: config.label.clone(),
            archive_dir: config.archive_dir.clone(),
        }
    }

    /// Writes archives into `dir` instead of next to the source.
    pub fn with_archive_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.archive_dir = Some(dir.into());
        self
    }

    /// Name of the backup log table.
    pub fn log_table(&self) -> &str {
        &self.log_table
    }

    /// Logs into `source` (when the log table exists), then copies it to
    /// `destination`.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::CopyFailure`] if the copy fails; the source
    /// is left untouched. Errors while logging are reported with `warn!`
    /// and leave `logged` false.
    pub fn backup(
        &self,
        source: impl AsRef<Path>,
        destination: impl AsRef<Path>,
    ) -> Result<BackupOutcome> {
        let (source, destination) = (source.as_ref(), destination.as_ref());
        let record = BackupRecord::new(&self.label, BackupOperation::Backup, source, destination);
        let logged = self.try_log(source, &record);
        let bytes_copied = copy(source, destination)?;
        info!(
            from = %source.display(),
            to = %destination.display(),
            bytes = bytes_copied,
            "backup complete"
        );
        Ok(BackupOutcome {
            record,
            bytes_copied,
            logged,
        })
    }

    /// Copies `source` to a new timestamped file.
    ///
    /// The archive is named `{stem}_{YYYYmmdd_HHMMSS_ffffff}.{ext}` and
    /// placed in the configured archive directory, or next to the source.
    pub fn archive(&self, source: impl AsRef<Path>) -> Result<BackupOutcome> {
        let source = source.as_ref();
        let destination = self.archive_path(source);
        let record =
            BackupRecord::new(&self.label, BackupOperation::Archive, source, &destination);
        let logged = self.try_log(source, &record);
        let bytes_copied = copy(source, &destination)?;
        info!(
            from = %source.display(),
            to = %destination.display(),
            bytes = bytes_copied,
            "archive complete"
        );
        Ok(BackupOutcome {
            record,
            bytes_copied,
            logged,
        })
    }

    /// Copies `backup` over `main`, then logs into the restored store.
    pub fn restore(
        &self,
        backup: impl AsRef<Path>,
        main: impl AsRef<Path>,
    ) -> Result<BackupOutcome> {
        let (backup, main) = (backup.as_ref(), main.as_ref());
        let record = BackupRecord::new(&self.label, BackupOperation::Restore, backup, main);
        let bytes_copied = copy(backup, main)?;
        let logged = self.try_log(main, &record);
        info!(
            from = %backup.display(),
            to = %main.display(),
            bytes = bytes_copied,
            "restore complete"
        );
        Ok(BackupOutcome {
            record,
            bytes_copied,
            logged,
        })
    }

    /// Reads every log record from `store`, oldest first.
    ///
    /// Returns an empty list if the store or its log table does not exist.
    pub fn history(&self, store: impl AsRef<Path>) -> Result<Vec<BackupRecord>> {
        let Some(conn) = Connector::new(store.as_ref()).connect_existing(true)? else {
            return Ok(Vec::new());
        };
        if !table_exists(&conn, &self.log_table)? {
            return Ok(Vec::new());
        }
        let compiled = compile_table(&backup_log_declaration(&self.log_table))?;
        let sql = artifact_sql(&compiled, Verb::SelectAll)?;
        let mut records = Vec::new();
        {
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                let raw: String = row.get(3)?;
                let operation = match raw.parse() {
                    Ok(operation) => operation,
                    Err(e) => {
                        warn!(table = %self.log_table, error = %e, "skipping log row");
                        continue;
                    }
                };
                records.push(BackupRecord {
                    id: row.get(0)?,
                    label: row.get(1)?,
                    timestamp: row.get(2)?,
                    operation,
                    source: row.get(4)?,
                    destination: row.get(5)?,
                    notes: row.get(6)?,
                });
            }
        }
        conn.disconnect();
        Ok(records)
    }

    /// Returns the archive destination for `source` at the current time.
    pub fn archive_path(&self, source: &Path) -> PathBuf {
        let dir = self
            .archive_dir
            .clone()
            .or_else(|| source.parent().map(Path::to_path_buf))
            .unwrap_or_default();
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "store".to_string());
        let ext = source.extension().map(|e| e.to_string_lossy().into_owned());
        let stamp = Utc::now().format("%Y%m%d_%H%M%S_%6f").to_string();

        let name = |suffix: &str| match &ext {
            Some(ext) => format!("{stem}_{stamp}{suffix}.{ext}"),
            None => format!("{stem}_{stamp}{suffix}"),
        };
        let mut path = dir.join(name(""));
        let mut n = 1;
        while path.exists() {
            path = dir.join(name(&format!("_{n}")));
            n += 1;
        }
        path
    }

    fn try_log(&self, store: &Path, record: &BackupRecord) -> bool {
        match self.log(store, record) {
            Ok(logged) => logged,
            Err(e) => {
                warn!(store = %store.display(), error = %e, "backup logging failed; record not written");
                false
            }
        }
    }

    fn log(&self, store: &Path, record: &BackupRecord) -> Result<bool> {
        let Some(conn) = Connector::new(store).connect_existing(true)? else {
            warn!(store = %store.display(), "store file missing; not logging");
            return Ok(false);
        };
        if !table_exists(&conn, &self.log_table)? {
            warn!(table = %self.log_table, "backup log table missing; not logging");
            conn.disconnect();
            return Ok(false);
        }
        let compiled = compile_table(&backup_log_declaration(&self.log_table))?;
        let sql = artifact_sql(&compiled, Verb::Insert)?;
        let params = record.values().iter().map(to_sql_value).collect::<Vec<_>>();
        conn.execute(&sql, rusqlite::params_from_iter(params))?;
        conn.disconnect();
        Ok(true)
    }
}

fn artifact_sql(compiled: &CompiledTable, verb: Verb) -> Result<String> {
    compiled
        .artifact(verb)
        .map(|a| a.sql.clone())
        .ok_or_else(|| SqliteError::EmptyArtifact(artifact_name(verb, &compiled.table)))
}

fn copy(from: &Path, to: &Path) -> Result<u64> {
    let failure = |source| SqliteError::CopyFailure {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };
    if let Some(parent) = to.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(failure)?;
    }
    std::fs::copy(from, to).map_err(failure)
}
