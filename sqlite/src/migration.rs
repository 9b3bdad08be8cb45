//! Migration lifecycle over a declaration catalog.
//!
//! Provides [`Migration`] for compiling every declaration into the artifact
//! store, creating and dropping the tables, and reporting their status.
//! Creation and teardown each run as one DDL batch, so either every table
//! is affected or none is.
//!
//! # Example
//!
//! ```no_run
//! use sqlforge_db::StoreConfig;
//! use sqlforge_sqlite::Migration;
//!
//! let config = StoreConfig::load("sqlforge.yml").unwrap();
//! let migration = Migration::from_config(&config).unwrap();
//!
//! // Compile declarations and create tables
//! migration.compile().unwrap();
//! migration.up().unwrap();
//!
//! // Check status
//! for table in migration.status().unwrap().tables {
//!     println!("{}: exists={} rows={}", table.name, table.exists, table.row_count);
//! }
//!
//! // Drop and recreate
//! migration.refresh().unwrap();
//! ```

use std::path::{Path, PathBuf};

use serde::Serialize;
use sqlforge_core::{Verb, artifact_name};
use sqlforge_db::{
    ArtifactManifest, ArtifactStore, DeclarationCatalog, MANIFEST_FILE, StoreConfig,
};
use tracing::info;

use crate::backup::backup_log_declaration;
use crate::connection::{Connector, table_exists};
use crate::error::Result;
use crate::runner::{BatchReport, StatementRunner};

/// Manages the lifecycle of every table in a catalog.
///
/// Foreign keys are off while tables are created or dropped so
/// declaration order never has to follow reference order.
///
/// # Examples
///
/// ```no_run
/// use sqlforge_core::{PrimaryKey, TableDeclaration};
/// use sqlforge_db::{ArtifactStore, DeclarationCatalog};
/// use sqlforge_sqlite::{Connector, Migration, StatementRunner};
///
/// let catalog = DeclarationCatalog::from_declarations(vec![
///     TableDeclaration::new("WIDGET")
///         .column("id", "")
///         .primary_key(PrimaryKey::new("id")),
/// ])
/// .unwrap();
/// let runner = StatementRunner::new(
///     Connector::new("data/main.db"),
///     ArtifactStore::new("artifacts/ddl", "artifacts/dml"),
/// );
///
/// let migration = Migration::new(catalog, runner, "artifacts/manifest.json");
/// let report = migration.compile().unwrap();
/// println!("{} artifacts written", report.artifacts_written);
///
/// migration.up().unwrap();
/// assert!(migration.status().unwrap().tables[0].exists);
/// ```
#[derive(Debug)]
pub struct Migration {
    catalog: DeclarationCatalog,
    runner: StatementRunner,
    manifest_path: PathBuf,
}

impl Migration {
    /// Creates a migration over `catalog`, executing through `runner`.
    pub fn new(
        catalog: DeclarationCatalog,
        runner: StatementRunner,
        manifest_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            catalog,
            runner,
            manifest_path: manifest_path.into(),
        }
    }

    /// Builds a migration from configuration.
    ///
    /// Loads the declaration directory and appends the backup log table
    /// unless the catalog already declares it.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::Store`](crate::SqliteError::Store) if the
    /// declarations cannot be loaded.
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        let mut catalog = if config.declarations.is_dir() {
            DeclarationCatalog::from_dir(&config.declarations)?
        } else {
            DeclarationCatalog::from_file(&config.declarations)?
        };
        if !catalog.contains(&config.backup.log_table) {
            catalog.insert(backup_log_declaration(&config.backup.log_table))?;
        }
        let runner = StatementRunner::new(
            Connector::new(&config.database),
            ArtifactStore::from_config(&config.artifacts),
        );
        Ok(Self::new(
            catalog,
            runner,
            config.artifacts.root.join(MANIFEST_FILE),
        ))
    }

    /// The catalog being migrated.
    pub fn catalog(&self) -> &DeclarationCatalog {
        &self.catalog
    }

    /// The runner used for every batch.
    pub fn runner(&self) -> &StatementRunner {
        &self.runner
    }

    /// Path of the artifact manifest.
    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    /// Compiles every declaration, persists its artifacts, and updates the
    /// manifest.
    ///
    /// Nothing is written unless every declaration compiles.
    pub fn compile(&self) -> Result<CompileReport> {
        let compiled = self.catalog.compile_all()?;
        let mut manifest =
            ArtifactManifest::load_or_new(&self.manifest_path, env!("CARGO_PKG_VERSION"))?;
        let store = self.runner.store();

        let mut report = CompileReport::default();
        for table in &compiled {
            report.artifacts_written += store.persist_table(table)?.len();
            report.tables.push(table.table.clone());
            manifest.record(table);
        }
        manifest.save(&self.manifest_path)?;
        info!(
            tables = report.tables.len(),
            artifacts = report.artifacts_written,
            "compiled catalog"
        );
        Ok(report)
    }

    /// Creates every table in declaration order as one batch.
    pub fn up(&self) -> Result<BatchReport> {
        let names: Vec<String> = self
            .catalog
            .names()
            .map(|t| artifact_name(Verb::Create, t))
            .collect();
        self.runner.run_ddl_batch(&names, false)
    }

    /// Drops every table in reverse declaration order as one batch.
    pub fn down(&self) -> Result<BatchReport> {
        let names: Vec<String> = self
            .catalog
            .names()
            .rev()
            .map(|t| artifact_name(Verb::Drop, t))
            .collect();
        self.runner.run_ddl_batch(&names, false)
    }

    /// Reports, per declared table, whether it exists and its row count.
    ///
    /// A store file that does not exist yet reports every table as absent
    /// without creating the file.
    pub fn status(&self) -> Result<MigrationStatus> {
        let Some(conn) = self.runner.connector().connect_existing(true)? else {
            let tables = self
                .catalog
                .names()
                .map(|name| TableStatus {
                    name: name.to_string(),
                    exists: false,
                    row_count: 0,
                })
                .collect();
            return Ok(MigrationStatus { tables });
        };
        let mut tables = Vec::with_capacity(self.catalog.len());
        for name in self.catalog.names() {
            let exists = table_exists(&conn, name)?;
            let row_count = if exists {
                let count: i64 =
                    conn.query_row(&format!("SELECT COUNT(*) FROM {name}"), [], |row| {
                        row.get(0)
                    })?;
                count as usize
            } else {
                0
            };
            tables.push(TableStatus {
                name: name.to_string(),
                exists,
                row_count,
            });
        }
        conn.disconnect();
        Ok(MigrationStatus { tables })
    }

    /// Recompiles, drops every table, and creates them again.
    ///
    /// Compilation runs first so a workspace that was never compiled still
    /// has its `DROP` artifacts.
    pub fn refresh(&self) -> Result<CompileReport> {
        let report = self.compile()?;
        self.down()?;
        self.up()?;
        Ok(report)
    }
}

/// Tables and artifacts produced by [`Migration::compile`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompileReport {
    /// Compiled table names, in declaration order.
    pub tables: Vec<String>,
    /// Number of artifact files written.
    pub artifacts_written: usize,
}

/// State of one declared table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableStatus {
    /// Table name.
    pub name: String,
    /// Whether the table exists in the store.
    pub exists: bool,
    /// Number of rows, `0` if absent.
    pub row_count: usize,
}

/// Snapshot returned by [`Migration::status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationStatus {
    /// Every declared table, in declaration order.
    pub tables: Vec<TableStatus>,
}

impl MigrationStatus {
    /// Returns `true` if every declared table exists.
    pub fn all_exist(&self) -> bool {
        self.tables.iter().all(|t| t.exists)
    }

    /// Returns the status of `table`.
    pub fn get(&self, table: &str) -> Option<&TableStatus> {
        self.tables.iter().find(|t| t.name == table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlforge_core::{ForeignKey, PrimaryKey, TableDeclaration};

    fn migration(dir: &Path) -> Migration {
        let catalog = DeclarationCatalog::from_declarations(vec![
            TableDeclaration::new("PLANET")
                .column("id", "")
                .primary_key(PrimaryKey::new("id")),
            TableDeclaration::new("MOON")
                .column("id", "")
                .column("planet", "")
                .primary_key(PrimaryKey::new("id"))
                .foreign_key(ForeignKey::new("planet", "PLANET", "id")),
        ])
        .unwrap();
        let runner = StatementRunner::new(
            Connector::new(dir.join("store.db")),
            ArtifactStore::new(dir.join("ddl"), dir.join("dml")),
        );
        Migration::new(catalog, runner, dir.join(MANIFEST_FILE))
    }

    #[test]
    fn test_status_before_up() {
        let dir = tempfile::tempdir().unwrap();
        let status = migration(dir.path()).status().unwrap();
        assert_eq!(status.tables.len(), 2);
        assert!(status.tables.iter().all(|t| !t.exists && t.row_count == 0));
        assert!(!dir.path().join("store.db").exists());
    }

    #[test]
    fn test_compile_writes_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let migration = migration(dir.path());
        let report = migration.compile().unwrap();
        assert_eq!(report.tables, vec!["PLANET", "MOON"]);
        assert_eq!(report.artifacts_written, 14);

        let manifest = ArtifactManifest::load(migration.manifest_path()).unwrap();
        assert_eq!(manifest.get("MOON").unwrap().columns, vec!["id", "planet"]);
    }

    #[test]
    fn test_up_down_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let migration = migration(dir.path());
        migration.compile().unwrap();

        assert_eq!(migration.up().unwrap().executed, vec!["CREATE_PLANET", "CREATE_MOON"]);
        assert!(migration.status().unwrap().all_exist());
        migration.up().unwrap();

        assert_eq!(migration.down().unwrap().executed, vec!["DROP_MOON", "DROP_PLANET"]);
        assert!(migration.status().unwrap().tables.iter().all(|t| !t.exists));
    }

    #[test]
    fn test_up_without_compile_is_empty_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let err = migration(dir.path()).up().unwrap_err();
        assert!(matches!(err, crate::SqliteError::EmptyArtifact(_)));
    }

    #[test]
    fn test_refresh_clears_rows() {
        let dir = tempfile::tempdir().unwrap();
        let migration = migration(dir.path());
        migration.compile().unwrap();
        migration.up().unwrap();
        migration
            .runner()
            .run_insert("PLANET", &["earth".into()])
            .unwrap();
        assert_eq!(migration.status().unwrap().get("PLANET").unwrap().row_count, 1);

        migration.refresh().unwrap();
        let status = migration.status().unwrap();
        assert!(status.all_exist());
        assert_eq!(status.get("PLANET").unwrap().row_count, 0);
    }
}
