//! SQLite runtime for compiled sqlforge artifacts.
//!
//! This crate executes the statements compiled by `sqlforge-core` and
//! persisted by `sqlforge-db`. Every operation acquires its own scoped
//! connection, performs one logical unit of work, and releases it.
//!
//! # Architecture
//!
//! - **`connection`**: scoped connections with the foreign-key pragma set
//! - **`runner`**: artifact execution with column-oriented reads and
//!   all-or-nothing DDL batches
//! - **`backup`**: backup, archive and restore with an optional log table
//! - **`migration`**: compile/up/down/status/refresh over a catalog
//! - **`convert`**: value binding and the column-oriented result type
//!
//! # Quick start
//!
//! ```no_run
//! use sqlforge_core::{ColumnValue, PrimaryKey, TableDeclaration};
//! use sqlforge_db::{ArtifactStore, DeclarationCatalog};
//! use sqlforge_sqlite::{Connector, Migration, StatementRunner};
//!
//! let catalog = DeclarationCatalog::from_declarations(vec![
//!     TableDeclaration::new("WIDGET")
//!         .column("id", "")
//!         .column("label", "")
//!         .column("active", true)
//!         .primary_key(PrimaryKey::new("id")),
//! ])
//! .unwrap();
//! let runner = StatementRunner::new(
//!     Connector::new("data/main.db"),
//!     ArtifactStore::new("artifacts/ddl", "artifacts/dml"),
//! );
//! let migration = Migration::new(catalog, runner.clone(), "artifacts/manifest.json");
//! migration.compile().unwrap();
//! migration.up().unwrap();
//!
//! runner
//!     .run_insert("WIDGET", &["w1".into(), "Button".into(), false.into()])
//!     .unwrap();
//! let widget = runner.run_select_by_key("WIDGET", &ColumnValue::text("w1")).unwrap();
//! assert_eq!(widget.row_count(), 1);
//! ```

mod backup;
mod connection;
mod convert;
mod error;
mod migration;
mod runner;

pub use backup::{
    BackupCoordinator, BackupOperation, BackupOutcome, BackupRecord, backup_log_declaration,
};
pub use connection::{Connector, ScopedConnection, table_exists};
pub use convert::{ColumnarResult, to_sql_value, value_to_json};
pub use error::{Result, SqliteError};
pub use migration::{CompileReport, Migration, MigrationStatus, TableStatus};
pub use runner::{BatchReport, StatementRunner};
