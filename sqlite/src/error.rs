//! Error types for the SQLite runtime.
//!
//! Provides a unified error type covering missing artifacts, malformed
//! templates, store-level rejections, rolled-back batches, and failed
//! backup copies.

use std::path::PathBuf;

use sqlforge_core::{CompileError, TemplateError};
use sqlforge_db::StoreError;
use thiserror::Error;

/// Errors that can occur while running artifacts or copying store files.
#[derive(Debug, Error)]
pub enum SqliteError {
    /// A named artifact is missing or empty.
    #[error("artifact not found or empty: {0}")]
    EmptyArtifact(String),

    /// Column names could not be read from a `SELECT` template.
    #[error("malformed select template: {0}")]
    MalformedTemplate(String),

    /// The store rejected an `INSERT`, `UPDATE` or `DELETE`.
    #[error("constraint violation on {table}: {message}")]
    ConstraintViolation {
        /// Table the statement targeted.
        table: String,
        /// Message reported by SQLite.
        message: String,
    },

    /// A statement in a DDL batch failed; the whole batch was rolled back.
    #[error("batch rolled back at {statement}: {source}")]
    TransactionFailure {
        /// Artifact name of the failing statement.
        statement: String,
        /// Underlying SQLite error.
        source: rusqlite::Error,
    },

    /// A backup, archive or restore copy failed.
    #[error("failed to copy {} to {}: {source}", .from.display(), .to.display())]
    CopyFailure {
        /// Copy source.
        from: PathBuf,
        /// Copy destination.
        to: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// SQLite operation failure outside a batch.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// File I/O failure outside a copy.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Artifact store failure.
    #[error("store error: {0}")]
    Store(StoreError),

    /// A declaration failed to compile.
    #[error(transparent)]
    Compile(#[from] CompileError),
}

impl From<StoreError> for SqliteError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::EmptyArtifact(name) => Self::EmptyArtifact(name),
            StoreError::CompileError(err) => Self::Compile(err),
            other => Self::Store(other),
        }
    }
}

impl From<TemplateError> for SqliteError {
    fn from(err: TemplateError) -> Self {
        match err {
            TemplateError::MalformedTemplate(sql) => Self::MalformedTemplate(sql),
        }
    }
}

/// Convenience alias for results with [`SqliteError`].
pub type Result<T> = std::result::Result<T, SqliteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_empty_artifact_is_lifted() {
        let err: SqliteError = StoreError::EmptyArtifact("INSERT_T".into()).into();
        assert!(matches!(err, SqliteError::EmptyArtifact(name) if name == "INSERT_T"));
    }

    #[test]
    fn test_other_store_errors_are_wrapped() {
        let err: SqliteError = StoreError::DuplicateTable("T".into()).into();
        assert!(matches!(err, SqliteError::Store(StoreError::DuplicateTable(_))));
    }

    #[test]
    fn test_copy_failure_message_names_paths() {
        let err = SqliteError::CopyFailure {
            from: PathBuf::from("a.db"),
            to: PathBuf::from("b.db"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(err.to_string(), "failed to copy a.db to b.db: gone");
    }
}
