//! Error types for artifact storage and declaration loading.
//!
//! Provides a unified error type covering all failure modes: I/O,
//! serialization, missing artifacts, and invalid declarations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while storing artifacts or loading declarations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// A named artifact is missing or empty.
    #[error("artifact not found or empty: {0}")]
    EmptyArtifact(String),

    /// A name that does not follow the `{VERB}_{TABLE}` convention.
    #[error("invalid artifact name: {0}")]
    InvalidArtifactName(String),

    /// A declaration failed to compile.
    #[error(transparent)]
    CompileError(#[from] sqlforge_core::CompileError),

    /// Two declarations share a table name.
    #[error("duplicate table declaration: {0}")]
    DuplicateTable(String),

    /// A declaration file could not be parsed.
    #[error("invalid declaration file {path}: {message}")]
    InvalidDeclaration {
        /// File that failed to parse.
        path: PathBuf,
        /// Parser message.
        message: String,
    },
}

/// Convenience alias for results with [`StoreError`].
pub type Result<T> = std::result::Result<T, StoreError>;
