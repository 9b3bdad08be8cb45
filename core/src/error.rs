//! Error types for declaration compilation and template introspection.

use thiserror::Error;

use crate::validate::ValidationError;

/// Errors raised while compiling a table declaration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// The declaration failed validation.
    #[error("invalid declaration for table {table}: {}", join_errors(.errors))]
    Invalid {
        /// Table name as declared.
        table: String,
        /// Every validation problem found.
        errors: Vec<ValidationError>,
    },
}

/// Errors raised while reading column names back out of a `SELECT` template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// The template has no `SELECT ... FROM` projection.
    #[error("malformed select template: {0}")]
    MalformedTemplate(String),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Convenience alias for results with [`CompileError`].
pub type Result<T> = std::result::Result<T, CompileError>;
