//! Declaration validation.
//!
//! Validates structural invariants of a [`TableDeclaration`] before it is
//! compiled, catching errors such as unknown constraint columns, duplicate
//! flattened columns, and composite keys before they turn into broken SQL.
//!
//! # Examples
//!
//! ```
//! use sqlforge_core::*;
//!
//! let table = TableDeclaration::new("WIDGET")
//!     .column("id", "")
//!     .primary_key(PrimaryKey::new("id"));
//! assert!(validate_declaration(&table).is_empty());
//!
//! // Invalid: ordering by a column that does not exist
//! let bad = table.clone().order_by("missing");
//! assert!(!validate_declaration(&bad).is_empty());
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::{DeclaredColumn, TableDeclaration};

/// Declaration validation errors.
///
/// Each variant describes a specific structural problem found during
/// validation. The `Display` impl provides a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Table name is empty or whitespace-only.
    #[error("table name cannot be empty")]
    EmptyTableName,
    /// A table or column name is not a plain SQL identifier.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
    /// The table declares no columns.
    #[error("table declares no columns")]
    NoColumns,
    /// Two physical columns share a name after group flattening.
    #[error("duplicate column: {0}")]
    DuplicateColumn(String),
    /// More than one primary-key column was declared.
    #[error("composite primary key is not supported: {0}")]
    CompositePrimaryKey(String),
    /// A primary-key list with no columns.
    #[error("primary key must name a column")]
    EmptyPrimaryKey,
    /// A constraint refers to a column that is not a physical column.
    #[error("{constraint} refers to unknown column: {column}")]
    UnknownColumn {
        /// Constraint kind (e.g. `"primary key"`).
        constraint: &'static str,
        /// Offending column name.
        column: String,
    },
    /// A group whose prefix matches no declared column.
    #[error("group prefix does not match a declared column: {0}")]
    OrphanGroup(String),
    /// A group with no fields.
    #[error("group has no fields: {0}")]
    EmptyGroup(String),
    /// A check constraint with no allowed values.
    #[error("check constraint on {0} has no values")]
    EmptyCheck(String),
    /// A name SQLite will not accept as a bare identifier.
    #[error("reserved word used as identifier: {0}")]
    ReservedWord(String),
}

/// SQLite keywords that cannot appear as unquoted table or column names.
const RESERVED_WORDS: &[&str] = &[
    "ADD", "ALL", "ALTER", "AND", "AS", "AUTOINCREMENT", "BETWEEN", "CASE", "CHECK", "COLLATE",
    "COMMIT", "CONSTRAINT", "CREATE", "CROSS", "CURRENT_DATE", "CURRENT_TIME",
    "CURRENT_TIMESTAMP", "DEFAULT", "DEFERRABLE", "DELETE", "DISTINCT", "DROP", "ELSE", "ESCAPE",
    "EXCEPT", "EXISTS", "FOREIGN", "FROM", "FULL", "GROUP", "HAVING", "IN", "INDEX", "INDEXED",
    "INNER", "INSERT", "INTERSECT", "INTO", "IS", "ISNULL", "JOIN", "LEFT", "LIMIT", "NATURAL",
    "NOT", "NOTHING", "NOTNULL", "NULL", "ON", "OR", "ORDER", "OUTER", "PRIMARY", "REFERENCES",
    "RETURNING", "RIGHT", "SELECT", "SET", "TABLE", "THEN", "TO", "TRANSACTION", "UNION",
    "UNIQUE", "UPDATE", "USING", "VALUES", "WHEN", "WHERE",
];

/// Returns `true` if `name` is a reserved SQLite keyword, in any case.
pub fn is_reserved_word(name: &str) -> bool {
    RESERVED_WORDS
        .iter()
        .any(|word| word.eq_ignore_ascii_case(name))
}

fn check_identifier(name: &str, errors: &mut Vec<ValidationError>) {
    if !is_identifier(name) {
        errors.push(ValidationError::InvalidIdentifier(name.to_string()));
    } else if is_reserved_word(name) {
        errors.push(ValidationError::ReservedWord(name.to_string()));
    }
}

/// Returns `true` if `name` is a plain SQL identifier.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Validates a table declaration.
///
/// Returns every problem found; an empty vector means the declaration
/// compiles.
pub fn validate_declaration(table: &TableDeclaration) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if table.name.trim().is_empty() {
        errors.push(ValidationError::EmptyTableName);
        return errors;
    }
    check_identifier(&table.name, &mut errors);
    if table.columns.is_empty() {
        errors.push(ValidationError::NoColumns);
        return errors;
    }

    let constraints = &table.constraints;
    let declared: HashSet<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
    for group in &constraints.groups {
        if !declared.contains(group.prefix.as_str()) {
            errors.push(ValidationError::OrphanGroup(group.prefix.clone()));
        }
        if group.fields.is_empty() {
            errors.push(ValidationError::EmptyGroup(group.prefix.clone()));
        }
    }

    let mut physical: HashSet<String> = HashSet::new();
    for column in table.declared_columns() {
        let names = match column {
            DeclaredColumn::Simple(c) => vec![c.name.clone()],
            DeclaredColumn::Grouped(g) => g.physical_names(),
        };
        for name in names {
            check_identifier(&name, &mut errors);
            if !physical.insert(name.clone()) {
                errors.push(ValidationError::DuplicateColumn(name));
            }
        }
    }

    let mut require = |constraint: &'static str, column: &str| {
        if !physical.contains(column) {
            errors.push(ValidationError::UnknownColumn {
                constraint,
                column: column.to_string(),
            });
        }
    };

    if let Some(pk) = &constraints.primary_key {
        require("primary key", &pk.column);
    }
    for fk in &constraints.foreign_keys {
        require("foreign key", &fk.column);
    }
    for check in &constraints.checks {
        require("check", &check.column);
    }
    for column in &constraints.json_columns {
        require("json column", column);
    }
    for column in &constraints.order_by {
        require("order by", column);
    }

    for fk in &constraints.foreign_keys {
        for name in [&fk.references_table, &fk.references_column] {
            check_identifier(name, &mut errors);
        }
    }
    for check in &constraints.checks {
        if check.values.is_empty() {
            errors.push(ValidationError::EmptyCheck(check.column.clone()));
        }
    }

    errors
}
