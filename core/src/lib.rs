//! Table declarations and SQL artifact compilation.
//!
//! This crate turns a declared table shape into the SQL statements used to
//! create, drop, and access it:
//!
//! - [`TableDeclaration`]: table name, columns with representative
//!   default values, and a [`ConstraintSet`] (primary key, foreign keys,
//!   enumeration checks, JSON columns, grouped columns, default ordering).
//! - [`resolve_column`]: maps a default value to a [`SqlType`], a
//!   `DEFAULT` literal, and an optional placeholder comment.
//! - [`expand_column`]: flattens grouped columns into `{prefix}_{field}`
//!   physical columns.
//! - [`compile_create`] / [`compile_drop`]: DDL.
//! - [`compile_insert`], [`compile_select_all`], [`compile_select_by_key`],
//!   [`compile_update`], [`compile_delete`]: parameterized DML.
//! - [`compile_table`]: all of the above from one validated declaration.
//!
//! Validation ([`validate_declaration`]) reports unknown constraint
//! columns, duplicate flattened columns, and composite keys before any SQL
//! is produced.
//!
//! # Example
//!
//! ```
//! use sqlforge_core::*;
//!
//! let widget = TableDeclaration::new("WIDGET")
//!     .column("id", "")
//!     .column("label", "")
//!     .column("active", true)
//!     .primary_key(PrimaryKey::new("id"));
//!
//! let compiled = compile_table(&widget).unwrap();
//! assert_eq!(compiled.columns, vec!["id", "label", "active"]);
//! assert_eq!(
//!     compiled.artifact(Verb::Insert).unwrap().sql,
//!     "INSERT INTO WIDGET (id, label, active) VALUES (?, ?, ?);"
//! );
//! ```

mod artifact;
mod compile;
mod ddl;
mod dml;
mod error;
mod expand;
mod resolve;
mod template;
mod types;
mod validate;

pub use artifact::{CompiledArtifact, CompiledTable, Verb, artifact_name, parse_artifact_name};
pub use compile::compile_table;
pub use ddl::{compile_create, compile_drop, resolve_columns};
pub use dml::{
    compile_delete, compile_insert, compile_select_all, compile_select_by_key, compile_update,
};
pub use error::{CompileError, Result, TemplateError};
pub use expand::expand_column;
pub use resolve::{
    PLACEHOLDER_MARKERS, ResolvedColumn, infer_type, placeholder_kind, quote, render_literal,
    resolve_column,
};
pub use template::select_columns;
pub use types::*;
pub use validate::{ValidationError, is_identifier, is_reserved_word, validate_declaration};
