//! `CREATE TABLE` and `DROP TABLE` generation.
//!
//! The create statement is emitted on one line: column definitions first,
//! then `CHECK`, `FOREIGN KEY` and `PRIMARY KEY` clauses, all joined by
//! `", "`. The physical column list produced while rendering is the
//! authoritative order for every DML statement of the table.

use crate::artifact::{CompiledArtifact, Verb};
use crate::error::{CompileError, Result};
use crate::expand::expand_column;
use crate::resolve::{ResolvedColumn, render_check_value, resolve_column};
use crate::validate::validate_declaration;
use crate::TableDeclaration;

/// Compiles the `CREATE TABLE` artifact for `table`.
///
/// Returns the artifact together with the physical column names in order.
///
/// # Errors
///
/// Returns [`CompileError::Invalid`] if the declaration fails validation.
///
/// # Examples
///
/// ```
/// use sqlforge_core::{PrimaryKey, TableDeclaration, compile_create};
///
/// let widget = TableDeclaration::new("WIDGET")
///     .column("id", "")
///     .column("label", "")
///     .column("active", true)
///     .primary_key(PrimaryKey::new("id"));
///
/// let (create, columns) = compile_create(&widget).unwrap();
/// assert_eq!(
///     create.sql,
///     "CREATE TABLE IF NOT EXISTS WIDGET (id TEXT DEFAULT '', label TEXT DEFAULT '', \
///      active BOOLEAN DEFAULT 1, PRIMARY KEY (id));"
/// );
/// assert_eq!(columns, vec!["id", "label", "active"]);
/// ```
pub fn compile_create(table: &TableDeclaration) -> Result<(CompiledArtifact, Vec<String>)> {
    ensure_valid(table)?;
    Ok(create_unchecked(table))
}

/// Compiles the `DROP TABLE` artifact for `table`.
///
/// # Examples
///
/// ```
/// use sqlforge_core::compile_drop;
///
/// assert_eq!(compile_drop("WIDGET").sql, "DROP TABLE IF EXISTS WIDGET;");
/// ```
pub fn compile_drop(table: &str) -> CompiledArtifact {
    CompiledArtifact::new(table, Verb::Drop, format!("DROP TABLE IF EXISTS {table};"))
}

pub(crate) fn ensure_valid(table: &TableDeclaration) -> Result<()> {
    let errors = validate_declaration(table);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(CompileError::Invalid {
            table: table.name.clone(),
            errors,
        })
    }
}

/// Resolves every physical column of `table`, flattening groups.
pub fn resolve_columns(table: &TableDeclaration) -> Vec<ResolvedColumn> {
    let constraints = &table.constraints;
    let mut resolved = Vec::new();
    for column in &table.columns {
        if !expand_column(&column.name, constraints, &mut resolved) {
            resolved.push(resolve_column(&column.name, &column.default, constraints));
        }
    }
    resolved
}

pub(crate) fn create_unchecked(table: &TableDeclaration) -> (CompiledArtifact, Vec<String>) {
    let constraints = &table.constraints;
    let resolved = resolve_columns(table);

    let mut lines: Vec<String> = resolved.iter().map(ResolvedColumn::definition).collect();

    for check in &constraints.checks {
        let values: Vec<String> = check.values.iter().map(render_check_value).collect();
        lines.push(format!("CHECK ({} IN ({}))", check.column, values.join(", ")));
    }
    for fk in &constraints.foreign_keys {
        lines.push(format!(
            "FOREIGN KEY ({}) REFERENCES {}({}) ON DELETE CASCADE",
            fk.column, fk.references_table, fk.references_column
        ));
    }
    if let Some(pk) = &constraints.primary_key {
        lines.push(format!("PRIMARY KEY ({})", pk.column));
    }

    let sql = format!(
        "CREATE TABLE IF NOT EXISTS {} ({});",
        table.name,
        lines.join(", ")
    );
    let columns = resolved.into_iter().map(|c| c.name).collect();
    (CompiledArtifact::new(&table.name, Verb::Create, sql), columns)
}
