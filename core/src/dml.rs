//! Parameterized DML generation.
//!
//! All statements use `?` positional placeholders and the authoritative
//! column order returned by [`compile_create`](crate::compile_create).
//! Keyed statements filter on the single primary-key column.

use crate::artifact::{CompiledArtifact, Verb};

fn order_clause(order_by: &[String]) -> String {
    if order_by.is_empty() {
        String::new()
    } else {
        format!(" ORDER BY {}", order_by.join(", "))
    }
}

/// `INSERT INTO t (a, b) VALUES (?, ?);`
///
/// # Examples
///
/// ```
/// use sqlforge_core::compile_insert;
///
/// let columns = vec!["id".to_string(), "label".to_string()];
/// assert_eq!(
///     compile_insert("WIDGET", &columns).sql,
///     "INSERT INTO WIDGET (id, label) VALUES (?, ?);"
/// );
/// ```
pub fn compile_insert(table: &str, columns: &[String]) -> CompiledArtifact {
    let placeholders = vec!["?"; columns.len()].join(", ");
    CompiledArtifact::new(
        table,
        Verb::Insert,
        format!(
            "INSERT INTO {table} ({}) VALUES ({placeholders});",
            columns.join(", ")
        ),
    )
}

/// `SELECT a, b FROM t [ORDER BY ...];`
pub fn compile_select_all(
    table: &str,
    columns: &[String],
    order_by: &[String],
) -> CompiledArtifact {
    CompiledArtifact::new(
        table,
        Verb::SelectAll,
        format!(
            "SELECT {} FROM {table}{};",
            columns.join(", "),
            order_clause(order_by)
        ),
    )
}

/// `SELECT a, b FROM t WHERE key = ? [ORDER BY ...];`
pub fn compile_select_by_key(
    table: &str,
    columns: &[String],
    key: &str,
    order_by: &[String],
) -> CompiledArtifact {
    CompiledArtifact::new(
        table,
        Verb::SelectByPk,
        format!(
            "SELECT {} FROM {table} WHERE {key} = ?{};",
            columns.join(", "),
            order_clause(order_by)
        ),
    )
}

/// `UPDATE t SET a=?, b=? WHERE key = ?;`
///
/// The key column is excluded from the `SET` list and its placeholder is
/// last. Returns `None` when the key is the only column.
///
/// # Examples
///
/// ```
/// use sqlforge_core::compile_update;
///
/// let columns = vec!["id".to_string(), "label".to_string(), "active".to_string()];
/// let update = compile_update("WIDGET", &columns, "id").unwrap();
/// assert_eq!(update.sql, "UPDATE WIDGET SET label=?, active=? WHERE id = ?;");
///
/// assert!(compile_update("WIDGET", &["id".to_string()], "id").is_none());
/// ```
pub fn compile_update(table: &str, columns: &[String], key: &str) -> Option<CompiledArtifact> {
    let assignments: Vec<String> = columns
        .iter()
        .filter(|c| c.as_str() != key)
        .map(|c| format!("{c}=?"))
        .collect();
    if assignments.is_empty() {
        return None;
    }
    Some(CompiledArtifact::new(
        table,
        Verb::Update,
        format!(
            "UPDATE {table} SET {} WHERE {key} = ?;",
            assignments.join(", ")
        ),
    ))
}

/// `DELETE FROM t WHERE key = ?;`
pub fn compile_delete(table: &str, key: &str) -> CompiledArtifact {
    CompiledArtifact::new(
        table,
        Verb::Delete,
        format!("DELETE FROM {table} WHERE {key} = ?;"),
    )
}
