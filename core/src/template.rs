//! Column introspection from compiled `SELECT` templates.
//!
//! The runner shapes column-oriented results from the projection of the
//! template it executes, so a read with no matching rows still knows every
//! column name.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::TemplateError;

static SELECT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^\s*SELECT\s+(.*?)\s+FROM\s+\S").expect("static regex must compile")
});

/// Extracts the projected column names of a `SELECT` template.
///
/// # Errors
///
/// Returns [`TemplateError::MalformedTemplate`] if there is no
/// `SELECT ... FROM` clause, the projection is empty, or it uses `*`.
///
/// # Examples
///
/// ```
/// use sqlforge_core::select_columns;
///
/// let cols = select_columns("SELECT id, label FROM WIDGET WHERE id = ?;").unwrap();
/// assert_eq!(cols, vec!["id", "label"]);
///
/// assert!(select_columns("DELETE FROM WIDGET;").is_err());
/// ```
pub fn select_columns(sql: &str) -> Result<Vec<String>, TemplateError> {
    let projection = SELECT_RE
        .captures(sql)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| TemplateError::MalformedTemplate(summarize(sql)))?;

    let columns: Vec<String> = projection
        .split(',')
        .map(|c| c.trim().to_string())
        .collect();
    if columns.iter().any(|c| c.is_empty() || c == "*") {
        return Err(TemplateError::MalformedTemplate(summarize(sql)));
    }
    Ok(columns)
}

fn summarize(sql: &str) -> String {
    let trimmed = sql.trim();
    match trimmed.char_indices().nth(60) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
