//! Column type and default-literal resolution.
//!
//! Maps a column's representative default value and the table's
//! [`ConstraintSet`] to a SQL type, a `DEFAULT` literal, and an optional
//! documentary comment. Nothing here fails: values with no natural SQL
//! mapping fall back to `TEXT`.

use crate::{ColumnValue, ConstraintSet, SqlType};

/// Substrings marking a default value as a rendering placeholder rather
/// than real data. The first match names the comment.
pub const PLACEHOLDER_MARKERS: &[&str] =
    &["Surface", "Rect", "Color", "Font", "Sound", "Sprite"];

/// A physical column ready to be rendered into `CREATE TABLE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumn {
    /// Physical column name.
    pub name: String,
    /// Resolved SQL type.
    pub sql_type: SqlType,
    /// Rendered default literal (e.g. `''`, `1`, `0.5`).
    pub default_literal: String,
    /// Placeholder object type, if the default looked like one.
    pub comment: Option<String>,
}

impl ResolvedColumn {
    /// Renders the column definition line.
    ///
    /// # Examples
    ///
    /// ```
    /// use sqlforge_core::{ColumnValue, ConstraintSet, resolve_column};
    ///
    /// let col = resolve_column("active", &ColumnValue::Boolean(true), &ConstraintSet::default());
    /// assert_eq!(col.definition(), "active BOOLEAN DEFAULT 1");
    /// ```
    pub fn definition(&self) -> String {
        let mut line = format!(
            "{} {} DEFAULT {}",
            self.name, self.sql_type, self.default_literal
        );
        if let Some(kind) = &self.comment {
            line.push_str(&format!(" /* {kind} object */"));
        }
        line
    }
}

/// Infers the SQL type of a representative value.
///
/// Opaque and structured values fall back to `TEXT`.
pub fn infer_type(value: &ColumnValue) -> SqlType {
    match value {
        ColumnValue::Text(_) => SqlType::Text,
        ColumnValue::Boolean(_) => SqlType::Boolean,
        ColumnValue::Float(_) => SqlType::Numeric,
        ColumnValue::Integer(_) => SqlType::Integer,
        ColumnValue::Opaque { .. } | ColumnValue::Json(_) => SqlType::Text,
    }
}

/// Quotes `text` as a SQL string literal.
pub fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

/// Renders `value` as a literal for a column of type `sql_type`.
///
/// Booleans become `1`/`0`. Numeric and boolean values of
/// `INTEGER`/`NUMERIC`/`BOOLEAN` columns are emitted bare; everything else
/// is quoted, including a text default on a column whose type was hinted
/// numeric.
pub fn render_literal(value: &ColumnValue, sql_type: SqlType) -> String {
    let raw = match value {
        ColumnValue::Boolean(b) => u8::from(*b).to_string(),
        other => other.printable(),
    };
    let bare_type = sql_type.is_numeric() || sql_type == SqlType::Boolean;
    let bare_value = matches!(
        value,
        ColumnValue::Boolean(_) | ColumnValue::Integer(_) | ColumnValue::Float(_)
    );
    if bare_type && bare_value {
        raw
    } else {
        quote(&raw)
    }
}

/// Renders a value for an `IN (...)` list, using the value's own type.
pub fn render_check_value(value: &ColumnValue) -> String {
    render_literal(value, infer_type(value))
}

/// Returns the placeholder marker contained in the value's printable form.
pub fn placeholder_kind(value: &ColumnValue) -> Option<&'static str> {
    let printable = value.printable();
    PLACEHOLDER_MARKERS
        .iter()
        .copied()
        .find(|marker| printable.contains(marker))
}

/// Resolves one physical column.
///
/// JSON columns are forced to `JSON`; a primary-key type hint overrides
/// the inferred type of the key column.
pub fn resolve_column(
    name: &str,
    default: &ColumnValue,
    constraints: &ConstraintSet,
) -> ResolvedColumn {
    let hinted = constraints
        .primary_key
        .as_ref()
        .filter(|pk| pk.column == name)
        .and_then(|pk| pk.sql_type);

    let sql_type = if constraints.is_json(name) {
        SqlType::Json
    } else {
        hinted.unwrap_or_else(|| infer_type(default))
    };

    ResolvedColumn {
        name: name.to_string(),
        sql_type,
        default_literal: render_literal(default, sql_type),
        comment: placeholder_kind(default).map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PrimaryKey;

    fn none() -> ConstraintSet {
        ConstraintSet::default()
    }

    #[test]
    fn test_type_mapping() {
        assert_eq!(infer_type(&ColumnValue::text("")), SqlType::Text);
        assert_eq!(infer_type(&ColumnValue::Boolean(false)), SqlType::Boolean);
        assert_eq!(infer_type(&ColumnValue::Float(1.5)), SqlType::Numeric);
        assert_eq!(infer_type(&ColumnValue::Integer(7)), SqlType::Integer);
    }

    #[test]
    fn test_unknown_values_fall_back_to_text() {
        assert_eq!(infer_type(&ColumnValue::opaque("<object>")), SqlType::Text);
        assert_eq!(
            infer_type(&ColumnValue::Json(serde_json::json!({"a": 1}))),
            SqlType::Text
        );
    }

    #[test]
    fn test_json_column_forced() {
        let mut constraints = none();
        constraints.json_columns.push("tags".into());
        let col = resolve_column("tags", &ColumnValue::Integer(0), &constraints);
        assert_eq!(col.sql_type, SqlType::Json);
        assert_eq!(col.default_literal, "'0'");
    }

    #[test]
    fn test_default_literals() {
        let c = none();
        assert_eq!(resolve_column("a", &ColumnValue::text(""), &c).default_literal, "''");
        assert_eq!(resolve_column("a", &true.into(), &c).default_literal, "1");
        assert_eq!(resolve_column("a", &false.into(), &c).default_literal, "0");
        assert_eq!(resolve_column("a", &42.into(), &c).default_literal, "42");
        assert_eq!(resolve_column("a", &0.5.into(), &c).default_literal, "0.5");
        assert_eq!(resolve_column("a", &0.0.into(), &c).default_literal, "0.0");
    }

    #[test]
    fn test_quotes_are_escaped() {
        let col = resolve_column("name", &ColumnValue::text("O'Neil"), &none());
        assert_eq!(col.default_literal, "'O''Neil'");
    }

    #[test]
    fn test_placeholder_comment() {
        let col = resolve_column(
            "sprite",
            &ColumnValue::opaque("<Surface(32x32x32 SW)>"),
            &none(),
        );
        assert_eq!(col.comment.as_deref(), Some("Surface"));
        assert_eq!(
            col.definition(),
            "sprite TEXT DEFAULT '<Surface(32x32x32 SW)>' /* Surface object */"
        );

        let plain = resolve_column("label", &ColumnValue::text("Button"), &none());
        assert!(plain.comment.is_none());
    }

    #[test]
    fn test_primary_key_type_hint() {
        let mut constraints = none();
        constraints.primary_key = Some(PrimaryKey::new("id").with_type(SqlType::Integer));
        let col = resolve_column("id", &ColumnValue::Integer(0), &constraints);
        assert_eq!(col.sql_type, SqlType::Integer);
        assert_eq!(col.default_literal, "0");

        let other = resolve_column("label", &ColumnValue::text("0"), &constraints);
        assert_eq!(other.sql_type, SqlType::Text);
    }

    #[test]
    fn test_hinted_key_with_text_default_stays_quoted() {
        let mut constraints = none();
        constraints.primary_key = Some(PrimaryKey::new("id").with_type(SqlType::Integer));

        let empty = resolve_column("id", &ColumnValue::text(""), &constraints);
        assert_eq!(empty.sql_type, SqlType::Integer);
        assert_eq!(empty.definition(), "id INTEGER DEFAULT ''");

        let spaced = resolve_column("id", &ColumnValue::text("it's new"), &constraints);
        assert_eq!(spaced.default_literal, "'it''s new'");

        let boolean_hint = PrimaryKey::new("id").with_type(SqlType::Boolean);
        constraints.primary_key = Some(boolean_hint);
        let flag = resolve_column("id", &ColumnValue::text("yes"), &constraints);
        assert_eq!(flag.default_literal, "'yes'");
    }

    #[test]
    fn test_check_values_use_own_type() {
        assert_eq!(render_check_value(&ColumnValue::text("red")), "'red'");
        assert_eq!(render_check_value(&ColumnValue::Integer(3)), "3");
        assert_eq!(render_check_value(&ColumnValue::Boolean(true)), "1");
    }
}
