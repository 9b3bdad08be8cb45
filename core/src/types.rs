//! Table declaration types and the constraint model.
//!
//! A [`TableDeclaration`] describes a table's logical shape: its name, an
//! ordered list of columns with representative default values, and a
//! [`ConstraintSet`]. Default values are used only for type inference and
//! for the `DEFAULT` clause; they never become row data.
//!
//! All types deserialize from YAML or JSON so declarations can live in
//! files next to the application that owns them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::validate::ValidationError;

/// Representative value of a column, used to infer its SQL type.
///
/// Deserialized untagged, so a declaration file reads naturally:
/// `true` is a [`Boolean`](ColumnValue::Boolean), `0` an
/// [`Integer`](ColumnValue::Integer), `0.5` a [`Float`](ColumnValue::Float),
/// `""` a [`Text`](ColumnValue::Text), `{opaque: "<Surface(32x32)>"}` an
/// [`Opaque`](ColumnValue::Opaque) and any other list or map a
/// [`Json`](ColumnValue::Json) value.
///
/// # Examples
///
/// ```
/// use sqlforge_core::ColumnValue;
///
/// let v: ColumnValue = serde_json::from_str("true").unwrap();
/// assert_eq!(v, ColumnValue::Boolean(true));
///
/// let v: ColumnValue = serde_json::from_str("12").unwrap();
/// assert_eq!(v, ColumnValue::Integer(12));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnValue {
    /// Boolean value, stored as `0`/`1`.
    Boolean(bool),
    /// Integer value.
    Integer(i64),
    /// Floating point value.
    Float(f64),
    /// String value.
    Text(String),
    /// Printable form of a non-data object (e.g. a rendering placeholder).
    Opaque {
        /// Printable representation of the object.
        opaque: String,
    },
    /// Structured value (list or map).
    Json(serde_json::Value),
}

impl ColumnValue {
    /// Creates a text value.
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Creates an opaque value from an object's printable form.
    pub fn opaque(value: impl Into<String>) -> Self {
        Self::Opaque {
            opaque: value.into(),
        }
    }

    /// Returns the printable form of the value.
    ///
    /// This is the text used for string literals and for placeholder
    /// detection. Booleans print as `True`/`False` for the latter; the
    /// literal renderer maps them to `1`/`0` before this is consulted.
    pub fn printable(&self) -> String {
        match self {
            Self::Boolean(true) => "True".to_string(),
            Self::Boolean(false) => "False".to_string(),
            Self::Integer(i) => i.to_string(),
            Self::Float(f) => format_float(*f),
            Self::Text(s) => s.clone(),
            Self::Opaque { opaque } => opaque.clone(),
            Self::Json(v) => v.to_string(),
        }
    }
}

impl From<&str> for ColumnValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ColumnValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for ColumnValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for ColumnValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for ColumnValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for ColumnValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<serde_json::Value> for ColumnValue {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

/// Floats always keep a decimal point so `0.0` does not read as an integer.
fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

/// SQL column type emitted into `CREATE TABLE`.
///
/// # Examples
///
/// ```
/// use sqlforge_core::SqlType;
///
/// assert_eq!(SqlType::Boolean.to_string(), "BOOLEAN");
/// assert!(SqlType::Integer.is_numeric());
/// assert!(!SqlType::Json.is_numeric());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SqlType {
    /// `TEXT`, also the fallback for unrecognized values.
    Text,
    /// `BOOLEAN`
    Boolean,
    /// `NUMERIC`, used for floating point values.
    Numeric,
    /// `INTEGER`
    Integer,
    /// `JSON`, forced for columns listed as JSON columns.
    Json,
}

impl SqlType {
    /// Returns the SQL keyword for this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Boolean => "BOOLEAN",
            Self::Numeric => "NUMERIC",
            Self::Integer => "INTEGER",
            Self::Json => "JSON",
        }
    }

    /// Returns `true` for types whose literals are emitted unquoted.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::Numeric)
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared column and its representative default value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDecl {
    /// Column name. For grouped columns this is the group prefix.
    pub name: String,
    /// Representative default value.
    pub default: ColumnValue,
}

impl ColumnDecl {
    /// Creates a column declaration.
    pub fn new(name: impl Into<String>, default: impl Into<ColumnValue>) -> Self {
        Self {
            name: name.into(),
            default: default.into(),
        }
    }
}

/// Single-column primary key.
///
/// Composite keys are not supported. A declaration file may spell the key
/// as a bare column name, as `{column: id, type: TEXT}`, or as a list; a
/// list with more than one entry is rejected when parsed.
///
/// # Examples
///
/// ```
/// use sqlforge_core::PrimaryKey;
///
/// let pk: PrimaryKey = serde_json::from_str(r#""id""#).unwrap();
/// assert_eq!(pk.column, "id");
///
/// let err = serde_json::from_str::<PrimaryKey>(r#"["a", "b"]"#);
/// assert!(err.is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PrimaryKeyRepr")]
pub struct PrimaryKey {
    /// Key column name.
    pub column: String,
    /// Optional type hint overriding the inferred column type.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub sql_type: Option<SqlType>,
}

impl PrimaryKey {
    /// Creates a primary key on `column` with an inferred type.
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            sql_type: None,
        }
    }

    /// Sets the type hint for the key column.
    pub fn with_type(mut self, sql_type: SqlType) -> Self {
        self.sql_type = Some(sql_type);
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PrimaryKeyRepr {
    Column(String),
    Spec {
        column: String,
        #[serde(rename = "type", default)]
        sql_type: Option<SqlType>,
    },
    Columns(Vec<String>),
}

impl TryFrom<PrimaryKeyRepr> for PrimaryKey {
    type Error = ValidationError;

    fn try_from(repr: PrimaryKeyRepr) -> Result<Self, Self::Error> {
        match repr {
            PrimaryKeyRepr::Column(column) => Ok(Self::new(column)),
            PrimaryKeyRepr::Spec { column, sql_type } => Ok(Self { column, sql_type }),
            PrimaryKeyRepr::Columns(mut columns) => match columns.len() {
                1 => Ok(Self::new(columns.remove(0))),
                0 => Err(ValidationError::EmptyPrimaryKey),
                _ => Err(ValidationError::CompositePrimaryKey(columns.join(", "))),
            },
        }
    }
}

/// Foreign key rendered with `ON DELETE CASCADE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Local column.
    pub column: String,
    /// Referenced table.
    pub references_table: String,
    /// Referenced column.
    pub references_column: String,
}

impl ForeignKey {
    /// Creates a foreign key from `column` to `table(references)`.
    pub fn new(
        column: impl Into<String>,
        table: impl Into<String>,
        references: impl Into<String>,
    ) -> Self {
        Self {
            column: column.into(),
            references_table: table.into(),
            references_column: references.into(),
        }
    }
}

/// Enumeration-style constraint: the column must hold one of `values`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckConstraint {
    /// Constrained column.
    pub column: String,
    /// Allowed literal values.
    pub values: Vec<ColumnValue>,
}

impl CheckConstraint {
    /// Creates a check constraint.
    pub fn new<V: Into<ColumnValue>>(
        column: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// One field of a [`ColumnGroup`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupField {
    /// Field name; the physical column is `{prefix}_{name}`.
    pub name: String,
    /// Representative default value.
    pub default: ColumnValue,
}

/// A composite column flattened into one physical column per field.
///
/// Field order is preserved exactly and becomes the physical column order.
///
/// # Examples
///
/// ```
/// use sqlforge_core::ColumnGroup;
///
/// let pos = ColumnGroup::new("pos").field("x", 0.0).field("y", 0.0);
/// assert_eq!(pos.physical_names(), vec!["pos_x", "pos_y"]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnGroup {
    /// Column-name prefix; matches a declared column.
    pub prefix: String,
    /// Fields in declaration order.
    pub fields: Vec<GroupField>,
}

impl ColumnGroup {
    /// Creates an empty group.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            fields: Vec::new(),
        }
    }

    /// Appends a field.
    pub fn field(mut self, name: impl Into<String>, default: impl Into<ColumnValue>) -> Self {
        self.fields.push(GroupField {
            name: name.into(),
            default: default.into(),
        });
        self
    }

    /// Returns the flattened physical column names.
    pub fn physical_names(&self) -> Vec<String> {
        self.fields
            .iter()
            .map(|f| format!("{}_{}", self.prefix, f.name))
            .collect()
    }
}

/// Structured annotations for one table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConstraintSet {
    /// Primary key; absent tables get no keyed artifacts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<PrimaryKey>,
    /// Foreign keys in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub foreign_keys: Vec<ForeignKey>,
    /// Enumeration checks in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checks: Vec<CheckConstraint>,
    /// Columns whose type is forced to `JSON`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub json_columns: Vec<String>,
    /// Grouped columns.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<ColumnGroup>,
    /// Default ordering for the select artifacts.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<String>,
}

impl ConstraintSet {
    /// Returns `true` if `column` is listed as a JSON column.
    pub fn is_json(&self, column: &str) -> bool {
        self.json_columns.iter().any(|c| c == column)
    }

    /// Returns the group whose prefix is `column`, if any.
    pub fn group(&self, column: &str) -> Option<&ColumnGroup> {
        self.groups.iter().find(|g| g.prefix == column)
    }

    /// Returns the primary-key column name, if declared.
    pub fn primary_key_column(&self) -> Option<&str> {
        self.primary_key.as_ref().map(|pk| pk.column.as_str())
    }
}

/// A column after group resolution.
///
/// Grouped columns are identified by name against
/// [`ConstraintSet::groups`] when the declaration is read, never by
/// inspecting the default value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeclaredColumn<'a> {
    /// An ordinary column.
    Simple(&'a ColumnDecl),
    /// A column flattened into the group's fields.
    Grouped(&'a ColumnGroup),
}

/// A table's logical shape.
///
/// # Examples
///
/// ```
/// use sqlforge_core::{ColumnGroup, PrimaryKey, TableDeclaration};
///
/// let table = TableDeclaration::new("SHIP")
///     .column("id", "")
///     .column("pos", "")
///     .primary_key(PrimaryKey::new("id"))
///     .group(ColumnGroup::new("pos").field("x", 0.0).field("y", 0.0));
///
/// assert_eq!(table.physical_columns(), vec!["id", "pos_x", "pos_y"]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDeclaration {
    /// Table name, unique across the catalog.
    pub name: String,
    /// Columns in declaration order.
    pub columns: Vec<ColumnDecl>,
    /// Constraint set.
    #[serde(default)]
    pub constraints: ConstraintSet,
}

impl TableDeclaration {
    /// Creates a declaration with no columns or constraints.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            constraints: ConstraintSet::default(),
        }
    }

    /// Appends a column.
    pub fn column(mut self, name: impl Into<String>, default: impl Into<ColumnValue>) -> Self {
        self.columns.push(ColumnDecl::new(name, default));
        self
    }

    /// Sets the primary key.
    pub fn primary_key(mut self, key: PrimaryKey) -> Self {
        self.constraints.primary_key = Some(key);
        self
    }

    /// Adds a foreign key.
    pub fn foreign_key(mut self, key: ForeignKey) -> Self {
        self.constraints.foreign_keys.push(key);
        self
    }

    /// Adds an enumeration check.
    pub fn check(mut self, check: CheckConstraint) -> Self {
        self.constraints.checks.push(check);
        self
    }

    /// Marks a column as JSON.
    pub fn json_column(mut self, column: impl Into<String>) -> Self {
        self.constraints.json_columns.push(column.into());
        self
    }

    /// Adds a grouped column definition.
    pub fn group(mut self, group: ColumnGroup) -> Self {
        self.constraints.groups.push(group);
        self
    }

    /// Appends a column to the default ordering.
    pub fn order_by(mut self, column: impl Into<String>) -> Self {
        self.constraints.order_by.push(column.into());
        self
    }

    /// Resolves each declared column to simple or grouped.
    pub fn declared_columns(&self) -> impl Iterator<Item = DeclaredColumn<'_>> {
        self.columns
            .iter()
            .map(|column| match self.constraints.group(&column.name) {
                Some(group) => DeclaredColumn::Grouped(group),
                None => DeclaredColumn::Simple(column),
            })
    }

    /// Returns the physical column names after group flattening.
    pub fn physical_columns(&self) -> Vec<String> {
        let mut names = Vec::new();
        for column in self.declared_columns() {
            match column {
                DeclaredColumn::Simple(c) => names.push(c.name.clone()),
                DeclaredColumn::Grouped(g) => names.extend(g.physical_names()),
            }
        }
        names
    }
}
