//! Compiled statements and their naming convention.
//!
//! Every table compiles to a set of [`CompiledArtifact`]s, one per
//! [`Verb`], named `{VERB}_{TABLE}`. CREATE and DROP are DDL; the rest are
//! DML with `?` positional placeholders.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Statement kind of an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verb {
    /// `CREATE TABLE IF NOT EXISTS`
    Create,
    /// `DROP TABLE IF EXISTS`
    Drop,
    /// `INSERT INTO`
    Insert,
    /// `SELECT` of every row.
    SelectAll,
    /// `SELECT` filtered by primary key.
    SelectByPk,
    /// `UPDATE` by primary key.
    Update,
    /// `DELETE` by primary key.
    Delete,
}

impl Verb {
    /// All verbs in compilation order.
    pub const ALL: [Verb; 7] = [
        Verb::Create,
        Verb::Drop,
        Verb::Insert,
        Verb::SelectAll,
        Verb::SelectByPk,
        Verb::Update,
        Verb::Delete,
    ];

    /// Returns the name used in artifact names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Drop => "DROP",
            Self::Insert => "INSERT",
            Self::SelectAll => "SELECT_ALL",
            Self::SelectByPk => "SELECT_BY_PK",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }

    /// Returns `true` for data-definition verbs.
    pub fn is_ddl(&self) -> bool {
        matches!(self, Self::Create | Self::Drop)
    }

    /// Returns `true` for verbs that need a primary key.
    pub fn is_keyed(&self) -> bool {
        matches!(self, Self::SelectByPk | Self::Update | Self::Delete)
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        Verb::ALL
            .into_iter()
            .find(|v| v.as_str() == upper)
            .ok_or_else(|| format!("unknown verb: {s}"))
    }
}

/// Returns the artifact name for `verb` on `table`.
///
/// # Examples
///
/// ```
/// use sqlforge_core::{Verb, artifact_name};
///
/// assert_eq!(artifact_name(Verb::SelectByPk, "WIDGET"), "SELECT_BY_PK_WIDGET");
/// ```
pub fn artifact_name(verb: Verb, table: &str) -> String {
    format!("{}_{}", verb.as_str(), table)
}

/// Splits an artifact name back into verb and table.
pub fn parse_artifact_name(name: &str) -> Option<(Verb, &str)> {
    Verb::ALL.into_iter().find_map(|verb| {
        name.strip_prefix(verb.as_str())
            .and_then(|rest| rest.strip_prefix('_'))
            .filter(|table| !table.is_empty())
            .map(|table| (verb, table))
    })
}

/// One generated statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledArtifact {
    /// Table the statement targets.
    pub table: String,
    /// Statement kind.
    pub verb: Verb,
    /// Statement text.
    pub sql: String,
}

impl CompiledArtifact {
    /// Creates an artifact.
    pub fn new(table: impl Into<String>, verb: Verb, sql: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            verb,
            sql: sql.into(),
        }
    }

    /// Returns the artifact name, `{VERB}_{TABLE}`.
    pub fn name(&self) -> String {
        artifact_name(self.verb, &self.table)
    }
}

/// Every artifact compiled for one table, plus its column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledTable {
    /// Table name.
    pub table: String,
    /// Authoritative physical column order.
    pub columns: Vec<String>,
    /// Primary-key column, if any.
    pub primary_key: Option<String>,
    /// Compiled statements.
    pub artifacts: Vec<CompiledArtifact>,
}

impl CompiledTable {
    /// Returns the artifact for `verb`, if compiled.
    pub fn artifact(&self, verb: Verb) -> Option<&CompiledArtifact> {
        self.artifacts.iter().find(|a| a.verb == verb)
    }

    /// Returns the columns in `UPDATE ... SET` order (all but the key).
    pub fn update_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .map(String::as_str)
            .filter(|c| Some(*c) != self.primary_key.as_deref())
            .collect()
    }
}
