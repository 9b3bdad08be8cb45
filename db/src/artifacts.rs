//! Filesystem artifact store.
//!
//! Each compiled statement is persisted as one text file named
//! `{VERB}_{TABLE}.sql`. CREATE and DROP go to the DDL directory, every
//! other verb to the DML directory. Persisting a table again overwrites its
//! files; superseded statements are not kept.
//!
//! # Examples
//!
//! ```no_run
//! use sqlforge_core::{PrimaryKey, TableDeclaration, compile_table};
//! use sqlforge_db::ArtifactStore;
//!
//! let store = ArtifactStore::new("artifacts/ddl", "artifacts/dml");
//! let widget = TableDeclaration::new("WIDGET")
//!     .column("id", "")
//!     .primary_key(PrimaryKey::new("id"));
//!
//! store.persist_table(&compile_table(&widget).unwrap()).unwrap();
//! let sql = store.load("INSERT_WIDGET").unwrap();
//! assert_eq!(sql, "INSERT INTO WIDGET (id) VALUES (?);");
//! ```

use std::path::{Path, PathBuf};

use sqlforge_core::{CompiledArtifact, CompiledTable, Verb, artifact_name, parse_artifact_name};
use tracing::debug;

use crate::config::ArtifactsConfig;
use crate::error::{Result, StoreError};

const EXTENSION: &str = "sql";

/// Named, retrievable statement text on disk.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    ddl_dir: PathBuf,
    dml_dir: PathBuf,
}

impl ArtifactStore {
    /// Creates a store over the given DDL and DML directories.
    ///
    /// Directories are created lazily on the first write.
    pub fn new(ddl_dir: impl Into<PathBuf>, dml_dir: impl Into<PathBuf>) -> Self {
        Self {
            ddl_dir: ddl_dir.into(),
            dml_dir: dml_dir.into(),
        }
    }

    /// Creates a store from the artifacts section of the configuration.
    pub fn from_config(config: &ArtifactsConfig) -> Self {
        Self::new(config.ddl_path(), config.dml_path())
    }

    /// DDL directory.
    pub fn ddl_dir(&self) -> &Path {
        &self.ddl_dir
    }

    /// DML directory.
    pub fn dml_dir(&self) -> &Path {
        &self.dml_dir
    }

    /// Returns the file path for an artifact of `verb` on `table`.
    pub fn path_for(&self, verb: Verb, table: &str) -> PathBuf {
        let dir = if verb.is_ddl() {
            &self.ddl_dir
        } else {
            &self.dml_dir
        };
        dir.join(format!("{}.{EXTENSION}", artifact_name(verb, table)))
    }

    /// Resolves an artifact name (e.g. `SELECT_ALL_WIDGET`) to its path.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidArtifactName`] if the name does not
    /// start with a known verb.
    pub fn path_for_name(&self, name: &str) -> Result<PathBuf> {
        let (verb, table) = parse_artifact_name(name)
            .ok_or_else(|| StoreError::InvalidArtifactName(name.to_string()))?;
        Ok(self.path_for(verb, table))
    }

    /// Writes one artifact, overwriting any previous version.
    pub fn persist(&self, artifact: &CompiledArtifact) -> Result<PathBuf> {
        let path = self.path_for(artifact.verb, &artifact.table);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, &artifact.sql)?;
        debug!(artifact = %artifact.name(), path = %path.display(), "persisted artifact");
        Ok(path)
    }

    /// Writes every artifact of a compiled table.
    ///
    /// Stale keyed artifacts from an earlier declaration that had a primary
    /// key are removed so they cannot be executed against the new shape.
    pub fn persist_table(&self, compiled: &CompiledTable) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(compiled.artifacts.len());
        for artifact in &compiled.artifacts {
            written.push(self.persist(artifact)?);
        }
        for verb in Verb::ALL {
            if compiled.artifact(verb).is_none() {
                self.remove(verb, &compiled.table)?;
            }
        }
        Ok(written)
    }

    /// Reads an artifact by name.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::EmptyArtifact`] if the file is missing or
    /// contains only whitespace, and
    /// [`StoreError::InvalidArtifactName`] for malformed names.
    pub fn load(&self, name: &str) -> Result<String> {
        let path = self.path_for_name(name)?;
        let sql = match std::fs::read_to_string(&path) {
            Ok(sql) => sql,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::EmptyArtifact(name.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        if sql.trim().is_empty() {
            return Err(StoreError::EmptyArtifact(name.to_string()));
        }
        Ok(sql)
    }

    /// Reads the artifact of `verb` on `table`.
    pub fn load_verb(&self, verb: Verb, table: &str) -> Result<String> {
        self.load(&artifact_name(verb, table))
    }

    /// Returns `true` if the named artifact exists on disk.
    pub fn contains(&self, name: &str) -> bool {
        self.path_for_name(name).is_ok_and(|p| p.is_file())
    }

    /// Deletes one artifact if present.
    pub fn remove(&self, verb: Verb, table: &str) -> Result<bool> {
        let path = self.path_for(verb, table);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Deletes every artifact of `table`, returning how many were removed.
    pub fn remove_table(&self, table: &str) -> Result<usize> {
        let mut removed = 0;
        for verb in Verb::ALL {
            if self.remove(verb, table)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Lists the names of all stored artifacts, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for dir in [&self.ddl_dir, &self.dml_dir] {
            if !dir.is_dir() {
                continue;
            }
            for entry in std::fs::read_dir(dir)? {
                let path = entry?.path();
                if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                    continue;
                }
                let stem = path.file_stem().and_then(|s| s.to_str());
                if let Some(stem) = stem.filter(|s| parse_artifact_name(s).is_some()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlforge_core::{PrimaryKey, TableDeclaration, compile_table};

    fn store(dir: &Path) -> ArtifactStore {
        ArtifactStore::new(dir.join("ddl"), dir.join("dml"))
    }

    fn widget() -> TableDeclaration {
        TableDeclaration::new("WIDGET")
            .column("id", "")
            .column("label", "")
            .primary_key(PrimaryKey::new("id"))
    }

    #[test]
    fn test_ddl_and_dml_are_split() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        assert_eq!(
            store.path_for(Verb::Create, "WIDGET"),
            dir.path().join("ddl/CREATE_WIDGET.sql")
        );
        assert_eq!(
            store.path_for(Verb::SelectByPk, "WIDGET"),
            dir.path().join("dml/SELECT_BY_PK_WIDGET.sql")
        );
    }

    #[test]
    fn test_persist_and_load_table() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let compiled = compile_table(&widget()).unwrap();

        let written = store.persist_table(&compiled).unwrap();
        assert_eq!(written.len(), 7);
        assert_eq!(
            store.load("DELETE_WIDGET").unwrap(),
            "DELETE FROM WIDGET WHERE id = ?;"
        );
        assert_eq!(
            store.load_verb(Verb::Drop, "WIDGET").unwrap(),
            "DROP TABLE IF EXISTS WIDGET;"
        );
        assert_eq!(store.list().unwrap().len(), 7);
    }

    #[test]
    fn test_missing_artifact_is_empty_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let err = store(dir.path()).load("INSERT_NOPE").unwrap_err();
        assert!(matches!(err, StoreError::EmptyArtifact(name) if name == "INSERT_NOPE"));
    }

    #[test]
    fn test_blank_artifact_is_empty_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        std::fs::create_dir_all(store.dml_dir()).unwrap();
        std::fs::write(store.path_for(Verb::Insert, "T"), "  \n").unwrap();
        assert!(matches!(
            store.load("INSERT_T").unwrap_err(),
            StoreError::EmptyArtifact(_)
        ));
    }

    #[test]
    fn test_invalid_name() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            store(dir.path()).load("MERGE_T").unwrap_err(),
            StoreError::InvalidArtifactName(_)
        ));
    }

    #[test]
    fn test_redeclaring_without_key_removes_keyed_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        store.persist_table(&compile_table(&widget()).unwrap()).unwrap();
        assert!(store.contains("UPDATE_WIDGET"));

        let mut keyless = widget();
        keyless.constraints.primary_key = None;
        store.persist_table(&compile_table(&keyless).unwrap()).unwrap();
        assert!(!store.contains("UPDATE_WIDGET"));
        assert!(!store.contains("SELECT_BY_PK_WIDGET"));
        assert!(store.contains("SELECT_ALL_WIDGET"));
    }

    #[test]
    fn test_remove_table() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        store.persist_table(&compile_table(&widget()).unwrap()).unwrap();
        assert_eq!(store.remove_table("WIDGET").unwrap(), 7);
        assert!(store.list().unwrap().is_empty());
    }
}
