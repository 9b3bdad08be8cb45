//! Manifest of compiled artifacts.
//!
//! The manifest records, per table, the authoritative physical column
//! order, the primary-key column, and a SHA-256 checksum of every artifact
//! written for it. It lets tooling answer "which column order does
//! `INSERT_SHIP` expect?" without parsing SQL, and detect artifacts that
//! were hand-edited or deleted since the last compile.
//!
//! # Examples
//!
//! ```no_run
//! use sqlforge_core::{PrimaryKey, TableDeclaration, compile_table};
//! use sqlforge_db::{ArtifactManifest, ArtifactStore};
//!
//! let store = ArtifactStore::new("artifacts/ddl", "artifacts/dml");
//! let compiled = compile_table(
//!     &TableDeclaration::new("WIDGET").column("id", "").primary_key(PrimaryKey::new("id")),
//! )
//! .unwrap();
//! store.persist_table(&compiled).unwrap();
//!
//! let mut manifest = ArtifactManifest::new(env!("CARGO_PKG_VERSION"));
//! manifest.record(&compiled);
//! manifest.save("artifacts/manifest.json").unwrap();
//!
//! assert!(manifest.verify(&store).unwrap().is_empty());
//! ```

use std::collections::BTreeMap;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlforge_core::CompiledTable;

use crate::artifacts::ArtifactStore;
use crate::error::{Result, StoreError};

/// Manifest file name inside the artifact root.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Per-table record in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableEntry {
    /// Authoritative physical column order.
    pub columns: Vec<String>,
    /// Primary-key column, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<String>,
    /// SHA-256 hex digest of each artifact, keyed by artifact name.
    pub artifacts: BTreeMap<String, String>,
    /// RFC 3339 timestamp of the compile that produced this entry.
    pub compiled_at: String,
}

/// Why an artifact failed verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactDrift {
    /// The artifact file no longer exists.
    Missing(String),
    /// The artifact's content differs from the recorded checksum.
    Modified(String),
}

/// Top-level manifest of compiled tables.
///
/// Persisted as pretty-printed JSON at the artifact store root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    /// Manifest format version.
    pub version: String,
    /// Version of the tool that compiled the artifacts.
    pub tool_version: String,
    /// RFC 3339 timestamp of the last update.
    pub updated_at: String,
    /// Per-table entries keyed by table name.
    pub tables: BTreeMap<String, TableEntry>,
}

impl ArtifactManifest {
    /// Creates an empty manifest.
    pub fn new(tool_version: impl Into<String>) -> Self {
        Self {
            version: "1.0".to_string(),
            tool_version: tool_version.into(),
            updated_at: now_rfc3339(),
            tables: BTreeMap::new(),
        }
    }

    /// Loads a manifest from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::StoreError::IoError) if the file cannot
    /// be read, or [`JsonError`](crate::StoreError::JsonError) if the
    /// content is not valid manifest JSON.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let manifest = serde_json::from_reader(reader)?;
        Ok(manifest)
    }

    /// Loads the manifest at `path`, or starts an empty one if absent.
    pub fn load_or_new(path: impl AsRef<Path>, tool_version: &str) -> Result<Self> {
        match Self::load(path) {
            Ok(manifest) => Ok(manifest),
            Err(StoreError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::new(tool_version))
            }
            Err(e) => Err(e),
        }
    }

    /// Saves the manifest as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Records (or replaces) the entry for a compiled table.
    pub fn record(&mut self, compiled: &CompiledTable) {
        let now = now_rfc3339();
        let artifacts = compiled
            .artifacts
            .iter()
            .map(|a| (a.name(), checksum(a.sql.as_bytes())))
            .collect();
        self.tables.insert(
            compiled.table.clone(),
            TableEntry {
                columns: compiled.columns.clone(),
                primary_key: compiled.primary_key.clone(),
                artifacts,
                compiled_at: now.clone(),
            },
        );
        self.updated_at = now;
    }

    /// Removes a table's entry.
    pub fn forget(&mut self, table: &str) -> Option<TableEntry> {
        self.tables.remove(table)
    }

    /// Returns the entry for `table`.
    pub fn get(&self, table: &str) -> Option<&TableEntry> {
        self.tables.get(table)
    }

    /// Returns `true` if `table` has an entry.
    pub fn contains(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    /// Checks every recorded artifact against the store.
    ///
    /// Returns the drifted artifacts; an empty vector means the store
    /// matches the manifest.
    pub fn verify(&self, store: &ArtifactStore) -> Result<Vec<ArtifactDrift>> {
        let mut drift = Vec::new();
        for entry in self.tables.values() {
            for (name, expected) in &entry.artifacts {
                match store.load(name) {
                    Ok(sql) => {
                        if checksum(sql.as_bytes()) != *expected {
                            drift.push(ArtifactDrift::Modified(name.clone()));
                        }
                    }
                    Err(StoreError::EmptyArtifact(_)) => {
                        drift.push(ArtifactDrift::Missing(name.clone()));
                    }
                    Err(e) => return Err(e),
                }
            }
        }
        Ok(drift)
    }
}

/// SHA-256 hex digest of `bytes`.
pub fn checksum(bytes: &[u8]) -> String {
    let hash = Sha256::digest(bytes);
    hash.iter().map(|b| format!("{b:02x}")).collect()
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
