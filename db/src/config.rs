//! Store configuration.
//!
//! Defines the YAML-serializable configuration naming the store file, the
//! declaration directory, where compiled artifacts live, and how backups
//! are taken.
//!
//! # Example YAML
//!
//! ```yaml
//! database: data/main.db
//! declarations: schema/
//! artifacts:
//!   root: artifacts/
//!   ddl_dir: ddl
//!   dml_dir: dml
//! backup:
//!   backup_path: data/main.db.bak
//!   archive_dir: data/archive
//!   log_table: BACKUP_LOG
//!   label: manual
//! ```
//!
//! Every section is optional; missing fields take their defaults.

use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Where compiled artifacts are written.
///
/// # Examples
///
/// ```
/// # use sqlforge_db::ArtifactsConfig;
/// let a = ArtifactsConfig::default();
/// assert_eq!(a.ddl_path(), std::path::Path::new("artifacts/ddl"));
/// assert_eq!(a.dml_path(), std::path::Path::new("artifacts/dml"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactsConfig {
    /// Root directory of the artifact store; also holds the manifest.
    pub root: PathBuf,
    /// DDL subdirectory, relative to `root`.
    pub ddl_dir: PathBuf,
    /// DML subdirectory, relative to `root`.
    pub dml_dir: PathBuf,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("artifacts"),
            ddl_dir: PathBuf::from("ddl"),
            dml_dir: PathBuf::from("dml"),
        }
    }
}

impl ArtifactsConfig {
    /// Full path of the DDL directory.
    pub fn ddl_path(&self) -> PathBuf {
        self.root.join(&self.ddl_dir)
    }

    /// Full path of the DML directory.
    pub fn dml_path(&self) -> PathBuf {
        self.root.join(&self.dml_dir)
    }
}

/// Backup, archive and restore settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    /// Destination of `backup` and source of `restore`. Defaults to the
    /// database path with a `.bak` suffix when unset.
    pub backup_path: Option<PathBuf>,
    /// Directory for timestamped archives. Defaults to the database's
    /// own directory when unset.
    pub archive_dir: Option<PathBuf>,
    /// Name of the backup log table.
    pub log_table: String,
    /// Human label written into each log record.
    pub label: String,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            backup_path: None,
            archive_dir: None,
            log_table: "BACKUP_LOG".to_string(),
            label: "manual".to_string(),
        }
    }
}

/// Top-level store configuration.
///
/// Loaded from a YAML file (typically `sqlforge.yml` next to the
/// application) by the CLI and by application code.
///
/// # Examples
///
/// ```no_run
/// use sqlforge_db::StoreConfig;
///
/// let config = StoreConfig::load("sqlforge.yml").unwrap();
/// println!("store file: {}", config.database.display());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path of the SQLite store file.
    pub database: PathBuf,
    /// Directory of table declaration files.
    pub declarations: PathBuf,
    /// Artifact store layout.
    pub artifacts: ArtifactsConfig,
    /// Backup settings.
    pub backup: BackupConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("data/main.db"),
            declarations: PathBuf::from("schema"),
            artifacts: ArtifactsConfig::default(),
            backup: BackupConfig::default(),
        }
    }
}

impl StoreConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::StoreError::IoError) if the file cannot
    /// be read, or [`YamlError`](crate::StoreError::YamlError) if parsing
    /// fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::StoreError::IoError) if the file cannot
    /// be written, or [`YamlError`](crate::StoreError::YamlError) if
    /// serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Rebases every relative path onto `base`.
    ///
    /// Used when a config file refers to paths relative to its own
    /// location.
    pub fn rebase(mut self, base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        let rebase = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        rebase(&mut self.database);
        rebase(&mut self.declarations);
        rebase(&mut self.artifacts.root);
        if let Some(p) = self.backup.backup_path.as_mut() {
            rebase(p);
        }
        if let Some(p) = self.backup.archive_dir.as_mut() {
            rebase(p);
        }
        self
    }

    /// Returns the backup destination, defaulting to `{database}.bak`.
    pub fn backup_path(&self) -> PathBuf {
        self.backup.backup_path.clone().unwrap_or_else(|| {
            let mut name = self.database.clone().into_os_string();
            name.push(".bak");
            PathBuf::from(name)
        })
    }
}
