//! Artifact storage, declaration loading and store configuration.
//!
//! This crate sits between the pure compiler in `sqlforge-core` and the
//! SQLite runtime. It persists compiled statements as named files, keeps a
//! checksummed manifest of what was compiled, loads table declarations
//! from YAML or JSON, and reads the store configuration.
//!
//! # Quick start
//!
//! ```no_run
//! use sqlforge_db::{ArtifactManifest, ArtifactStore, DeclarationCatalog, StoreConfig};
//!
//! let config = StoreConfig::load("sqlforge.yml").unwrap();
//! let catalog = DeclarationCatalog::from_dir(&config.declarations).unwrap();
//! let store = ArtifactStore::from_config(&config.artifacts);
//!
//! let mut manifest = ArtifactManifest::new(env!("CARGO_PKG_VERSION"));
//! for compiled in catalog.compile_all().unwrap() {
//!     store.persist_table(&compiled).unwrap();
//!     manifest.record(&compiled);
//! }
//! manifest.save(config.artifacts.root.join("manifest.json")).unwrap();
//! ```

mod artifacts;
mod catalog;
mod config;
mod error;
mod manifest;

pub use artifacts::ArtifactStore;
pub use catalog::{CatalogSource, DeclarationCatalog};
pub use config::{ArtifactsConfig, BackupConfig, StoreConfig};
pub use error::{Result, StoreError};
pub use manifest::{ArtifactDrift, ArtifactManifest, MANIFEST_FILE, TableEntry, checksum};
