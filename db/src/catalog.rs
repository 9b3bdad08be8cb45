//! Table declaration catalog loading.
//!
//! Provides [`DeclarationCatalog`], the ordered set of
//! [`TableDeclaration`]s an application authors. Declarations are read
//! from YAML or JSON files; a file holds either one declaration or a list.
//!
//! # Loading patterns
//!
//! ```no_run
//! use sqlforge_db::DeclarationCatalog;
//!
//! // Every *.yaml, *.yml and *.json file in a directory
//! let catalog = DeclarationCatalog::from_dir("schema/").unwrap();
//! for table in catalog.iter() {
//!     println!("{} ({} columns)", table.name, table.columns.len());
//! }
//!
//! // A single file
//! let catalog = DeclarationCatalog::from_file("schema/world.yaml").unwrap();
//! assert!(catalog.get("PLANET").is_some());
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use sqlforge_core::{CompiledTable, TableDeclaration, compile_table};

use crate::error::{Result, StoreError};

#[derive(Deserialize)]
#[serde(untagged)]
enum DeclarationFile {
    Many(Vec<TableDeclaration>),
    One(Box<TableDeclaration>),
}

/// Describes where a [`DeclarationCatalog`] was loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    /// Loaded from a directory of declaration files.
    Directory(PathBuf),
    /// Loaded from a single file.
    File(PathBuf),
    /// Built in code.
    InMemory,
}

/// Ordered collection of table declarations with unique names.
///
/// Order is load order: files sorted by name, then declaration order
/// within each file. Creation runs in this order and drops run in reverse.
#[derive(Debug, Clone)]
pub struct DeclarationCatalog {
    tables: Vec<TableDeclaration>,
    source: CatalogSource,
}

impl DeclarationCatalog {
    /// Builds a catalog from declarations constructed in code.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateTable`] if two declarations share a
    /// name.
    ///
    /// # Examples
    ///
    /// ```
    /// use sqlforge_core::TableDeclaration;
    /// use sqlforge_db::DeclarationCatalog;
    ///
    /// let catalog = DeclarationCatalog::from_declarations(vec![
    ///     TableDeclaration::new("A").column("id", ""),
    ///     TableDeclaration::new("B").column("id", ""),
    /// ])
    /// .unwrap();
    /// assert_eq!(catalog.len(), 2);
    ///
    /// assert!(DeclarationCatalog::from_declarations(vec![
    ///     TableDeclaration::new("A").column("id", ""),
    ///     TableDeclaration::new("A").column("id", ""),
    /// ])
    /// .is_err());
    /// ```
    pub fn from_declarations(tables: Vec<TableDeclaration>) -> Result<Self> {
        let mut catalog = Self {
            tables: Vec::with_capacity(tables.len()),
            source: CatalogSource::InMemory,
        };
        for table in tables {
            catalog.insert(table)?;
        }
        Ok(catalog)
    }

    /// Loads every `*.yaml`, `*.yml` and `*.json` file in `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::IoError`] if the directory cannot be read,
    /// [`StoreError::InvalidDeclaration`] if a file does not parse, or
    /// [`StoreError::DuplicateTable`] on name collisions.
    pub fn from_dir(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut files = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let file_path = entry?.path();
            if is_declaration_file(&file_path) {
                files.push(file_path);
            }
        }
        files.sort();

        let mut catalog = Self {
            tables: Vec::new(),
            source: CatalogSource::Directory(path.to_path_buf()),
        };
        for file in &files {
            for table in read_file(file)? {
                catalog.insert(table)?;
            }
        }
        Ok(catalog)
    }

    /// Loads a single declaration file.
    ///
    /// # Errors
    ///
    /// Same as [`from_dir`](Self::from_dir).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut catalog = Self {
            tables: Vec::new(),
            source: CatalogSource::File(path.to_path_buf()),
        };
        for table in read_file(path)? {
            catalog.insert(table)?;
        }
        Ok(catalog)
    }

    /// Appends a declaration.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateTable`] if the name is taken.
    pub fn insert(&mut self, table: TableDeclaration) -> Result<()> {
        if self.contains(&table.name) {
            return Err(StoreError::DuplicateTable(table.name));
        }
        self.tables.push(table);
        Ok(())
    }

    /// Returns the declaration named `table`.
    pub fn get(&self, table: &str) -> Option<&TableDeclaration> {
        self.tables.iter().find(|t| t.name == table)
    }

    /// Returns `true` if `table` is declared.
    pub fn contains(&self, table: &str) -> bool {
        self.get(table).is_some()
    }

    /// Iterates declarations in load order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &TableDeclaration> {
        self.tables.iter()
    }

    /// Iterates table names in load order.
    pub fn names(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.tables.iter().map(|t| t.name.as_str())
    }

    /// Number of declarations.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns `true` if no declarations were loaded.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Where this catalog was loaded from.
    pub fn source(&self) -> &CatalogSource {
        &self.source
    }

    /// Compiles every declaration, in order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::CompileError`] for the first invalid
    /// declaration.
    pub fn compile_all(&self) -> Result<Vec<CompiledTable>> {
        self.tables
            .iter()
            .map(|t| compile_table(t).map_err(StoreError::from))
            .collect()
    }
}

fn is_declaration_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml" | "json")
    )
}

fn read_file(path: &Path) -> Result<Vec<TableDeclaration>> {
    let text = std::fs::read_to_string(path)?;
    let is_json = path.extension().and_then(|e| e.to_str()) == Some("json");
    let parsed: std::result::Result<DeclarationFile, String> = if is_json {
        serde_json::from_str(&text).map_err(|e| e.to_string())
    } else {
        serde_yaml::from_str(&text).map_err(|e| e.to_string())
    };
    match parsed {
        Ok(DeclarationFile::Many(tables)) => Ok(tables),
        Ok(DeclarationFile::One(table)) => Ok(vec![*table]),
        Err(message) => Err(StoreError::InvalidDeclaration {
            path: path.to_path_buf(),
            message,
        }),
    }
}
