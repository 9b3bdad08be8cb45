//! Scoped SQLite connections.
//!
//! A [`Connector`] knows the store path; every runner operation acquires a
//! fresh [`ScopedConnection`] from it, does one unit of work, and releases
//! it. Release happens on drop as well, so error paths never leak a handle.

use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags};
use tracing::{debug, warn};

use crate::error::Result;

/// Opens connections to one store file.
#[derive(Debug, Clone)]
pub struct Connector {
    path: PathBuf,
}

impl Connector {
    /// Creates a connector for the store at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens a connection, creating the store file (and its directory) if
    /// absent, and sets the foreign-key pragma.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::Io`](crate::SqliteError::Io) if the directory
    /// cannot be created, or [`SqliteError::Database`](crate::SqliteError::Database)
    /// if the file cannot be opened or the pragma fails.
    pub fn connect(&self, enforce_foreign_keys: bool) -> Result<ScopedConnection> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&self.path)?;
        ScopedConnection::configure(conn, &self.path, enforce_foreign_keys)
    }

    /// Opens a connection only if the store file already exists.
    ///
    /// Returns `Ok(None)` for a missing file instead of creating one.
    pub fn connect_existing(&self, enforce_foreign_keys: bool) -> Result<Option<ScopedConnection>> {
        if !self.path.is_file() {
            return Ok(None);
        }
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&self.path, flags)?;
        ScopedConnection::configure(conn, &self.path, enforce_foreign_keys).map(Some)
    }
}

/// A connection held for exactly one unit of work.
///
/// Dereferences to [`rusqlite::Connection`].
#[derive(Debug)]
pub struct ScopedConnection {
    conn: Connection,
    path: PathBuf,
}

impl ScopedConnection {
    fn configure(conn: Connection, path: &Path, enforce_foreign_keys: bool) -> Result<Self> {
        let state = if enforce_foreign_keys { "ON" } else { "OFF" };
        conn.execute_batch(&format!("PRAGMA foreign_keys = {state};"))?;
        debug!(path = %path.display(), foreign_keys = enforce_foreign_keys, "connected");
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// Returns whether the foreign-key pragma is on.
    pub fn foreign_keys_enabled(&self) -> Result<bool> {
        let enabled: i64 = self
            .conn
            .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))?;
        Ok(enabled == 1)
    }

    /// Closes the connection.
    ///
    /// A failed close is logged and the handle is dropped anyway.
    pub fn disconnect(self) {
        let path = self.path;
        match self.conn.close() {
            Ok(()) => debug!(path = %path.display(), "disconnected"),
            Err((_conn, e)) => {
                warn!(path = %path.display(), error = %e, "close failed; dropping handle");
            }
        }
    }
}

impl Deref for ScopedConnection {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.conn
    }
}

impl DerefMut for ScopedConnection {
    fn deref_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}

/// Checks `sqlite_master` for a table named `table`.
pub fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let mut stmt =
        conn.prepare("SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1")?;
    let count: i64 = stmt.query_row([table], |row| row.get(0))?;
    Ok(count > 0)
}
