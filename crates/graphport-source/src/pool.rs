//! SQLite connection handling.

use std::path::Path;
use std::sync::Mutex;

use graphport_core::{SourceError, SourceResult};
use rusqlite::{Connection, OpenFlags};

/// A single SQLite connection guarded for shared access.
pub struct SourcePool {
    conn: Mutex<Connection>,
}

impl SourcePool {
    /// Open an existing knowledge base read-only.
    pub fn open(path: &Path) -> SourceResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| SourceError::unavailable(format!("Cannot open {}: {}", path.display(), e)))?;
        Ok(Self::from_connection(conn))
    }

    pub fn in_memory() -> SourceResult<Self> {
        let conn = Connection::open_in_memory().map_err(to_source_error)?;
        conn.pragma_update(None, "foreign_keys", true).map_err(to_source_error)?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self { conn: Mutex::new(conn) }
    }

    pub fn with_conn<T, F>(&self, f: F) -> SourceResult<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|_| SourceError::unavailable("Connection lock poisoned"))?;
        f(&conn).map_err(to_source_error)
    }

    pub fn with_conn_mut<T, F>(&self, f: F) -> SourceResult<T>
    where
        F: FnOnce(&mut Connection) -> SourceResult<T>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| SourceError::unavailable("Connection lock poisoned"))?;
        f(&mut conn)
    }
}

pub(crate) fn to_source_error(err: rusqlite::Error) -> SourceError {
    SourceError::Unavailable(err.to_string())
}
