use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};
use rusqlite::Connection;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::error::Error;
use crate::record::Record;

use super::builders::RegisterBuilder;
use super::transaction::Session;

struct DatabaseInner {
    /// The single connection; a session holds the lock for its lifetime.
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
    /// How long to wait for the connection before giving up.
    lock_timeout: Duration,
}

/// The main database handle.
///
/// `Database` is cheaply clonable (`Arc`-based). All work happens through a
/// [`Session`], of which at most one exists at a time.
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

impl Database {
    /// Open (or create) a database file with default settings.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        Self::open_with(path, &DatabaseConfig::default())
    }

    /// Open (or create) a database file, creating missing parent directories.
    pub fn open_with(path: impl AsRef<Path>, config: &DatabaseConfig) -> Result<Self, Error> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        config.apply(&conn)?;
        info!(path = %path.display(), "opened database");

        Ok(Self::from_connection(conn, Some(path.to_path_buf()), config))
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, Error> {
        let config = DatabaseConfig::default();
        let conn = Connection::open_in_memory()?;
        config.apply(&conn)?;
        Ok(Self::from_connection(conn, None, &config))
    }

    fn from_connection(conn: Connection, path: Option<PathBuf>, config: &DatabaseConfig) -> Self {
        Self {
            inner: Arc::new(DatabaseInner {
                conn: Mutex::new(conn),
                path,
                lock_timeout: Duration::from_millis(config.busy_timeout_ms),
            }),
        }
    }

    /// Take the connection, waiting at most the configured busy timeout.
    ///
    /// A session kept alive on the calling thread would otherwise block this
    /// thread forever; it surfaces as [`Error::Busy`] instead.
    fn lock(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.inner
            .conn
            .try_lock_for(self.inner.lock_timeout)
            .ok_or_else(|| Error::Busy {
                waited_ms: u64::try_from(self.inner.lock_timeout.as_millis()).unwrap_or(u64::MAX),
            })
    }

    /// Path of the database file; `None` for in-memory databases.
    pub fn path(&self) -> Option<&Path> {
        self.inner.path.as_deref()
    }

    /// Lock the connection and open a session on it.
    ///
    /// Waits up to the configured busy timeout while another session is
    /// alive, then fails with [`Error::Busy`]. The same holds for every
    /// other method that touches the connection.
    pub fn session(&self) -> Result<Session<'_>, Error> {
        Session::begin(self.lock()?)
    }

    /// Execute a unit of work in its own session.
    ///
    /// If the closure returns `Ok`, the work is committed. If it returns
    /// `Err`, everything it wrote is discarded.
    pub fn transact<F, R>(&self, f: F) -> Result<R, Error>
    where
        F: FnOnce(&mut Session<'_>) -> Result<R, Error>,
    {
        let mut session = self.session()?;
        let value = f(&mut session)?;
        session.commit()?;
        Ok(value)
    }

    /// Register a record type: derive its schema and create its table.
    pub fn register<T: Record>(&self) -> RegisterBuilder<'_, T> {
        RegisterBuilder::new(self)
    }

    /// Names of every table in the database, sorted.
    pub fn list_tables(&self) -> Result<Vec<String>, Error> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
             ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    /// Names of every index on `table`, sorted.
    pub fn list_indexes(&self, table: &str) -> Result<Vec<String>, Error> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'index' AND tbl_name = ?1 \
             AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )?;
        let names = stmt
            .query_map([table], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }
}
