//! Connection settings applied when a database is opened.

use std::time::Duration;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Error;

/// Controls how often SQLite syncs to disk on commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// Sync on every commit (default). Maximum durability.
    #[default]
    Full,
    /// Sync at critical moments only. Safe with WAL; a power loss may roll
    /// back the last commits.
    Normal,
    /// Never sync. Useful for bulk loads and tests.
    Off,
}

impl SyncMode {
    fn pragma(self) -> &'static str {
        match self {
            SyncMode::Full => "FULL",
            SyncMode::Normal => "NORMAL",
            SyncMode::Off => "OFF",
        }
    }
}

/// SQLite journal mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalMode {
    #[default]
    Wal,
    Delete,
    Memory,
}

impl JournalMode {
    fn pragma(self) -> &'static str {
        match self {
            JournalMode::Wal => "WAL",
            JournalMode::Delete => "DELETE",
            JournalMode::Memory => "MEMORY",
        }
    }
}

/// Settings for [`Database::open_with`](crate::api::Database::open_with).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub sync_mode: SyncMode,
    pub journal_mode: JournalMode,
    /// How long to wait on a locked database before failing, in milliseconds.
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            sync_mode: SyncMode::Full,
            journal_mode: JournalMode::Wal,
            busy_timeout_ms: 5_000,
        }
    }
}

impl DatabaseConfig {
    pub fn sync_mode(mut self, mode: SyncMode) -> Self {
        self.sync_mode = mode;
        self
    }

    pub fn journal_mode(mut self, mode: JournalMode) -> Self {
        self.journal_mode = mode;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub(crate) fn apply(&self, conn: &Connection) -> Result<(), Error> {
        conn.busy_timeout(Duration::from_millis(self.busy_timeout_ms))?;
        // In-memory databases report "memory" whatever mode is requested.
        let journal: String = conn.pragma_update_and_check(
            None,
            "journal_mode",
            self.journal_mode.pragma(),
            |row| row.get(0),
        )?;
        conn.pragma_update(None, "synchronous", self.sync_mode.pragma())?;
        debug!(
            journal_mode = %journal,
            synchronous = self.sync_mode.pragma(),
            busy_timeout_ms = self.busy_timeout_ms,
            "applied connection settings"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DatabaseConfig::default();
        assert_eq!(config.sync_mode, SyncMode::Full);
        assert_eq!(config.journal_mode, JournalMode::Wal);
        assert_eq!(config.busy_timeout_ms, 5_000);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: DatabaseConfig =
            serde_json::from_str(r#"{"sync_mode": "off", "busy_timeout_ms": 250}"#).unwrap();
        assert_eq!(config.sync_mode, SyncMode::Off);
        assert_eq!(config.journal_mode, JournalMode::Wal);
        assert_eq!(config.busy_timeout_ms, 250);
    }

    #[test]
    fn test_apply_to_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let conn = Connection::open(dir.path().join("config.sqlite")).unwrap();
        DatabaseConfig::default()
            .sync_mode(SyncMode::Normal)
            .apply(&conn)
            .unwrap();

        let journal: String = conn
            .pragma_query_value(None, "journal_mode", |row| row.get(0))
            .unwrap();
        assert_eq!(journal, "wal");
        let sync: i64 = conn
            .pragma_query_value(None, "synchronous", |row| row.get(0))
            .unwrap();
        assert_eq!(sync, 1);
    }
}
