//! Sessions and scoped transactions.
//!
//! A [`Session`] owns the database connection for as long as it lives and
//! always has a root transaction open. Every read and write goes through the
//! session, so it always targets the innermost open scope.
//!
//! Scopes nest as SQLite savepoints:
//!
//! - leaving a scope successfully releases its savepoint and commits the
//!   connection, at any depth, unless the scope was opened with
//!   [`ScopeOptions::no_commit`]. Scopes still open around it are reopened
//!   as fresh savepoints, so a later error in an outer scope only rolls back
//!   what was written after that commit;
//! - leaving a scope with an error rolls its writes back and commits nothing,
//!   unless the scope was opened with [`ScopeOptions::commit_on_error`], in
//!   which case the error path behaves like the success path.

use std::cell::Cell;
use std::fmt::Write as _;

use parking_lot::MutexGuard;
use rusqlite::{Connection, params_from_iter};
use tracing::{debug, warn};

use crate::encoding::{self, Value};
use crate::error::{Error, RecordError};
use crate::record::{self, Record};

use super::builders::{self, QueryBuilder};
use super::filter::Filters;
use super::update::Patch;

/// How a scope behaves when it is left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeOptions {
    /// Commit the connection when the scope is left.
    pub commit: bool,
    /// Keep (and, if `commit` is set, commit) the scope's writes even when
    /// the scope returns an error.
    pub commit_on_error: bool,
}

impl Default for ScopeOptions {
    fn default() -> Self {
        Self {
            commit: true,
            commit_on_error: false,
        }
    }
}

impl ScopeOptions {
    /// Leave writes pending in the enclosing scope on exit.
    pub fn no_commit() -> Self {
        Self {
            commit: false,
            ..Self::default()
        }
    }

    pub fn commit_on_error(mut self) -> Self {
        self.commit_on_error = true;
        self
    }
}

/// An exclusive handle to the database connection with a stack of open
/// scopes.
///
/// Dropping a session rolls back whatever its root transaction has not
/// committed.
pub struct Session<'db> {
    conn: MutexGuard<'db, Connection>,
    depth: usize,
    /// Whether anything was written since the last commit or rollback.
    dirty: Cell<bool>,
}

impl<'db> Session<'db> {
    pub(crate) fn begin(conn: MutexGuard<'db, Connection>) -> Result<Self, Error> {
        conn.execute_batch("BEGIN DEFERRED")?;
        Ok(Self {
            conn,
            depth: 0,
            dirty: Cell::new(false),
        })
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Number of open scopes; 0 outside any scope.
    pub fn depth(&self) -> usize {
        self.depth
    }

    // -----------------------------------------------------------------------
    // Scopes
    // -----------------------------------------------------------------------

    /// Run `f` in a nested scope with default options.
    pub fn scope<T, F>(&mut self, f: F) -> Result<T, Error>
    where
        F: FnOnce(&mut Session<'db>) -> Result<T, Error>,
    {
        self.scope_with(ScopeOptions::default(), f)
    }

    /// Run `f` in a nested scope.
    ///
    /// The error returned by `f` is returned unchanged; failures while
    /// rolling the scope back are logged.
    pub fn scope_with<T, F>(&mut self, options: ScopeOptions, f: F) -> Result<T, Error>
    where
        F: FnOnce(&mut Session<'db>) -> Result<T, Error>,
    {
        self.depth += 1;
        let savepoint = savepoint_name(self.depth);
        if let Err(e) = self.conn.execute_batch(&format!("SAVEPOINT {savepoint}")) {
            self.depth -= 1;
            return Err(e.into());
        }
        debug!(depth = self.depth, "entered scope");

        let result = f(self);
        let keep = result.is_ok() || options.commit_on_error;

        let exit = if keep {
            self.conn.execute_batch(&format!("RELEASE {savepoint}"))
        } else {
            self.conn
                .execute_batch(&format!("ROLLBACK TO {savepoint}; RELEASE {savepoint}"))
        };
        debug!(depth = self.depth, kept = keep, "left scope");
        self.depth -= 1;

        let commit = keep && options.commit;
        let exit = exit.map_err(Error::from).and_then(|()| {
            if commit {
                self.commit_root()
            } else {
                Ok(())
            }
        });

        match (result, exit) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(exit_err)) => {
                warn!(error = %exit_err, "failed to leave scope after an error");
                Err(e)
            }
        }
    }

    /// Commit everything written so far.
    ///
    /// Inside a scope the open scopes stay open; rolling one of them back
    /// afterwards only discards writes made after this commit.
    pub fn commit(&mut self) -> Result<(), Error> {
        self.commit_root()
    }

    /// Discard uncommitted writes.
    ///
    /// Inside a scope this discards only the innermost scope's writes so far;
    /// the scope stays open.
    pub fn rollback(&mut self) -> Result<(), Error> {
        if self.depth > 0 {
            let savepoint = savepoint_name(self.depth);
            self.conn
                .execute_batch(&format!("ROLLBACK TO {savepoint}"))?;
            return Ok(());
        }
        self.conn.execute_batch("ROLLBACK; BEGIN DEFERRED")?;
        self.dirty.set(false);
        debug!("rolled back");
        Ok(())
    }

    /// COMMIT closes every savepoint, so the scopes still open are reopened.
    fn commit_root(&mut self) -> Result<(), Error> {
        let mut batch = String::from("COMMIT; BEGIN DEFERRED;");
        for depth in 1..=self.depth {
            let _ = write!(batch, " SAVEPOINT {};", savepoint_name(depth));
        }
        self.conn.execute_batch(&batch)?;
        self.dirty.set(false);
        debug!(depth = self.depth, "committed");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Schema
    // -----------------------------------------------------------------------

    /// Create `T`'s table and the given indexes if they do not exist.
    pub fn create_table<T: Record>(&self, indexes: &[&str]) -> Result<(), Error> {
        for statement in builders::create_statements::<T>(indexes)? {
            debug!(sql = %statement, "executing DDL");
            self.conn.execute_batch(&statement)?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Start a filtered query over `T`'s table.
    pub fn select<T: Record>(&self) -> QueryBuilder<'_, 'db, T> {
        QueryBuilder::new(self)
    }

    /// The first record matching `filters`, if any.
    pub fn find_by<T: Record>(&self, filters: Filters) -> Result<Option<T>, Error> {
        let mut found = self.select::<T>().filters(filters).limit(1).execute()?;
        Ok(found.pop())
    }

    /// The first record matching `filters`.
    pub fn find<T: Record>(&self, filters: Filters) -> Result<T, Error> {
        match self.find_by(filters)? {
            Some(record) => Ok(record),
            None => Err(RecordError::NotFound {
                table: T::schema()?.table_name().to_string(),
            }
            .into()),
        }
    }

    /// The record whose primary key is `key`.
    pub fn get<T: Record>(&self, key: impl Into<Value>) -> Result<Option<T>, Error> {
        let schema = T::schema()?;
        let key_column = schema.key_column()?.name.clone();
        self.find_by(Filters::new().with(key_column, key.into()))
    }

    /// Every record in `T`'s table.
    pub fn all<T: Record>(&self) -> Result<Vec<T>, Error> {
        self.select::<T>().execute()
    }

    /// Number of records matching `filters`.
    pub fn count<T: Record>(&self, filters: Filters) -> Result<u64, Error> {
        self.select::<T>().filters(filters).count()
    }

    /// Run caller-provided SQL and decode every row as a `T`.
    ///
    /// The statement must select exactly `T`'s flattened columns, in order.
    pub fn fetch_raw<T: Record>(&self, sql: &str, params: &[Value]) -> Result<Vec<T>, Error> {
        let schema = T::schema()?;
        let mut stmt = self.conn.prepare(sql)?;
        let width = stmt.column_count();
        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let values = encoding::row_values(row, width)?;
            records.push(encoding::decode::<T>(&schema, &values)?);
        }
        Ok(records)
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Insert `record`, replacing every column of an existing row with the
    /// same primary key.
    pub fn save<T: Record>(&self, record: &T) -> Result<(), Error> {
        let schema = T::schema()?;
        let sql = builders::upsert_sql(&schema)?;
        let values = encoding::encode(record);
        self.conn
            .prepare_cached(&sql)?
            .execute(params_from_iter(values.iter()))?;
        self.dirty.set(true);
        Ok(())
    }

    /// Delete the row with `record`'s primary key. Returns the number of
    /// rows removed.
    pub fn delete<T: Record>(&self, record: &T) -> Result<usize, Error> {
        let schema = T::schema()?;
        let sql = builders::delete_sql(&schema)?;
        let key = record::primary_key_value(&schema, record)?;
        let removed = self.conn.prepare_cached(&sql)?.execute([key])?;
        self.dirty.set(true);
        Ok(removed)
    }

    /// Apply `patch` to `record`, then save it.
    ///
    /// Unknown attributes are rejected before the record is modified or
    /// anything is written.
    pub fn update<T: Record>(&self, record: &mut T, patch: &Patch) -> Result<(), Error> {
        patch.apply(record)?;
        self.save(record)
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        if self.conn.is_autocommit() {
            return;
        }
        if self.dirty.get() {
            warn!("session dropped with uncommitted writes, rolling back");
        } else {
            debug!("session closed");
        }
        if let Err(e) = self.conn.execute_batch("ROLLBACK") {
            warn!(error = %e, "rollback on drop failed");
        }
    }
}

fn savepoint_name(depth: usize) -> String {
    format!("scope_{depth}")
}
