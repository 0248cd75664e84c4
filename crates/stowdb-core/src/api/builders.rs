use std::marker::PhantomData;
use std::ops::ControlFlow;

use rusqlite::params_from_iter;

use crate::catalog::{Schema, ddl};
use crate::encoding::{self, Value};
use crate::error::Error;
use crate::record::Record;

use super::database::Database;
use super::filter::{FilterValue, Filters, Order, Select};
use super::transaction::Session;

// ---------------------------------------------------------------------------
// QueryBuilder
// ---------------------------------------------------------------------------

/// Builder for a filtered SELECT returning typed records.
///
/// Nothing is cached: every `execute` or `for_each` re-runs the query against
/// the session's current scope.
pub struct QueryBuilder<'s, 'db, T> {
    session: &'s Session<'db>,
    select: Select,
    _record: PhantomData<fn() -> T>,
}

impl<'s, 'db, T: Record> QueryBuilder<'s, 'db, T> {
    pub(crate) fn new(session: &'s Session<'db>) -> Self {
        Self {
            session,
            select: Select::new(),
            _record: PhantomData,
        }
    }

    /// Add one attribute filter, e.g. `("category__in", ["hats", "robes"])`.
    pub fn filter(mut self, attribute: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.select.filter(attribute, value);
        self
    }

    /// Add every filter in `filters`.
    pub fn filters(mut self, filters: Filters) -> Self {
        self.select.filters(filters);
        self
    }

    /// AND a hand-written condition into the WHERE clause, e.g.
    /// `("rank BETWEEN ? AND ?", vec![1.into(), 5.into()])`. The column
    /// list, table and paging are still supplied by the builder.
    pub fn where_sql(mut self, sql: impl Into<String>, params: Vec<Value>) -> Self {
        self.select.where_sql(sql, params);
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, order: Order) -> Self {
        self.select.order_by(column, order);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.select.limit(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.select.offset(offset);
        self
    }

    /// The statement and parameters this builder would run.
    pub fn to_sql(&self) -> Result<(String, Vec<Value>), Error> {
        let schema = T::schema()?;
        Ok(self.select.to_sql(&schema)?)
    }

    /// Run the query and collect every matching record.
    pub fn execute(self) -> Result<Vec<T>, Error> {
        let mut records = Vec::new();
        self.for_each(|record| {
            records.push(record);
            ControlFlow::Continue(())
        })?;
        Ok(records)
    }

    /// Run the query and hand each record to `f` as its row is read,
    /// stopping early when `f` breaks.
    pub fn for_each<F>(self, mut f: F) -> Result<(), Error>
    where
        F: FnMut(T) -> ControlFlow<()>,
    {
        let schema = T::schema()?;
        let (sql, params) = self.select.to_sql(&schema)?;
        let mut stmt = self.session.connection().prepare_cached(&sql)?;
        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        while let Some(row) = rows.next()? {
            let values = encoding::row_values(row, schema.len())?;
            let record = encoding::decode::<T>(&schema, &values)?;
            if f(record).is_break() {
                break;
            }
        }
        Ok(())
    }

    /// Number of matching rows, ignoring order and paging.
    pub fn count(self) -> Result<u64, Error> {
        let schema = T::schema()?;
        let (sql, params) = self.select.to_count_sql(&schema)?;
        let mut stmt = self.session.connection().prepare_cached(&sql)?;
        let count: i64 = stmt.query_row(params_from_iter(params.iter()), |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// RegisterBuilder
// ---------------------------------------------------------------------------

/// Builder for registering a record type: derive its schema and create its
/// table and indexes.
pub struct RegisterBuilder<'a, T> {
    db: &'a Database,
    indexes: Vec<String>,
    _record: PhantomData<fn() -> T>,
}

impl<'a, T: Record> RegisterBuilder<'a, T> {
    pub(crate) fn new(db: &'a Database) -> Self {
        Self {
            db,
            indexes: Vec::new(),
            _record: PhantomData,
        }
    }

    /// Add a secondary index on a flattened column.
    pub fn index(mut self, column: &str) -> Self {
        self.indexes.push(column.to_string());
        self
    }

    /// Create the table and its indexes, committing on success.
    pub fn execute(self) -> Result<(), Error> {
        let indexes: Vec<&str> = self.indexes.iter().map(String::as_str).collect();
        self.db
            .transact(|session| session.create_table::<T>(&indexes))
    }
}

// ---------------------------------------------------------------------------
// Write statements
// ---------------------------------------------------------------------------

/// `INSERT … ON CONFLICT(<pk>) DO UPDATE SET` every column to its new value.
pub(crate) fn upsert_sql(schema: &Schema) -> Result<String, Error> {
    let key = schema.key_column()?;
    let placeholders = vec!["?"; schema.len()].join(", ");
    let assignments = schema
        .columns()
        .iter()
        .map(|column| format!("{0} = excluded.{0}", column.name))
        .collect::<Vec<_>>()
        .join(", ");
    Ok(format!(
        "INSERT INTO {} ({}) VALUES ({placeholders}) ON CONFLICT({}) DO UPDATE SET {assignments}",
        schema.table_name(),
        schema.column_list(),
        key.name
    ))
}

pub(crate) fn delete_sql(schema: &Schema) -> Result<String, Error> {
    let key = schema.key_column()?;
    Ok(format!(
        "DELETE FROM {} WHERE {} = ?",
        schema.table_name(),
        key.name
    ))
}

/// Every statement needed to create `T`'s table and the given indexes.
pub(crate) fn create_statements<T: Record>(indexes: &[&str]) -> Result<Vec<String>, Error> {
    let schema = T::schema()?;
    Ok(ddl::table_script(&schema, indexes)?)
}
