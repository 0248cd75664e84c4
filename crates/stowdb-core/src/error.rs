//! Error types for all StowDB operations.

use std::io;
use thiserror::Error;

use crate::catalog::StorageKind;

/// Top-level error type for StowDB operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("database connection still held by another session after {waited_ms} ms")]
    Busy { waited_ms: u64 },

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Record(#[from] RecordError),
}

/// Problems with a record declaration, detected when its schema is derived.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("record '{record}' declares no fields")]
    NoFields { record: String },

    #[error("field '{field}' of '{record}' must be an integer, real or text, but is `{type_name}`")]
    UnsupportedType {
        record: String,
        field: String,
        type_name: String,
    },

    #[error("record '{record}' embeds itself: {chain}", chain = path.join(" -> "))]
    RecursiveEmbedding { record: String, path: Vec<String> },

    #[error("'{name}' in '{record}' is not a valid column identifier")]
    InvalidIdentifier { record: String, name: String },

    #[error("primary key '{field}' is not a field of '{record}'")]
    PrimaryKeyNotFound { record: String, field: String },

    #[error("primary key '{field}' of '{record}' is an embedded record")]
    PrimaryKeyNotScalar { record: String, field: String },

    #[error("column '{column}' appears twice in '{record}'")]
    DuplicateColumn { record: String, column: String },

    #[error("cannot index unknown column '{column}' of table '{table}'")]
    UnknownIndexColumn { table: String, column: String },
}

/// Problems with a filter or ordering, detected before any SQL runs.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("unknown column '{column}' in table '{table}'")]
    UnknownColumn { table: String, column: String },

    #[error("unknown modifier '__{0}'")]
    UnknownModifier(String),

    #[error("'{attribute}' expects a list of values")]
    ExpectedList { attribute: String },

    #[error("'{attribute}' expects a single value, not a list")]
    ExpectedScalar { attribute: String },
}

/// Problems converting between stored rows and records.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error(
        "'{record}' has {expected} columns, but the row has {actual}; select exactly the record's columns"
    )]
    ColumnCountMismatch {
        record: String,
        expected: usize,
        actual: usize,
    },

    #[error("expected {expected} value, found {found}")]
    TypeMismatch {
        expected: StorageKind,
        found: &'static str,
    },

    #[error("unexpected NULL for a non-nullable {0} field")]
    UnexpectedNull(StorageKind),

    #[error("integer {0} is out of range for the field type")]
    OutOfRange(i64),

    #[error("row ended after {consumed} values")]
    Exhausted { consumed: usize },
}

/// Problems with a record-level operation.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("could not find the specified record in '{table}'")]
    NotFound { table: String },

    #[error("unknown attribute '{attribute}' for '{record}'")]
    UnknownAttribute { record: String, attribute: String },
}

pub type Result<T> = std::result::Result<T, Error>;
