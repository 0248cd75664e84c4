//! Schema catalog: column model, type reflection, the schema registry, and DDL.

pub mod ddl;
pub mod reflect;
pub mod registry;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// How a column is stored in SQLite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageKind {
    Integer,
    Real,
    Text,
}

impl StorageKind {
    pub fn sql_name(self) -> &'static str {
        match self {
            StorageKind::Integer => "INTEGER",
            StorageKind::Real => "REAL",
            StorageKind::Text => "TEXT",
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_name())
    }
}

/// A single scalar column, named by its full nesting path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub kind: StorageKind,
    pub nullable: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: StorageKind, nullable: bool) -> Self {
        Self {
            name: name.into(),
            kind,
            nullable,
        }
    }

    /// The same column as seen from a record embedding it under `prefix`.
    pub fn with_prefix(&self, prefix: &str) -> Self {
        Self {
            name: format!("{prefix}_{}", self.name),
            kind: self.kind,
            nullable: self.nullable,
        }
    }
}

/// A field of a schema, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaField {
    /// A scalar field stored in exactly one column.
    Direct(Column),
    /// An embedded record stored as a contiguous group of prefixed columns.
    Nested { name: String, schema: Arc<Schema> },
}

impl SchemaField {
    pub fn name(&self) -> &str {
        match self {
            SchemaField::Direct(column) => &column.name,
            SchemaField::Nested { name, .. } => name,
        }
    }

    /// Number of flattened columns this field occupies.
    pub fn width(&self) -> usize {
        match self {
            SchemaField::Direct(_) => 1,
            SchemaField::Nested { schema, .. } => schema.len(),
        }
    }
}

/// The immutable, derived storage layout of one record type.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub(crate) type_name: String,
    pub(crate) table_name: String,
    pub(crate) primary_key: String,
    pub(crate) fields: Vec<SchemaField>,
    pub(crate) columns: Vec<Column>,
}

impl Schema {
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Name of the primary-key field.
    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    /// Columns of the scalar fields declared directly on this record.
    pub fn direct(&self) -> impl Iterator<Item = &Column> {
        self.fields.iter().filter_map(|field| match field {
            SchemaField::Direct(column) => Some(column),
            SchemaField::Nested { .. } => None,
        })
    }

    /// Embedded records by field name, in declaration order.
    pub fn nested(&self) -> impl Iterator<Item = (&str, &Arc<Schema>)> {
        self.fields.iter().filter_map(|field| match field {
            SchemaField::Nested { name, schema } => Some((name.as_str(), schema)),
            SchemaField::Direct(_) => None,
        })
    }

    pub fn nested_schema(&self, field: &str) -> Option<&Arc<Schema>> {
        self.nested()
            .find(|(name, _)| *name == field)
            .map(|(_, schema)| schema)
    }

    /// Every flattened column, in depth-first declaration order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.name == name)
    }

    /// Comma-separated column list, as used in SELECT and INSERT statements.
    pub fn column_list(&self) -> String {
        self.columns
            .iter()
            .map(|column| column.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// The primary-key column, for schemas that are stored as tables.
    ///
    /// Embedded value records may name an embedded field as their key, since
    /// they never get a table of their own; this check runs wherever the
    /// schema is about to be used as a table.
    pub fn key_column(&self) -> Result<&Column, SchemaError> {
        match self.fields.iter().find(|f| f.name() == self.primary_key) {
            Some(SchemaField::Direct(column)) => Ok(column),
            Some(SchemaField::Nested { .. }) => Err(SchemaError::PrimaryKeyNotScalar {
                record: self.type_name.clone(),
                field: self.primary_key.clone(),
            }),
            None => Err(SchemaError::PrimaryKeyNotFound {
                record: self.type_name.clone(),
                field: self.primary_key.clone(),
            }),
        }
    }
}
