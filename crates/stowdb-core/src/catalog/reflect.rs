//! Type reflection: derive a [`Schema`] from a [`RecordDescriptor`].
//!
//! Reflection walks the declared fields in order. Scalars map to one column
//! each; embedded records contribute their own flattened columns, renamed
//! with the owning field's name as a prefix. Embedded schemas are obtained
//! through a resolver so the registry can cache them and run its
//! occurs-check.

use std::any::TypeId;
use std::collections::HashSet;
use std::sync::Arc;

use crate::error::SchemaError;
use crate::types::{DeclaredType, RecordDescriptor};

use super::{Column, Schema, SchemaField, StorageKind};

/// Map a scalar Rust type to the kind of column it is stored in.
pub fn storage_kind(type_id: TypeId) -> Option<StorageKind> {
    if type_id == TypeId::of::<i64>()
        || type_id == TypeId::of::<i32>()
        || type_id == TypeId::of::<u32>()
        || type_id == TypeId::of::<bool>()
    {
        Some(StorageKind::Integer)
    } else if type_id == TypeId::of::<f64>() || type_id == TypeId::of::<f32>() {
        Some(StorageKind::Real)
    } else if type_id == TypeId::of::<String>() {
        Some(StorageKind::Text)
    } else {
        None
    }
}

/// Derive a table name from a type name: `RawSiteData` becomes `raw_site_data`.
pub fn table_name_for(type_name: &str) -> String {
    let mut name = String::with_capacity(type_name.len() + 4);
    for (i, ch) in type_name.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                name.push('_');
            }
            name.push(ch.to_ascii_lowercase());
        } else {
            name.push(ch);
        }
    }
    name
}

/// Whether `name` can be written into SQL text without quoting.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Build the schema for `descriptor`.
///
/// `resolve` returns the schema of an embedded record type.
pub fn reflect(
    descriptor: &RecordDescriptor,
    resolve: &mut dyn FnMut(&RecordDescriptor) -> Result<Arc<Schema>, SchemaError>,
) -> Result<Schema, SchemaError> {
    let record = descriptor.type_name;

    if descriptor.fields.is_empty() {
        return Err(SchemaError::NoFields {
            record: record.to_string(),
        });
    }

    let table_name = descriptor
        .table_name
        .map(str::to_string)
        .unwrap_or_else(|| table_name_for(record));
    if !is_identifier(&table_name) {
        return Err(SchemaError::InvalidIdentifier {
            record: record.to_string(),
            name: table_name,
        });
    }

    let mut fields = Vec::with_capacity(descriptor.fields.len());
    let mut columns = Vec::new();

    for field in &descriptor.fields {
        // `__` separates a column from its query modifier.
        if !is_identifier(field.name) || field.name.contains("__") {
            return Err(SchemaError::InvalidIdentifier {
                record: record.to_string(),
                name: field.name.to_string(),
            });
        }

        match field.declared {
            DeclaredType::Scalar {
                type_id,
                type_name,
                nullable,
            } => {
                let kind = storage_kind(type_id).ok_or_else(|| SchemaError::UnsupportedType {
                    record: record.to_string(),
                    field: field.name.to_string(),
                    type_name: type_name.to_string(),
                })?;
                let column = Column::new(field.name, kind, nullable);
                columns.push(column.clone());
                fields.push(SchemaField::Direct(column));
            }
            DeclaredType::Record(nested_descriptor) => {
                let nested = resolve(&nested_descriptor())?;
                columns.extend(nested.columns().iter().map(|c| c.with_prefix(field.name)));
                fields.push(SchemaField::Nested {
                    name: field.name.to_string(),
                    schema: nested,
                });
            }
        }
    }

    let mut seen = HashSet::with_capacity(columns.len());
    for column in &columns {
        // Prefixing can join two underscores, e.g. `x` embedding `_y`.
        if column.name.contains("__") {
            return Err(SchemaError::InvalidIdentifier {
                record: record.to_string(),
                name: column.name.clone(),
            });
        }
        if !seen.insert(column.name.as_str()) {
            return Err(SchemaError::DuplicateColumn {
                record: record.to_string(),
                column: column.name.clone(),
            });
        }
    }

    let primary_key = match descriptor.primary_key {
        Some(pk) => {
            if !descriptor.fields.iter().any(|f| f.name == pk) {
                return Err(SchemaError::PrimaryKeyNotFound {
                    record: record.to_string(),
                    field: pk.to_string(),
                });
            }
            pk.to_string()
        }
        None => descriptor.fields[0].name.to_string(),
    };

    Ok(Schema {
        type_name: record.to_string(),
        table_name,
        primary_key,
        fields,
        columns,
    })
}
