//! Process-wide schema registry.
//!
//! Schemas are derived once per record type and shared as `Arc<Schema>`.
//! Deriving a schema also derives the schemas of every embedded record type,
//! tracking the chain of types currently being reflected so that a type
//! embedding itself (directly or through others) is rejected instead of
//! recursing forever.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;
use tracing::debug;

use crate::api::update::SetterTable;
use crate::error::SchemaError;
use crate::record::Record;
use crate::types::RecordDescriptor;

use super::Schema;
use super::reflect;

type SetterMap = HashMap<TypeId, Arc<dyn Any + Send + Sync>>;

static SCHEMAS: LazyLock<RwLock<HashMap<TypeId, Arc<Schema>>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

static SETTERS: LazyLock<RwLock<SetterMap>> = LazyLock::new(|| RwLock::new(HashMap::new()));

/// The schema of record type `R`, derived on first use.
pub fn schema_of<R: Record>() -> Result<Arc<Schema>, SchemaError> {
    schema_for(&R::descriptor())
}

/// The schema described by `descriptor`, derived on first use.
pub fn schema_for(descriptor: &RecordDescriptor) -> Result<Arc<Schema>, SchemaError> {
    let mut chain = Vec::new();
    resolve(descriptor, &mut chain)
}

/// Whether a schema for `type_id` has already been derived.
pub fn is_registered(type_id: TypeId) -> bool {
    SCHEMAS.read().contains_key(&type_id)
}

fn resolve(
    descriptor: &RecordDescriptor,
    chain: &mut Vec<(TypeId, &'static str)>,
) -> Result<Arc<Schema>, SchemaError> {
    if let Some(schema) = SCHEMAS.read().get(&descriptor.type_id) {
        return Ok(Arc::clone(schema));
    }

    if chain.iter().any(|(id, _)| *id == descriptor.type_id) {
        let mut path: Vec<String> = chain.iter().map(|(_, name)| name.to_string()).collect();
        path.push(descriptor.type_name.to_string());
        return Err(SchemaError::RecursiveEmbedding {
            record: descriptor.type_name.to_string(),
            path,
        });
    }

    chain.push((descriptor.type_id, descriptor.type_name));
    let reflected = reflect::reflect(descriptor, &mut |nested| resolve(nested, chain));
    chain.pop();
    let schema = Arc::new(reflected?);

    debug!(
        record = descriptor.type_name,
        table = schema.table_name(),
        columns = schema.len(),
        "derived schema"
    );

    // Two threads may race to derive the same schema; the first one stored wins
    // so every caller shares a single instance.
    let mut schemas = SCHEMAS.write();
    let stored = schemas
        .entry(descriptor.type_id)
        .or_insert_with(|| Arc::clone(&schema));
    Ok(Arc::clone(stored))
}

/// The partial-update setter table of record type `R`, built on first use.
pub fn setters_of<R: Record>() -> Arc<SetterTable<R>> {
    let type_id = TypeId::of::<R>();

    if let Some(table) = SETTERS.read().get(&type_id)
        && let Ok(table) = Arc::clone(table).downcast::<SetterTable<R>>()
    {
        return table;
    }

    let table = Arc::new(SetterTable::new(R::descriptor().type_name, R::setters()));
    let mut setters = SETTERS.write();
    let stored = setters
        .entry(type_id)
        .or_insert_with(|| Arc::clone(&table) as Arc<dyn Any + Send + Sync>);
    Arc::clone(stored).downcast::<SetterTable<R>>().unwrap_or(table)
}
