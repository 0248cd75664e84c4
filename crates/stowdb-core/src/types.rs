//! Core types: record descriptors and declared field types.

use std::any::TypeId;

use crate::record::Record;

/// The type a record field is declared with.
///
/// Scalars carry the `TypeId` of the Rust type so the reflector can map it
/// to a storage kind. Embedded records carry a function returning the
/// embedded record's own descriptor, which keeps descriptors cheap to build
/// and lets the reflector detect embedding cycles.
#[derive(Debug, Clone, Copy)]
pub enum DeclaredType {
    Scalar {
        type_id: TypeId,
        type_name: &'static str,
        nullable: bool,
    },
    Record(fn() -> RecordDescriptor),
}

impl DeclaredType {
    /// A non-nullable scalar of Rust type `T`.
    pub fn scalar<T: 'static>() -> Self {
        DeclaredType::Scalar {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            nullable: false,
        }
    }

    /// An embedded record of type `R`.
    pub fn record<R: Record>() -> Self {
        DeclaredType::Record(R::descriptor)
    }

    /// Mark a scalar as nullable. Embedded records are never nullable.
    pub fn nullable(self) -> Self {
        match self {
            DeclaredType::Scalar {
                type_id, type_name, ..
            } => DeclaredType::Scalar {
                type_id,
                type_name,
                nullable: true,
            },
            other => other,
        }
    }
}

/// One declared field of a record, in declaration order.
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: &'static str,
    pub declared: DeclaredType,
}

/// Everything the reflector needs to know about a record type.
#[derive(Debug, Clone)]
pub struct RecordDescriptor {
    pub type_id: TypeId,
    pub type_name: &'static str,
    /// Table name override; derived from `type_name` when absent.
    pub table_name: Option<&'static str>,
    /// Primary key override; the first declared field when absent.
    pub primary_key: Option<&'static str>,
    pub fields: Vec<FieldDef>,
}

impl RecordDescriptor {
    pub fn new<T: 'static>(type_name: &'static str) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name,
            table_name: None,
            primary_key: None,
            fields: Vec::new(),
        }
    }

    pub fn table(mut self, name: &'static str) -> Self {
        self.table_name = Some(name);
        self
    }

    pub fn primary_key(mut self, field: &'static str) -> Self {
        self.primary_key = Some(field);
        self
    }

    pub fn field(mut self, name: &'static str, declared: DeclaredType) -> Self {
        self.fields.push(FieldDef { name, declared });
        self
    }
}
