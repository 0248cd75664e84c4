//! Record and field traits.
//!
//! A record type describes its own fields through [`Record::descriptor`] and
//! knows how to write itself into, and read itself back from, a flat list
//! of column values. The [`record!`](crate::record!) macro generates both
//! from a struct declaration; hand-written impls are equally valid.

use std::sync::Arc;

use crate::api::update::Setter;
use crate::catalog::{Schema, StorageKind, registry};
use crate::encoding::{Value, ValueCursor};
use crate::error::{CodecError, Error, SchemaError};
use crate::types::{DeclaredType, RecordDescriptor};

/// A type that can be declared as a field of a record.
pub trait Field: Sized + 'static {
    fn declared_type() -> DeclaredType;

    /// Append this field's column values, in column order.
    fn encode(&self, out: &mut Vec<Value>);

    /// Read this field back from its column values.
    fn decode(values: &mut ValueCursor<'_>) -> Result<Self, Error>;
}

/// A scalar stored in exactly one column.
pub trait Scalar: Sized + 'static {
    const KIND: StorageKind;

    fn to_value(&self) -> Value;

    fn from_value(value: &Value) -> Result<Self, CodecError>;
}

/// A persistable record type.
pub trait Record: Field {
    fn descriptor() -> RecordDescriptor;

    /// Append every field's values in declaration order.
    fn encode_fields(&self, out: &mut Vec<Value>);

    /// Read every field in declaration order.
    fn decode_fields(values: &mut ValueCursor<'_>) -> Result<Self, Error>;

    /// Setters for partial updates, one per field.
    fn setters() -> Vec<Setter<Self>> {
        Vec::new()
    }

    /// The registered schema of this record type.
    fn schema() -> Result<Arc<Schema>, SchemaError> {
        registry::schema_of::<Self>()
    }
}

/// Value of `record`'s primary-key column.
pub fn primary_key_value<R: Record>(schema: &Schema, record: &R) -> Result<Value, Error> {
    let key = schema.key_column()?;
    let index = schema
        .column_index(&key.name)
        .ok_or_else(|| SchemaError::PrimaryKeyNotFound {
            record: schema.type_name().to_string(),
            field: key.name.clone(),
        })?;
    let mut values = crate::encoding::encode(record);
    Ok(values.swap_remove(index))
}

fn mismatch(expected: StorageKind, found: &Value) -> CodecError {
    match found {
        Value::Null => CodecError::UnexpectedNull(expected),
        other => CodecError::TypeMismatch {
            expected,
            found: other.type_name(),
        },
    }
}

impl Scalar for i64 {
    const KIND: StorageKind = StorageKind::Integer;

    fn to_value(&self) -> Value {
        Value::Integer(*self)
    }

    fn from_value(value: &Value) -> Result<Self, CodecError> {
        match value {
            Value::Integer(i) => Ok(*i),
            other => Err(mismatch(Self::KIND, other)),
        }
    }
}

impl Scalar for i32 {
    const KIND: StorageKind = StorageKind::Integer;

    fn to_value(&self) -> Value {
        Value::Integer(i64::from(*self))
    }

    fn from_value(value: &Value) -> Result<Self, CodecError> {
        let i = i64::from_value(value)?;
        i32::try_from(i).map_err(|_| CodecError::OutOfRange(i))
    }
}

impl Scalar for u32 {
    const KIND: StorageKind = StorageKind::Integer;

    fn to_value(&self) -> Value {
        Value::Integer(i64::from(*self))
    }

    fn from_value(value: &Value) -> Result<Self, CodecError> {
        let i = i64::from_value(value)?;
        u32::try_from(i).map_err(|_| CodecError::OutOfRange(i))
    }
}

impl Scalar for bool {
    const KIND: StorageKind = StorageKind::Integer;

    fn to_value(&self) -> Value {
        Value::Integer(i64::from(*self))
    }

    fn from_value(value: &Value) -> Result<Self, CodecError> {
        Ok(i64::from_value(value)? != 0)
    }
}

impl Scalar for f64 {
    const KIND: StorageKind = StorageKind::Real;

    fn to_value(&self) -> Value {
        Value::Real(*self)
    }

    fn from_value(value: &Value) -> Result<Self, CodecError> {
        match value {
            Value::Real(r) => Ok(*r),
            // REAL affinity stores integral values as integers when it can.
            Value::Integer(i) => Ok(*i as f64),
            other => Err(mismatch(Self::KIND, other)),
        }
    }
}

impl Scalar for f32 {
    const KIND: StorageKind = StorageKind::Real;

    fn to_value(&self) -> Value {
        Value::Real(f64::from(*self))
    }

    fn from_value(value: &Value) -> Result<Self, CodecError> {
        Ok(f64::from_value(value)? as f32)
    }
}

impl Scalar for String {
    const KIND: StorageKind = StorageKind::Text;

    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }

    fn from_value(value: &Value) -> Result<Self, CodecError> {
        match value {
            Value::Text(s) => Ok(s.clone()),
            other => Err(mismatch(Self::KIND, other)),
        }
    }
}

macro_rules! scalar_field {
    ($($t:ty),*) => {
        $(
            impl Field for $t {
                fn declared_type() -> DeclaredType {
                    DeclaredType::scalar::<$t>()
                }

                fn encode(&self, out: &mut Vec<Value>) {
                    out.push(Scalar::to_value(self));
                }

                fn decode(values: &mut ValueCursor<'_>) -> Result<Self, Error> {
                    Ok(<$t as Scalar>::from_value(values.next_value()?)?)
                }
            }
        )*
    };
}

scalar_field!(i64, i32, u32, bool, f64, f32, String);

impl<T: Scalar> Field for Option<T> {
    fn declared_type() -> DeclaredType {
        DeclaredType::scalar::<T>().nullable()
    }

    fn encode(&self, out: &mut Vec<Value>) {
        out.push(match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        });
    }

    fn decode(values: &mut ValueCursor<'_>) -> Result<Self, Error> {
        match values.next_value()? {
            Value::Null => Ok(None),
            other => Ok(Some(T::from_value(other)?)),
        }
    }
}
