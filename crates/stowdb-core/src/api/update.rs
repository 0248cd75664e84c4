//! Partial updates: apply a set of named field assignments to a record.
//!
//! Each record type has a setter table built once by the registry from
//! [`Record::setters`]. A [`Patch`] holds assignments as already-encoded
//! column values; applying it validates every attribute name against the
//! table before touching the record, then dispatches each assignment to the
//! field's setter, which decodes the values into the field's type.

use std::collections::HashMap;

use crate::catalog::registry;
use crate::encoding::{Value, ValueCursor};
use crate::error::{CodecError, Error, RecordError};
use crate::record::{Field, Record};

type Apply<R> = fn(&mut R, &mut ValueCursor<'_>) -> Result<(), Error>;

/// Assigns one field of `R` from its encoded column values.
pub struct Setter<R> {
    name: &'static str,
    apply: Apply<R>,
}

impl<R> Setter<R> {
    pub fn new(name: &'static str, apply: Apply<R>) -> Self {
        Self { name, apply }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<R> Clone for Setter<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for Setter<R> {}

/// Setters of one record type, by field name.
pub struct SetterTable<R> {
    record: &'static str,
    setters: HashMap<&'static str, Setter<R>>,
}

impl<R> SetterTable<R> {
    pub fn new(record: &'static str, setters: Vec<Setter<R>>) -> Self {
        Self {
            record,
            setters: setters.into_iter().map(|s| (s.name, s)).collect(),
        }
    }

    pub fn contains(&self, field: &str) -> bool {
        self.setters.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.setters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.setters.is_empty()
    }

    fn get(&self, field: &str) -> Result<&Setter<R>, RecordError> {
        self.setters
            .get(field)
            .ok_or_else(|| RecordError::UnknownAttribute {
                record: self.record.to_string(),
                attribute: field.to_string(),
            })
    }
}

/// A set of field assignments to apply to a record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
    assignments: Vec<(String, Vec<Value>)>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign `value` to the field `attribute`. Embedded records are assigned
    /// whole.
    pub fn set<F: Field>(mut self, attribute: impl Into<String>, value: F) -> Self {
        let mut values = Vec::new();
        value.encode(&mut values);
        self.assignments.push((attribute.into(), values));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.assignments.iter().map(|(name, _)| name.as_str())
    }

    /// Apply every assignment to `record`.
    ///
    /// Unknown attributes are rejected before any field is modified. A value
    /// of the wrong type for its field fails that assignment, leaving earlier
    /// assignments applied to the in-memory record.
    pub fn apply<R: Record>(&self, record: &mut R) -> Result<(), Error> {
        let table = registry::setters_of::<R>();

        let setters = self
            .assignments
            .iter()
            .map(|(name, _)| table.get(name).copied())
            .collect::<Result<Vec<_>, _>>()?;

        for (setter, (_, values)) in setters.iter().zip(&self.assignments) {
            let mut cursor = ValueCursor::new(values);
            (setter.apply)(record, &mut cursor)?;
            if cursor.remaining() != 0 {
                return Err(CodecError::ColumnCountMismatch {
                    record: table.record.to_string(),
                    expected: cursor.position(),
                    actual: values.len(),
                }
                .into());
            }
        }
        Ok(())
    }
}
