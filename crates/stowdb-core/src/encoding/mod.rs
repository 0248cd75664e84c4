//! Record codec: flat column-value tuples to records and back.
//!
//! A record encodes to exactly one value per flattened column, in the
//! schema's column order. Decoding consumes values left to right through a
//! [`ValueCursor`]; embedded records decode from a sub-cursor holding
//! exactly as many values as their own flattened width.

pub mod value;

pub use value::Value;

use crate::catalog::Schema;
use crate::catalog::registry;
use crate::error::{CodecError, Error};
use crate::record::Record;

/// A forward-only reader over a row's values.
#[derive(Debug)]
pub struct ValueCursor<'a> {
    values: &'a [Value],
    position: usize,
}

impl<'a> ValueCursor<'a> {
    pub fn new(values: &'a [Value]) -> Self {
        Self {
            values,
            position: 0,
        }
    }

    /// Take the next value.
    pub fn next_value(&mut self) -> Result<&'a Value, CodecError> {
        let value = self.values.get(self.position).ok_or(CodecError::Exhausted {
            consumed: self.position,
        })?;
        self.position += 1;
        Ok(value)
    }

    /// Split off the next `len` values as their own cursor and advance past them.
    pub fn split(&mut self, len: usize) -> Result<ValueCursor<'a>, CodecError> {
        let end = self.position + len;
        if end > self.values.len() {
            return Err(CodecError::Exhausted {
                consumed: self.values.len(),
            });
        }
        let sub = ValueCursor::new(&self.values[self.position..end]);
        self.position = end;
        Ok(sub)
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.values.len() - self.position
    }
}

/// Encode a record into its flat column-value tuple.
pub fn encode<R: Record>(record: &R) -> Vec<Value> {
    let mut out = Vec::new();
    record.encode_fields(&mut out);
    out
}

/// Decode a full row into a record.
///
/// The row must hold exactly one value per flattened column of `schema`.
pub fn decode<R: Record>(schema: &Schema, values: &[Value]) -> Result<R, Error> {
    if values.len() != schema.len() {
        return Err(CodecError::ColumnCountMismatch {
            record: schema.type_name().to_string(),
            expected: schema.len(),
            actual: values.len(),
        }
        .into());
    }

    let mut cursor = ValueCursor::new(values);
    let record = R::decode_fields(&mut cursor)?;
    check_consumed(schema, &cursor)?;
    Ok(record)
}

/// Decode an embedded record from the next `width` values of `values`,
/// where `width` is the embedded record's flattened column count.
pub fn decode_embedded<R: Record>(values: &mut ValueCursor<'_>) -> Result<R, Error> {
    let schema = registry::schema_of::<R>()?;
    let mut sub = values.split(schema.len())?;
    let record = R::decode_fields(&mut sub)?;
    check_consumed(&schema, &sub)?;
    Ok(record)
}

fn check_consumed(schema: &Schema, cursor: &ValueCursor<'_>) -> Result<(), CodecError> {
    if cursor.remaining() == 0 {
        Ok(())
    } else {
        Err(CodecError::ColumnCountMismatch {
            record: schema.type_name().to_string(),
            expected: schema.len(),
            actual: cursor.position(),
        })
    }
}

/// Read every column of a result row as [`Value`]s.
pub(crate) fn row_values(row: &rusqlite::Row<'_>, width: usize) -> rusqlite::Result<Vec<Value>> {
    (0..width).map(|i| row.get::<_, Value>(i)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_split_advances() {
        let values = vec![
            Value::Integer(1),
            Value::Integer(2),
            Value::Integer(3),
            Value::Integer(4),
        ];
        let mut cursor = ValueCursor::new(&values);
        assert_eq!(cursor.next_value().unwrap(), &Value::Integer(1));

        let mut sub = cursor.split(2).unwrap();
        assert_eq!(sub.remaining(), 2);
        assert_eq!(sub.next_value().unwrap(), &Value::Integer(2));
        assert_eq!(sub.next_value().unwrap(), &Value::Integer(3));
        assert!(sub.next_value().is_err());

        assert_eq!(cursor.position(), 3);
        assert_eq!(cursor.next_value().unwrap(), &Value::Integer(4));
        assert!(matches!(
            cursor.next_value(),
            Err(CodecError::Exhausted { consumed: 4 })
        ));
    }

    #[test]
    fn test_cursor_split_past_end() {
        let values = vec![Value::Null];
        let mut cursor = ValueCursor::new(&values);
        assert!(cursor.split(2).is_err());
        assert_eq!(cursor.position(), 0);
    }
}
