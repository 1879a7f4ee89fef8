// Copyright 2022 RisingLight Project Authors. Licensed under Apache-2.0.

use bytes::{Buf, BufMut};

use super::vector::VectorColumn;
use super::Column;
use crate::value::Value;
use crate::{Error, Result};

/// A column of `Nullable(T)` rows: a nested column of type `T` plus a
/// parallel `u8` flag column where 1 marks a null row. The two always have
/// the same length; null rows hold a default value in the nested column.
///
/// The wire body is the flag column followed by the nested column.
#[derive(Debug, Clone, PartialEq)]
pub struct NullableColumn {
    nested: Box<Column>,
    nulls: VectorColumn<u8>,
}

impl NullableColumn {
    /// Wraps an empty column of the nested type.
    pub fn new(nested: Column) -> Self {
        NullableColumn {
            nulls: VectorColumn::new(),
            nested: Box::new(nested),
        }
    }

    /// Wraps an existing pair of nested and flag columns, which must have the
    /// same length.
    pub fn with_nulls(nested: Column, nulls: VectorColumn<u8>) -> Result<Self> {
        if nested.len() != nulls.len() {
            return Err(Error::invalid(format!(
                "nested column has {} rows but null flags have {}",
                nested.len(),
                nulls.len()
            )));
        }
        Ok(NullableColumn {
            nested: Box::new(nested),
            nulls,
        })
    }

    pub fn len(&self) -> usize {
        self.nulls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nulls.is_empty()
    }

    pub fn nested(&self) -> &Column {
        &self.nested
    }

    pub fn nulls(&self) -> &VectorColumn<u8> {
        &self.nulls
    }

    /// Returns the null flag at the given row number.
    pub fn is_null(&self, n: usize) -> Result<bool> {
        Ok(self.nulls.at(n)? != 0)
    }

    /// Appends one null row.
    pub fn push_null(&mut self) {
        self.nested.push_default();
        self.nulls.push(1);
    }

    /// Appends one row: [`Value::Null`] or a value of the nested type.
    pub fn push_value(&mut self, value: Value) -> Result<()> {
        if value == Value::Null {
            self.push_null();
            return Ok(());
        }
        self.nested.push_value(value)?;
        self.nulls.push(0);
        Ok(())
    }

    pub(crate) fn append_unchecked(&mut self, other: &Self) {
        self.nested.append_unchecked(&other.nested);
        self.nulls.append(&other.nulls);
    }

    pub fn slice(&self, begin: usize, len: usize) -> Self {
        NullableColumn {
            nested: Box::new(self.nested.slice(begin, len)),
            nulls: self.nulls.slice(begin, len),
        }
    }

    pub fn clear(&mut self) {
        self.nested.clear();
        self.nulls.clear();
    }

    pub fn reserve(&mut self, rows: usize) {
        self.nested.reserve(rows);
        self.nulls.reserve(rows);
    }

    pub(crate) fn clone_empty(&self) -> Self {
        NullableColumn {
            nested: Box::new(self.nested.clone_empty()),
            nulls: VectorColumn::new(),
        }
    }

    /// Decodes `rows` null flags and then `rows` nested values. On `false`
    /// nothing from the failed batch is kept.
    pub fn load(&mut self, input: &mut impl Buf, rows: usize) -> bool {
        let mut flags = VectorColumn::new();
        if !flags.load(input, rows) {
            return false;
        }
        let mut batch = self.nested.clone_empty();
        if !batch.load(input, rows) {
            return false;
        }
        self.nulls.append(&flags);
        self.nested.append_unchecked(&batch);
        true
    }

    pub fn save(&self, output: &mut impl BufMut) {
        self.nulls.save(&mut *output);
        self.nested.save(&mut *output);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nullable_uint64() -> NullableColumn {
        NullableColumn::new(Column::UInt64(VectorColumn::new()))
    }

    #[test]
    fn test_push_and_flags() {
        let mut col = nullable_uint64();
        col.push_value(Value::UInt64(1)).unwrap();
        col.push_value(Value::UInt64(2)).unwrap();
        col.push_null();
        col.push_value(Value::Null).unwrap();

        assert_eq!(col.len(), 4);
        assert_eq!(col.nested().len(), 4);
        assert_eq!(col.is_null(0), Ok(false));
        assert_eq!(col.is_null(2), Ok(true));
        assert_eq!(col.is_null(3), Ok(true));
        assert_eq!(col.nested().as_uint64().unwrap().at(0), Ok(1));
    }

    #[test]
    fn test_push_type_mismatch_leaves_column_unchanged() {
        let mut col = nullable_uint64();
        col.push_value(Value::UInt64(1)).unwrap();
        assert!(col.push_value(Value::String(b"oops".to_vec())).is_err());
        assert_eq!(col.len(), 1);
        assert_eq!(col.nested().len(), 1);
    }

    #[test]
    fn test_save_layout() {
        let mut col = nullable_uint64();
        col.push_value(Value::UInt64(1)).unwrap();
        col.push_value(Value::UInt64(2)).unwrap();
        col.push_null();
        col.push_null();

        let mut buf = vec![];
        col.save(&mut buf);
        assert_eq!(buf.len(), 4 + 4 * 8);
        assert_eq!(&buf[..4], [0, 0, 1, 1]);
        assert_eq!(buf[4], 1);
    }

    #[test]
    fn test_roundtrip() {
        let mut col = nullable_uint64();
        col.push_value(Value::UInt64(7)).unwrap();
        col.push_null();

        let mut buf = vec![];
        col.save(&mut buf);

        let mut other = nullable_uint64();
        let mut input = &buf[..];
        assert!(other.load(&mut input, 2));
        assert_eq!(other, col);
    }

    #[test]
    fn test_load_short_stream() {
        let mut col = nullable_uint64();
        let buf = [0u8, 0, 1, 1, 7];
        let mut input = &buf[..];
        assert!(!col.load(&mut input, 4));
        assert_eq!(col.len(), 0);
        assert_eq!(col.nested().len(), 0);
    }

    #[test]
    fn test_with_nulls_length_check() {
        let nested = Column::UInt64([1u64, 2].into_iter().collect());
        assert!(NullableColumn::with_nulls(nested.clone(), [0u8].into_iter().collect()).is_err());
        let col =
            NullableColumn::with_nulls(nested, [0u8, 1].into_iter().collect()).unwrap();
        assert_eq!(col.len(), 2);
        assert_eq!(col.is_null(1), Ok(true));
    }
}
