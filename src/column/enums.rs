// Copyright 2022 RisingLight Project Authors. Licensed under Apache-2.0.

use bytes::{Buf, BufMut};

use super::vector::VectorColumn;
use crate::types::EnumItems;
use crate::wire::Primitive;
use crate::{Error, Result};

/// The integer storage of an enum column: `i8` for `Enum8`, `i16` for
/// `Enum16`.
pub trait EnumCode: Primitive {
    fn fits(value: i16) -> bool;
    fn from_i16(value: i16) -> Self;
    fn as_i16(self) -> i16;
}

impl EnumCode for i8 {
    fn fits(value: i16) -> bool {
        i8::try_from(value).is_ok()
    }

    fn from_i16(value: i16) -> Self {
        value as i8
    }

    fn as_i16(self) -> i16 {
        i16::from(self)
    }
}

impl EnumCode for i16 {
    fn fits(_value: i16) -> bool {
        true
    }

    fn from_i16(value: i16) -> Self {
        value
    }

    fn as_i16(self) -> i16 {
        self
    }
}

/// A column of enum codes plus the descriptor's name <-> code map.
///
/// The wire body is identical to the underlying integer vector.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumColumn<T: EnumCode> {
    items: EnumItems,
    data: VectorColumn<T>,
}

pub type Enum8Column = EnumColumn<i8>;
pub type Enum16Column = EnumColumn<i16>;

impl<T: EnumCode> EnumColumn<T> {
    /// Creates an empty column; every item value must fit the code width.
    pub fn new(items: EnumItems) -> Result<Self> {
        for item in items.items() {
            if !T::fits(item.value) {
                return Err(Error::invalid(format!(
                    "enum value {} does not fit the column's code width",
                    item.value
                )));
            }
        }
        Ok(EnumColumn {
            items,
            data: VectorColumn::new(),
        })
    }

    pub fn items(&self) -> &EnumItems {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Appends a code without membership validation.
    pub fn push(&mut self, code: T) {
        self.data.push(code);
    }

    /// Appends a code, requiring it to belong to the item set.
    pub fn push_checked(&mut self, code: T) -> Result<()> {
        if self.items.name_of(code.as_i16()).is_none() {
            return Err(Error::invalid(format!(
                "unknown enum value {}",
                code.as_i16()
            )));
        }
        self.data.push(code);
        Ok(())
    }

    /// Appends the code named `name` in the item set.
    pub fn push_name(&mut self, name: &str) -> Result<()> {
        let value = self
            .items
            .value_of(name)
            .ok_or_else(|| Error::invalid(format!("unknown enum name {name:?}")))?;
        self.data.push(T::from_i16(value));
        Ok(())
    }

    /// Returns the code at the given row number.
    pub fn at(&self, n: usize) -> Result<T> {
        self.data.at(n)
    }

    /// Returns the name of the code at the given row number.
    pub fn name_at(&self, n: usize) -> Result<&str> {
        let code = self.data.at(n)?;
        self.items.name_of(code.as_i16()).ok_or_else(|| {
            Error::invalid(format!("enum value {} has no name", code.as_i16()))
        })
    }

    /// The raw codes, for zero-copy readers.
    pub fn data(&self) -> &[T] {
        self.data.data()
    }

    pub fn append(&mut self, other: &Self) {
        self.data.append(&other.data);
    }

    pub fn slice(&self, begin: usize, len: usize) -> Self {
        EnumColumn {
            items: self.items.clone(),
            data: self.data.slice(begin, len),
        }
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    pub fn reserve(&mut self, rows: usize) {
        self.data.reserve(rows);
    }

    pub(crate) fn clone_empty(&self) -> Self {
        EnumColumn {
            items: self.items.clone(),
            data: VectorColumn::new(),
        }
    }

    pub(crate) fn push_default(&mut self) {
        let value = self.items.items().first().map(|item| item.value).unwrap_or(0);
        self.data.push(T::from_i16(value));
    }

    pub fn load(&mut self, input: &mut impl Buf, rows: usize) -> bool {
        self.data.load(input, rows)
    }

    pub fn save(&self, output: &mut impl BufMut) {
        self.data.save(output);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EnumItem;

    fn one_two() -> EnumItems {
        EnumItems::new(vec![EnumItem::new("One", 1), EnumItem::new("Two", 2)]).unwrap()
    }

    #[test]
    fn test_push_by_name_and_code() {
        let mut col = Enum8Column::new(one_two()).unwrap();
        col.push_name("One").unwrap();
        col.push_checked(2).unwrap();

        assert_eq!(col.at(0), Ok(1));
        assert_eq!(col.name_at(0), Ok("One"));
        assert_eq!(col.at(1), Ok(2));
        assert_eq!(col.name_at(1), Ok("Two"));
    }

    #[test]
    fn test_unknown_name_is_rejected() {
        let mut col = Enum8Column::new(one_two()).unwrap();
        let err = col.push_name("Three").unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert_eq!(col.len(), 0);
    }

    #[test]
    fn test_unknown_code() {
        let mut col = Enum8Column::new(one_two()).unwrap();
        assert!(col.push_checked(9).is_err());
        col.push(9);
        assert_eq!(col.len(), 1);
        assert!(col.name_at(0).is_err());
    }

    #[test]
    fn test_wire_is_integer_vector() {
        let mut col = Enum16Column::new(one_two()).unwrap();
        col.push_name("Two").unwrap();
        let mut buf = vec![];
        col.save(&mut buf);
        assert_eq!(buf, [2, 0]);

        let mut other = Enum16Column::new(one_two()).unwrap();
        let mut input = &buf[..];
        assert!(other.load(&mut input, 1));
        assert_eq!(other.name_at(0), Ok("Two"));
    }

    #[test]
    fn test_width_check() {
        let wide = EnumItems::new(vec![EnumItem::new("Big", 300)]).unwrap();
        assert!(Enum8Column::new(wide.clone()).is_err());
        assert!(Enum16Column::new(wide).is_ok());
    }
}
