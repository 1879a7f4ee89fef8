// Copyright 2022 RisingLight Project Authors. Licensed under Apache-2.0.

//! Column element type descriptors.
//!
//! A [`Type`] is an immutable description of what one column holds. Its
//! [`Display`](std::fmt::Display) form is the canonical textual name the
//! server reads and writes (`Array(UInt64)`, `Enum8('One'=1,'Two'=2)`, ...);
//! [`parse`] is the inverse.

use std::fmt;

use itertools::Itertools;

use crate::{Error, Result};

mod parse;
pub use parse::parse;

/// One `'name' = value` entry of an enum type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumItem {
    pub name: String,
    pub value: i16,
}

impl EnumItem {
    pub fn new(name: impl Into<String>, value: i16) -> Self {
        EnumItem {
            name: name.into(),
            value,
        }
    }
}

/// The ordered name <-> value map of an enum type.
///
/// Names and values are each unique; names render in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnumItems {
    items: Vec<EnumItem>,
}

impl EnumItems {
    pub fn new(items: Vec<EnumItem>) -> Result<Self> {
        for (idx, item) in items.iter().enumerate() {
            for earlier in &items[..idx] {
                if item.name == earlier.name {
                    return Err(Error::invalid(format!(
                        "duplicate enum name {:?}",
                        item.name
                    )));
                }
                if item.value == earlier.value {
                    return Err(Error::invalid(format!(
                        "duplicate enum value {}",
                        item.value
                    )));
                }
            }
        }
        Ok(EnumItems { items })
    }

    pub fn items(&self) -> &[EnumItem] {
        &self.items
    }

    pub fn value_of(&self, name: &str) -> Option<i16> {
        self.items
            .iter()
            .find(|item| item.name == name)
            .map(|item| item.value)
    }

    pub fn name_of(&self, value: i16) -> Option<&str> {
        self.items
            .iter()
            .find(|item| item.value == value)
            .map(|item| item.name.as_str())
    }
}

impl fmt::Display for EnumItems {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            self.items
                .iter()
                .map(|item| format!("'{}'={}", escape_name(&item.name), item.value))
                .join(",")
        )
    }
}

/// Backslash-escape `'` and `\` inside a quoted enum name.
fn escape_name(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len());
    for c in name.chars() {
        if c == '\'' || c == '\\' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// A column element type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    String,
    /// Byte strings of exactly this width, zero-padded on the right.
    FixedString(usize),
    /// Days since the Unix epoch, stored as `u16`.
    Date,
    /// Seconds since the Unix epoch, stored as `u32`.
    DateTime,
    Array(Box<Type>),
    Nullable(Box<Type>),
    Enum8(EnumItems),
    Enum16(EnumItems),
}

impl Type {
    /// `FixedString(width)`; the width must be at least 1.
    pub fn fixed_string(width: usize) -> Result<Type> {
        if width == 0 {
            return Err(Error::invalid("FixedString width must be at least 1"));
        }
        Ok(Type::FixedString(width))
    }

    pub fn array(element: Type) -> Type {
        Type::Array(Box::new(element))
    }

    pub fn nullable(nested: Type) -> Type {
        Type::Nullable(Box::new(nested))
    }

    /// `Enum8(..)`; every item value must fit `i8`.
    pub fn enum8(items: EnumItems) -> Result<Type> {
        for item in items.items() {
            if i8::try_from(item.value).is_err() {
                return Err(Error::invalid(format!(
                    "enum value {} does not fit Enum8",
                    item.value
                )));
            }
        }
        Ok(Type::Enum8(items))
    }

    pub fn enum16(items: EnumItems) -> Type {
        Type::Enum16(items)
    }

    /// The canonical textual form the server recognizes.
    pub fn name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int8 => f.write_str("Int8"),
            Type::Int16 => f.write_str("Int16"),
            Type::Int32 => f.write_str("Int32"),
            Type::Int64 => f.write_str("Int64"),
            Type::UInt8 => f.write_str("UInt8"),
            Type::UInt16 => f.write_str("UInt16"),
            Type::UInt32 => f.write_str("UInt32"),
            Type::UInt64 => f.write_str("UInt64"),
            Type::Float32 => f.write_str("Float32"),
            Type::Float64 => f.write_str("Float64"),
            Type::String => f.write_str("String"),
            Type::FixedString(width) => write!(f, "FixedString({width})"),
            Type::Date => f.write_str("Date"),
            Type::DateTime => f.write_str("DateTime"),
            Type::Array(element) => write!(f, "Array({element})"),
            Type::Nullable(nested) => write!(f, "Nullable({nested})"),
            Type::Enum8(items) => write!(f, "Enum8({items})"),
            Type::Enum16(items) => write!(f, "Enum16({items})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_simple() {
        assert_eq!(Type::UInt64.name(), "UInt64");
        assert_eq!(Type::fixed_string(16).unwrap().name(), "FixedString(16)");
        assert_eq!(Type::array(Type::UInt64).name(), "Array(UInt64)");
        assert_eq!(Type::nullable(Type::Date).name(), "Nullable(Date)");
        assert_eq!(
            Type::array(Type::nullable(Type::String)).name(),
            "Array(Nullable(String))"
        );
    }

    #[test]
    fn test_render_enum() {
        let items =
            EnumItems::new(vec![EnumItem::new("One", 1), EnumItem::new("Two", 2)]).unwrap();
        assert_eq!(Type::enum8(items).unwrap().name(), "Enum8('One'=1,'Two'=2)");
    }

    #[test]
    fn test_render_enum_escaped() {
        let items = EnumItems::new(vec![EnumItem::new("it's\\", -1)]).unwrap();
        assert_eq!(Type::enum16(items).name(), r"Enum16('it\'s\\'=-1)");
    }

    #[test]
    fn test_enum_uniqueness() {
        assert!(EnumItems::new(vec![EnumItem::new("A", 1), EnumItem::new("A", 2)]).is_err());
        assert!(EnumItems::new(vec![EnumItem::new("A", 1), EnumItem::new("B", 1)]).is_err());
    }

    #[test]
    fn test_enum8_width_check() {
        let items = EnumItems::new(vec![EnumItem::new("Big", 1000)]).unwrap();
        assert!(Type::enum8(items.clone()).is_err());
        assert_eq!(Type::enum16(items).name(), "Enum16('Big'=1000)");
    }

    #[test]
    fn test_fixed_string_width() {
        assert!(Type::fixed_string(0).is_err());
    }

    #[test]
    fn test_structural_equality() {
        assert_eq!(Type::array(Type::UInt64), Type::array(Type::UInt64));
        assert_ne!(Type::array(Type::UInt64), Type::array(Type::Int64));
        assert_ne!(
            Type::fixed_string(4).unwrap(),
            Type::fixed_string(8).unwrap()
        );
    }
}
