// Copyright 2022 RisingLight Project Authors. Licensed under Apache-2.0.

//! The polymorphic column family.
//!
//! [`Column`] embeds every column variant in one tagged sum, the way the
//! server's schema is open at run time but closed at compile time. The
//! shared capability set (length, append, load, save, slice, clear, reserve)
//! is exposed directly on the sum; narrowing accessors such as
//! [`as_uint64`](Column::as_uint64) or [`as_array`](Column::as_array) are the
//! only places the tag is inspected from outside.

use bytes::{Buf, BufMut};

use crate::types::Type;
use crate::value::Value;
use crate::{Error, Result};

mod array;
mod date;
mod enums;
mod nullable;
mod string;
mod vector;

pub use self::array::ArrayColumn;
pub use self::date::{DateColumn, DateTimeColumn};
pub use self::enums::{Enum16Column, Enum8Column, EnumCode, EnumColumn};
pub use self::nullable::NullableColumn;
pub use self::string::{FixedStringColumn, StringColumn};
pub use self::vector::VectorColumn;

/// Embeds all column variants.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Int8(VectorColumn<i8>),
    Int16(VectorColumn<i16>),
    Int32(VectorColumn<i32>),
    Int64(VectorColumn<i64>),
    UInt8(VectorColumn<u8>),
    UInt16(VectorColumn<u16>),
    UInt32(VectorColumn<u32>),
    UInt64(VectorColumn<u64>),
    Float32(VectorColumn<f32>),
    Float64(VectorColumn<f64>),
    String(StringColumn),
    FixedString(FixedStringColumn),
    Date(DateColumn),
    DateTime(DateTimeColumn),
    Array(ArrayColumn),
    Nullable(NullableColumn),
    Enum8(Enum8Column),
    Enum16(Enum16Column),
}

/// Dispatches `$body` over every variant, binding the payload to `$col`.
macro_rules! for_each_variant {
    ($self:expr, $col:ident => $body:expr) => {
        match $self {
            Column::Int8($col) => $body,
            Column::Int16($col) => $body,
            Column::Int32($col) => $body,
            Column::Int64($col) => $body,
            Column::UInt8($col) => $body,
            Column::UInt16($col) => $body,
            Column::UInt32($col) => $body,
            Column::UInt64($col) => $body,
            Column::Float32($col) => $body,
            Column::Float64($col) => $body,
            Column::String($col) => $body,
            Column::FixedString($col) => $body,
            Column::Date($col) => $body,
            Column::DateTime($col) => $body,
            Column::Array($col) => $body,
            Column::Nullable($col) => $body,
            Column::Enum8($col) => $body,
            Column::Enum16($col) => $body,
        }
    };
}

/// Like `for_each_variant`, but rewraps `$body` in the same variant.
macro_rules! map_variant {
    ($self:expr, $col:ident => $body:expr) => {
        match $self {
            Column::Int8($col) => Column::Int8($body),
            Column::Int16($col) => Column::Int16($body),
            Column::Int32($col) => Column::Int32($body),
            Column::Int64($col) => Column::Int64($body),
            Column::UInt8($col) => Column::UInt8($body),
            Column::UInt16($col) => Column::UInt16($body),
            Column::UInt32($col) => Column::UInt32($body),
            Column::UInt64($col) => Column::UInt64($body),
            Column::Float32($col) => Column::Float32($body),
            Column::Float64($col) => Column::Float64($body),
            Column::String($col) => Column::String($body),
            Column::FixedString($col) => Column::FixedString($body),
            Column::Date($col) => Column::Date($body),
            Column::DateTime($col) => Column::DateTime($body),
            Column::Array($col) => Column::Array($body),
            Column::Nullable($col) => Column::Nullable($body),
            Column::Enum8($col) => Column::Enum8($body),
            Column::Enum16($col) => Column::Enum16($body),
        }
    };
}

impl Column {
    /// Creates an empty column matching a type descriptor.
    pub fn with_type(ty: &Type) -> Result<Column> {
        Ok(match ty {
            Type::Int8 => Column::Int8(VectorColumn::new()),
            Type::Int16 => Column::Int16(VectorColumn::new()),
            Type::Int32 => Column::Int32(VectorColumn::new()),
            Type::Int64 => Column::Int64(VectorColumn::new()),
            Type::UInt8 => Column::UInt8(VectorColumn::new()),
            Type::UInt16 => Column::UInt16(VectorColumn::new()),
            Type::UInt32 => Column::UInt32(VectorColumn::new()),
            Type::UInt64 => Column::UInt64(VectorColumn::new()),
            Type::Float32 => Column::Float32(VectorColumn::new()),
            Type::Float64 => Column::Float64(VectorColumn::new()),
            Type::String => Column::String(StringColumn::new()),
            Type::FixedString(width) => Column::FixedString(FixedStringColumn::new(*width)?),
            Type::Date => Column::Date(DateColumn::new()),
            Type::DateTime => Column::DateTime(DateTimeColumn::new()),
            Type::Array(element) => Column::Array(ArrayColumn::new(Column::with_type(element)?)),
            Type::Nullable(nested) => {
                Column::Nullable(NullableColumn::new(Column::with_type(nested)?))
            }
            Type::Enum8(items) => Column::Enum8(EnumColumn::new(items.clone())?),
            Type::Enum16(items) => Column::Enum16(EnumColumn::new(items.clone())?),
        })
    }

    /// The type descriptor of this column.
    pub fn column_type(&self) -> Type {
        match self {
            Column::Int8(_) => Type::Int8,
            Column::Int16(_) => Type::Int16,
            Column::Int32(_) => Type::Int32,
            Column::Int64(_) => Type::Int64,
            Column::UInt8(_) => Type::UInt8,
            Column::UInt16(_) => Type::UInt16,
            Column::UInt32(_) => Type::UInt32,
            Column::UInt64(_) => Type::UInt64,
            Column::Float32(_) => Type::Float32,
            Column::Float64(_) => Type::Float64,
            Column::String(_) => Type::String,
            Column::FixedString(col) => Type::FixedString(col.width()),
            Column::Date(_) => Type::Date,
            Column::DateTime(_) => Type::DateTime,
            Column::Array(col) => Type::Array(Box::new(col.element_type())),
            Column::Nullable(col) => Type::Nullable(Box::new(col.nested().column_type())),
            Column::Enum8(col) => Type::Enum8(col.items().clone()),
            Column::Enum16(col) => Type::Enum16(col.items().clone()),
        }
    }

    /// Number of rows in the column.
    pub fn len(&self) -> usize {
        for_each_variant!(self, col => col.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of elements at row `n`: 1 for scalar variants, the array
    /// length for array columns.
    pub fn element_count(&self, n: usize) -> usize {
        match self {
            Column::Array(col) => col.element_count(n),
            _ => 1,
        }
    }

    /// Appends every row of `other`, which must have a structurally equal
    /// type descriptor.
    pub fn append(&mut self, other: &Column) -> Result<()> {
        if self.column_type() != other.column_type() {
            return Err(Error::invalid(format!(
                "can't append column of type {} to column of type {}",
                other.column_type(),
                self.column_type()
            )));
        }
        self.append_unchecked(other);
        Ok(())
    }

    /// Appends rows of a column already known to have an equal type.
    pub(crate) fn append_unchecked(&mut self, other: &Column) {
        match (self, other) {
            (Column::Int8(a), Column::Int8(b)) => a.append(b),
            (Column::Int16(a), Column::Int16(b)) => a.append(b),
            (Column::Int32(a), Column::Int32(b)) => a.append(b),
            (Column::Int64(a), Column::Int64(b)) => a.append(b),
            (Column::UInt8(a), Column::UInt8(b)) => a.append(b),
            (Column::UInt16(a), Column::UInt16(b)) => a.append(b),
            (Column::UInt32(a), Column::UInt32(b)) => a.append(b),
            (Column::UInt64(a), Column::UInt64(b)) => a.append(b),
            (Column::Float32(a), Column::Float32(b)) => a.append(b),
            (Column::Float64(a), Column::Float64(b)) => a.append(b),
            (Column::String(a), Column::String(b)) => a.append(b),
            (Column::FixedString(a), Column::FixedString(b)) => a.append(b),
            (Column::Date(a), Column::Date(b)) => a.append(b),
            (Column::DateTime(a), Column::DateTime(b)) => a.append(b),
            (Column::Array(a), Column::Array(b)) => a.append_unchecked(b),
            (Column::Nullable(a), Column::Nullable(b)) => a.append_unchecked(b),
            (Column::Enum8(a), Column::Enum8(b)) => a.append(b),
            (Column::Enum16(a), Column::Enum16(b)) => a.append(b),
            _ => panic!("append between mismatched column types"),
        }
    }

    /// Appends one dynamically typed value; the value kind must match the
    /// column type exactly.
    pub fn push_value(&mut self, value: Value) -> Result<()> {
        match (self, value) {
            (Column::Int8(col), Value::Int8(v)) => col.push(v),
            (Column::Int16(col), Value::Int16(v)) => col.push(v),
            (Column::Int32(col), Value::Int32(v)) => col.push(v),
            (Column::Int64(col), Value::Int64(v)) => col.push(v),
            (Column::UInt8(col), Value::UInt8(v)) => col.push(v),
            (Column::UInt16(col), Value::UInt16(v)) => col.push(v),
            (Column::UInt32(col), Value::UInt32(v)) => col.push(v),
            (Column::UInt64(col), Value::UInt64(v)) => col.push(v),
            (Column::Float32(col), Value::Float32(v)) => col.push(v),
            (Column::Float64(col), Value::Float64(v)) => col.push(v),
            (Column::String(col), Value::String(v)) => col.push(v),
            (Column::FixedString(col), Value::String(v)) => col.push(v),
            (Column::Date(col), Value::Date(days)) => col.push_days(days),
            (Column::DateTime(col), Value::DateTime(seconds)) => col.push_seconds(seconds),
            (Column::Array(col), Value::Array(values)) => {
                let mut row = col.inner().clone_empty();
                for value in values {
                    row.push_value(value)?;
                }
                col.push_column(row)?;
            }
            (Column::Nullable(col), value) => return col.push_value(value),
            (Column::Enum8(col), Value::String(name)) => col.push_name(&enum_name(name)?)?,
            (Column::Enum8(col), Value::Int8(code)) => col.push_checked(code)?,
            (Column::Enum16(col), Value::String(name)) => col.push_name(&enum_name(name)?)?,
            (Column::Enum16(col), Value::Int16(code)) => col.push_checked(code)?,
            (column, value) => {
                return Err(Error::invalid(format!(
                    "can't append a {} value to a column of type {}",
                    value.kind(),
                    column.column_type()
                )));
            }
        }
        Ok(())
    }

    /// Reads row `n` back as a dynamically typed value. Enum rows come back
    /// as their item name.
    pub fn value_at(&self, n: usize) -> Result<Value> {
        Ok(match self {
            Column::Int8(col) => Value::Int8(col.at(n)?),
            Column::Int16(col) => Value::Int16(col.at(n)?),
            Column::Int32(col) => Value::Int32(col.at(n)?),
            Column::Int64(col) => Value::Int64(col.at(n)?),
            Column::UInt8(col) => Value::UInt8(col.at(n)?),
            Column::UInt16(col) => Value::UInt16(col.at(n)?),
            Column::UInt32(col) => Value::UInt32(col.at(n)?),
            Column::UInt64(col) => Value::UInt64(col.at(n)?),
            Column::Float32(col) => Value::Float32(col.at(n)?),
            Column::Float64(col) => Value::Float64(col.at(n)?),
            Column::String(col) => Value::String(col.at(n)?.to_vec()),
            Column::FixedString(col) => Value::String(col.at(n)?.to_vec()),
            Column::Date(col) => Value::Date(col.days_at(n)?),
            Column::DateTime(col) => Value::DateTime(col.seconds_at(n)?),
            Column::Array(col) => {
                if n >= col.len() {
                    return Err(Error::out_of_range("row", n, col.len()));
                }
                let row = col.row_column(n);
                let mut values = Vec::with_capacity(row.len());
                for i in 0..row.len() {
                    values.push(row.value_at(i)?);
                }
                Value::Array(values)
            }
            Column::Nullable(col) => {
                if col.is_null(n)? {
                    Value::Null
                } else {
                    col.nested().value_at(n)?
                }
            }
            Column::Enum8(col) => Value::String(col.name_at(n)?.as_bytes().to_vec()),
            Column::Enum16(col) => Value::String(col.name_at(n)?.as_bytes().to_vec()),
        })
    }

    /// Appends one zero/empty row.
    pub fn push_default(&mut self) {
        match self {
            Column::Int8(col) => col.push(0),
            Column::Int16(col) => col.push(0),
            Column::Int32(col) => col.push(0),
            Column::Int64(col) => col.push(0),
            Column::UInt8(col) => col.push(0),
            Column::UInt16(col) => col.push(0),
            Column::UInt32(col) => col.push(0),
            Column::UInt64(col) => col.push(0),
            Column::Float32(col) => col.push(0.0),
            Column::Float64(col) => col.push(0.0),
            Column::String(col) => col.push(""),
            Column::FixedString(col) => col.push(""),
            Column::Date(col) => col.push_days(0),
            Column::DateTime(col) => col.push_seconds(0),
            Column::Array(col) => col.push_default(),
            Column::Nullable(col) => col.push_null(),
            Column::Enum8(col) => col.push_default(),
            Column::Enum16(col) => col.push_default(),
        }
    }

    /// Copies rows `[begin, begin + len)` into a new column of the same type.
    /// An out-of-range `begin` yields an empty column; `len` is clamped.
    pub fn slice(&self, begin: usize, len: usize) -> Column {
        map_variant!(self, col => col.slice(begin, len))
    }

    /// A fresh, empty column of the same type.
    pub fn clone_empty(&self) -> Column {
        map_variant!(self, col => col.clone_empty())
    }

    /// Drops all rows, keeping allocations for reuse.
    pub fn clear(&mut self) {
        for_each_variant!(self, col => col.clear())
    }

    /// Grows capacity for `rows` more rows without changing the length.
    pub fn reserve(&mut self, rows: usize) {
        for_each_variant!(self, col => col.reserve(rows))
    }

    /// Decodes `rows` rows from `input`, appending to the column. Returns
    /// `false` if the stream runs short; the column keeps a truncated but
    /// coherent prefix.
    pub fn load(&mut self, input: &mut impl Buf, rows: usize) -> bool {
        for_each_variant!(self, col => col.load(input, rows))
    }

    /// Encodes all rows to `output`.
    pub fn save(&self, output: &mut impl BufMut) {
        for_each_variant!(self, col => col.save(output))
    }
}

macro_rules! impl_narrow {
    ($($as_ref:ident, $as_mut:ident: $variant:ident => $ty:ty;)*) => {
        impl Column {
            $(
                pub fn $as_ref(&self) -> Option<&$ty> {
                    match self {
                        Column::$variant(col) => Some(col),
                        _ => None,
                    }
                }

                pub fn $as_mut(&mut self) -> Option<&mut $ty> {
                    match self {
                        Column::$variant(col) => Some(col),
                        _ => None,
                    }
                }
            )*
        }
    };
}

impl_narrow! {
    as_int8, as_int8_mut: Int8 => VectorColumn<i8>;
    as_int16, as_int16_mut: Int16 => VectorColumn<i16>;
    as_int32, as_int32_mut: Int32 => VectorColumn<i32>;
    as_int64, as_int64_mut: Int64 => VectorColumn<i64>;
    as_uint8, as_uint8_mut: UInt8 => VectorColumn<u8>;
    as_uint16, as_uint16_mut: UInt16 => VectorColumn<u16>;
    as_uint32, as_uint32_mut: UInt32 => VectorColumn<u32>;
    as_uint64, as_uint64_mut: UInt64 => VectorColumn<u64>;
    as_float32, as_float32_mut: Float32 => VectorColumn<f32>;
    as_float64, as_float64_mut: Float64 => VectorColumn<f64>;
    as_string, as_string_mut: String => StringColumn;
    as_fixed_string, as_fixed_string_mut: FixedString => FixedStringColumn;
    as_date, as_date_mut: Date => DateColumn;
    as_datetime, as_datetime_mut: DateTime => DateTimeColumn;
    as_array, as_array_mut: Array => ArrayColumn;
    as_nullable, as_nullable_mut: Nullable => NullableColumn;
    as_enum8, as_enum8_mut: Enum8 => Enum8Column;
    as_enum16, as_enum16_mut: Enum16 => Enum16Column;
}

macro_rules! impl_from_column {
    ($($ty:ty => $variant:ident;)*) => {$(
        impl From<$ty> for Column {
            fn from(column: $ty) -> Self {
                Column::$variant(column)
            }
        }
    )*};
}

impl_from_column! {
    VectorColumn<i8> => Int8;
    VectorColumn<i16> => Int16;
    VectorColumn<i32> => Int32;
    VectorColumn<i64> => Int64;
    VectorColumn<u8> => UInt8;
    VectorColumn<u16> => UInt16;
    VectorColumn<u32> => UInt32;
    VectorColumn<u64> => UInt64;
    VectorColumn<f32> => Float32;
    VectorColumn<f64> => Float64;
    StringColumn => String;
    FixedStringColumn => FixedString;
    DateColumn => Date;
    DateTimeColumn => DateTime;
    ArrayColumn => Array;
    NullableColumn => Nullable;
    Enum8Column => Enum8;
    Enum16Column => Enum16;
}

fn enum_name(name: Vec<u8>) -> Result<String> {
    String::from_utf8(name).map_err(|_| Error::invalid("enum name is not valid UTF-8"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{parse, EnumItem, EnumItems};

    #[test]
    fn test_with_type_matches_descriptor() {
        for name in [
            "Int8",
            "UInt64",
            "Float64",
            "String",
            "FixedString(8)",
            "Date",
            "DateTime",
            "Array(Array(UInt32))",
            "Nullable(String)",
            "Enum8('One'=1)",
            "Enum16('Big'=1000)",
        ] {
            let ty = parse(name).unwrap();
            let column = Column::with_type(&ty).unwrap();
            assert_eq!(column.column_type(), ty);
            assert_eq!(column.len(), 0);
        }
    }

    #[test]
    fn test_append_type_mismatch() {
        let mut col = Column::UInt64(VectorColumn::new());
        let other = Column::Int64(VectorColumn::new());
        assert!(matches!(
            col.append(&other),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_append_same_type() {
        let mut col = Column::UInt64([1u64, 2].into_iter().collect());
        let other = Column::UInt64([3u64].into_iter().collect());
        col.append(&other).unwrap();
        assert_eq!(col.as_uint64().unwrap().data(), [1, 2, 3]);
    }

    #[test]
    fn test_append_checks_fixed_string_width() {
        let mut col = Column::FixedString(FixedStringColumn::new(4).unwrap());
        let other = Column::FixedString(FixedStringColumn::new(8).unwrap());
        assert!(col.append(&other).is_err());
    }

    #[test]
    fn test_push_value_dispatch() {
        let mut col = Column::with_type(&parse("Array(UInt64)").unwrap()).unwrap();
        col.push_value(Value::Array(vec![Value::UInt64(1), Value::UInt64(2)]))
            .unwrap();
        col.push_value(Value::Array(vec![])).unwrap();
        assert_eq!(col.len(), 2);
        assert_eq!(col.element_count(0), 2);
        assert_eq!(
            col.value_at(0).unwrap(),
            Value::Array(vec![Value::UInt64(1), Value::UInt64(2)])
        );

        assert!(col.push_value(Value::UInt64(3)).is_err());
        assert!(col
            .push_value(Value::Array(vec![Value::Int8(1)]))
            .is_err());
        assert_eq!(col.len(), 2);
    }

    #[test]
    fn test_push_value_enum() {
        let items =
            EnumItems::new(vec![EnumItem::new("One", 1), EnumItem::new("Two", 2)]).unwrap();
        let mut col = Column::Enum8(EnumColumn::new(items).unwrap());
        col.push_value(Value::from("One")).unwrap();
        col.push_value(Value::Int8(2)).unwrap();
        assert!(col.push_value(Value::from("Three")).is_err());
        assert!(col.push_value(Value::Int8(9)).is_err());
        assert_eq!(col.value_at(0).unwrap(), Value::from("One"));
        assert_eq!(col.value_at(1).unwrap(), Value::from("Two"));
    }

    #[test]
    fn test_push_default_keeps_nullable_in_sync() {
        let mut col = Column::with_type(&parse("Nullable(UInt64)").unwrap()).unwrap();
        col.push_default();
        let nullable = col.as_nullable().unwrap();
        assert_eq!(nullable.len(), 1);
        assert_eq!(nullable.nested().len(), 1);
        assert_eq!(nullable.is_null(0), Ok(true));
    }

    #[test]
    fn test_slice_of_non_array_matches_save() {
        let col = Column::String(["a", "bb", "ccc"].into_iter().collect::<StringColumn>());
        let mut whole = vec![];
        col.save(&mut whole);
        let mut sliced = vec![];
        col.slice(0, col.len()).save(&mut sliced);
        assert_eq!(whole, sliced);
    }

    #[test]
    fn test_element_count_scalar() {
        let col = Column::UInt8([1u8, 2].into_iter().collect());
        assert_eq!(col.element_count(0), 1);
    }
}
