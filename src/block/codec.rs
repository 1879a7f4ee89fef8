// Copyright 2022 RisingLight Project Authors. Licensed under Apache-2.0.

//! The block wire frame.
//!
//! ```plain
//! | info fields ... 0 | varuint columns | varuint rows | per-column sections |
//! ```
//!
//! Each column section is a length-prefixed name, a length-prefixed canonical
//! type name, and the column body. The info header is a tagged field list:
//! field 1 is `is_overflows: u8`, field 2 is `bucket_num: i32`, field 0
//! terminates.

use bytes::{Buf, BufMut};
use tracing::trace;

use super::{Block, BlockColumn};
use crate::column::Column;
use crate::{types, wire, Error, Result};

const INFO_FIELD_STOP: u64 = 0;
const INFO_FIELD_IS_OVERFLOWS: u64 = 1;
const INFO_FIELD_BUCKET_NUM: u64 = 2;

impl Block {
    /// Encodes the whole block frame. Info fields still at their defaults
    /// are omitted.
    pub fn save(&self, output: &mut impl BufMut) {
        if self.info.is_overflows {
            wire::put_uvarint(&mut *output, INFO_FIELD_IS_OVERFLOWS);
            output.put_u8(1);
        }
        if self.info.bucket_num != -1 {
            wire::put_uvarint(&mut *output, INFO_FIELD_BUCKET_NUM);
            output.put_i32_le(self.info.bucket_num);
        }
        wire::put_uvarint(&mut *output, INFO_FIELD_STOP);

        wire::put_uvarint(&mut *output, self.columns.len() as u64);
        wire::put_uvarint(&mut *output, self.rows as u64);

        for BlockColumn { name, column } in &self.columns {
            wire::put_string(&mut *output, name.as_bytes());
            wire::put_string(&mut *output, column.column_type().name().as_bytes());
            column.save(&mut *output);
        }
    }

    /// Decodes one block frame into `self`.
    ///
    /// Column slots are reused when their position already holds a column of
    /// the announced type, so feeding consecutive result fragments into one
    /// block accumulates rows (array offsets are rebased on the way). A frame
    /// with zero columns is the server's end-of-stream marker and leaves the
    /// columns untouched.
    ///
    /// On error the block's contents are unspecified; decode into a fresh or
    /// cleared block to retry.
    pub fn load(&mut self, input: &mut impl Buf) -> Result<()> {
        self.load_info(&mut *input)?;

        let column_count = wire::get_uvarint(&mut *input)? as usize;
        let row_count = wire::get_uvarint(&mut *input)? as usize;
        trace!(columns = column_count, rows = row_count, "read block header");
        if column_count == 0 {
            return Ok(());
        }

        for idx in 0..column_count {
            let name = string_field(&mut *input, "column name")?;
            let type_name = string_field(&mut *input, "column type name")?;
            let ty = types::parse(&type_name)?;

            match self.columns.get_mut(idx) {
                Some(slot) if slot.column.column_type() == ty => {}
                Some(slot) => slot.column = Column::with_type(&ty)?,
                None => self.columns.push(BlockColumn {
                    name: String::new(),
                    column: Column::with_type(&ty)?,
                }),
            }

            let slot = &mut self.columns[idx];
            if !slot.column.load(&mut *input, row_count) {
                return Err(Error::Truncated);
            }
            slot.name = name;
            trace!(
                column = %slot.name,
                ty = %ty,
                rows = slot.column.len(),
                "loaded column"
            );
        }

        // A previous, wider frame may have left stale columns behind.
        self.columns.truncate(column_count);
        self.rows = self.columns[0].column.len();
        Ok(())
    }

    fn load_info(&mut self, input: &mut impl Buf) -> Result<()> {
        loop {
            match wire::get_uvarint(&mut *input)? {
                INFO_FIELD_STOP => return Ok(()),
                INFO_FIELD_IS_OVERFLOWS => {
                    let flag: u8 = wire::get_primitive(&mut *input).ok_or(Error::Truncated)?;
                    self.info.is_overflows = flag != 0;
                }
                INFO_FIELD_BUCKET_NUM => {
                    self.info.bucket_num =
                        wire::get_primitive(&mut *input).ok_or(Error::Truncated)?;
                }
                field => {
                    // Best effort: assume unknown fields are varuint-sized.
                    let value = wire::get_uvarint(&mut *input)?;
                    trace!(field, value, "skipped unknown block info field");
                }
            }
        }
    }
}

fn string_field(input: &mut impl Buf, what: &str) -> Result<String> {
    String::from_utf8(wire::get_string(&mut *input)?)
        .map_err(|_| Error::malformed(format!("{what} is not valid UTF-8")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{StringColumn, VectorColumn};
    use crate::value::Value;

    fn roundtrip(block: &Block) -> Block {
        let mut buf = vec![];
        block.save(&mut buf);
        let mut decoded = Block::new();
        let mut input = &buf[..];
        decoded.load(&mut input).unwrap();
        assert!(input.is_empty(), "decode must consume the whole frame");
        decoded
    }

    #[test]
    fn test_empty_block_frame() {
        let block = Block::new();
        let mut buf = vec![];
        block.save(&mut buf);
        assert_eq!(buf, [0, 0, 0]);

        let decoded = roundtrip(&block);
        assert_eq!(decoded.column_count(), 0);
        assert_eq!(decoded.row_count(), 0);
    }

    #[test]
    fn test_block_roundtrip() {
        let mut block = Block::new();
        block
            .append_column("id", Column::UInt64([1u64, 3, 5, 7].into_iter().collect()))
            .unwrap();
        block
            .append_column(
                "name",
                Column::String(["id", "foo", "bar", "name"].into_iter().collect()),
            )
            .unwrap();

        let decoded = roundtrip(&block);
        assert_eq!(decoded, block);
        assert_eq!(decoded.row_count(), 4);
        assert_eq!(decoded.column_name(0), Ok("id"));
    }

    #[test]
    fn test_info_header_roundtrip() {
        let mut block = Block::new();
        block.info_mut().is_overflows = true;
        block.info_mut().bucket_num = 42;
        let decoded = roundtrip(&block);
        assert!(decoded.info().is_overflows);
        assert_eq!(decoded.info().bucket_num, 42);
    }

    #[test]
    fn test_unknown_info_field_is_skipped() {
        let mut buf = vec![];
        wire::put_uvarint(&mut buf, 9);
        wire::put_uvarint(&mut buf, 1234);
        wire::put_uvarint(&mut buf, 0);
        wire::put_uvarint(&mut buf, 0);
        wire::put_uvarint(&mut buf, 0);

        let mut block = Block::new();
        let mut input = &buf[..];
        block.load(&mut input).unwrap();
        assert_eq!(block.info(), &crate::block::BlockInfo::default());
    }

    #[test]
    fn test_load_reuses_columns_and_accumulates() {
        let mut fragment = Block::new();
        fragment
            .append_column("id", Column::UInt64([1u64, 3].into_iter().collect()))
            .unwrap();
        let mut buf = vec![];
        fragment.save(&mut buf);

        let mut block = Block::new();
        let mut input = &buf[..];
        block.load(&mut input).unwrap();
        let mut input = &buf[..];
        block.load(&mut input).unwrap();

        assert_eq!(block.row_count(), 4);
        assert_eq!(
            block.column(0).unwrap().as_uint64().unwrap().data(),
            [1, 3, 1, 3]
        );
    }

    #[test]
    fn test_trailing_empty_block_preserves_accumulated_rows() {
        let mut fragment = Block::new();
        fragment
            .append_column("id", Column::UInt64([1u64].into_iter().collect()))
            .unwrap();
        let mut buf = vec![];
        fragment.save(&mut buf);

        let mut block = Block::new();
        let mut input = &buf[..];
        block.load(&mut input).unwrap();

        let mut end = vec![];
        Block::new().save(&mut end);
        let mut input = &end[..];
        block.load(&mut input).unwrap();
        assert_eq!(block.column_count(), 1);
        assert_eq!(block.row_count(), 1);
    }

    #[test]
    fn test_load_replaces_mismatched_slot() {
        let mut first = Block::new();
        first
            .append_column("v", Column::UInt64([7u64].into_iter().collect()))
            .unwrap();
        let mut buf = vec![];
        first.save(&mut buf);

        let mut block = Block::new();
        block
            .append_column("v", Column::String(StringColumn::new()))
            .unwrap();
        let mut input = &buf[..];
        block.load(&mut input).unwrap();
        assert_eq!(block.column(0).unwrap().column_type().name(), "UInt64");
        assert_eq!(block.row_count(), 1);
    }

    #[test]
    fn test_truncated_body() {
        let mut block = Block::new();
        block
            .append_column("id", Column::UInt64([1u64, 3].into_iter().collect()))
            .unwrap();
        let mut buf = vec![];
        block.save(&mut buf);
        buf.truncate(buf.len() - 4);

        let mut decoded = Block::new();
        let mut input = &buf[..];
        assert_eq!(decoded.load(&mut input), Err(Error::Truncated));
    }

    #[test]
    fn test_bad_type_name() {
        let mut buf = vec![];
        wire::put_uvarint(&mut buf, 0);
        wire::put_uvarint(&mut buf, 1);
        wire::put_uvarint(&mut buf, 0);
        wire::put_string(&mut buf, b"v");
        wire::put_string(&mut buf, b"NotAType");

        let mut decoded = Block::new();
        let mut input = &buf[..];
        assert!(matches!(
            decoded.load(&mut input),
            Err(Error::MalformedWire(_))
        ));
    }

    #[test]
    fn test_nested_column_roundtrip() {
        let mut array = crate::column::ArrayColumn::new(Column::String(StringColumn::new()));
        array
            .push_column(Column::String(["a", "b"].into_iter().collect()))
            .unwrap();
        array
            .push_column(Column::String(StringColumn::new()))
            .unwrap();

        let mut nullable =
            crate::column::NullableColumn::new(Column::UInt32(VectorColumn::new()));
        nullable.push_value(Value::UInt32(1)).unwrap();
        nullable.push_null();

        let mut block = Block::new();
        block.append_column("tags", Column::Array(array)).unwrap();
        block
            .append_column("maybe", Column::Nullable(nullable))
            .unwrap();

        let decoded = roundtrip(&block);
        assert_eq!(decoded, block);
        assert_eq!(
            decoded.column_name(0).unwrap(),
            "tags"
        );
        assert_eq!(
            decoded.column(0).unwrap().column_type().name(),
            "Array(String)"
        );
    }
}
