// Copyright 2022 RisingLight Project Authors. Licensed under Apache-2.0.

//! Columnar data model and native wire codec for a ClickHouse-style analytic
//! database.
//!
//! The crate covers what the transport layer of a native client plugs into:
//!
//! - [`types::Type`]: descriptors for column element types, with the
//!   canonical textual form the server exchanges and a parser for it.
//! - [`Column`]: the polymorphic column family - numeric vectors, strings of
//!   fixed or variable length, dates, arrays, nullables and enums - with a
//!   uniform append/load/save/slice capability set.
//! - [`Block`]: a named, equal-length collection of columns, and its wire
//!   frame.
//! - [`wire`]: the little-endian scalar, varuint and string primitives the
//!   codecs are built from.
//!
//! Sockets, handshake, queries and compression framing live in the transport
//! layer; the codecs here run against the uncompressed bytes of one block.
//!
//! ```
//! use clickhouse_native::{Block, Column, column::VectorColumn};
//!
//! let mut ids = VectorColumn::<u64>::new();
//! ids.push(1);
//! ids.push(3);
//!
//! let mut block = Block::new();
//! block.append_column("id", Column::UInt64(ids))?;
//!
//! let mut frame = vec![];
//! block.save(&mut frame);
//!
//! let mut decoded = Block::new();
//! decoded.load(&mut &frame[..])?;
//! assert_eq!(decoded.row_count(), 2);
//! # clickhouse_native::Result::Ok(())
//! ```

#![deny(unused_must_use)]

pub mod block;
pub mod column;
mod error;
pub mod types;
pub mod value;
pub mod wire;

pub use self::block::{Block, BlockInfo};
pub use self::column::Column;
pub use self::error::{Error, Result};
pub use self::value::Value;
