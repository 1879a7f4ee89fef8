// Copyright 2022 RisingLight Project Authors. Licensed under Apache-2.0.

//! Blocks: the protocol's unit of transmission.
//!
//! A [`Block`] is an ordered collection of named columns that all hold the
//! same number of rows, plus a small info header. Inserts build a block and
//! send it; selects decode the server's stream into one block per result
//! fragment.

use smallvec::SmallVec;

use crate::column::Column;
use crate::types::Type;
use crate::{Error, Result};

mod codec;

/// The two header fields the server attaches to every block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockInfo {
    pub is_overflows: bool,
    pub bucket_num: i32,
}

impl Default for BlockInfo {
    fn default() -> Self {
        BlockInfo {
            is_overflows: false,
            bucket_num: -1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct BlockColumn {
    name: String,
    column: Column,
}

/// A named, equal-length collection of columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    info: BlockInfo,
    columns: SmallVec<[BlockColumn; 8]>,
    rows: usize,
}

impl Block {
    pub fn new() -> Block {
        Block::default()
    }

    pub fn info(&self) -> &BlockInfo {
        &self.info
    }

    pub fn info_mut(&mut self) -> &mut BlockInfo {
        &mut self.info
    }

    /// Appends a named column. The first column fixes the block's row count;
    /// every further column must match it.
    pub fn append_column(&mut self, name: impl Into<String>, column: Column) -> Result<()> {
        if self.columns.is_empty() {
            self.rows = column.len();
        } else if column.len() != self.rows {
            return Err(Error::invalid(
                "all columns in block must have same count of rows",
            ));
        }
        self.columns.push(BlockColumn {
            name: name.into(),
            column,
        });
        Ok(())
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn column(&self, idx: usize) -> Result<&Column> {
        self.columns
            .get(idx)
            .map(|entry| &entry.column)
            .ok_or_else(|| Error::out_of_range("column", idx, self.columns.len()))
    }

    pub fn column_mut(&mut self, idx: usize) -> Result<&mut Column> {
        let size = self.columns.len();
        self.columns
            .get_mut(idx)
            .map(|entry| &mut entry.column)
            .ok_or_else(|| Error::out_of_range("column", idx, size))
    }

    pub fn column_name(&self, idx: usize) -> Result<&str> {
        self.columns
            .get(idx)
            .map(|entry| entry.name.as_str())
            .ok_or_else(|| Error::out_of_range("column", idx, self.columns.len()))
    }

    pub(crate) fn set_column_name(&mut self, idx: usize, name: &str) {
        self.columns[idx].name.clear();
        self.columns[idx].name.push_str(name);
    }

    /// Recomputes the cached row count from the columns, e.g. after rows were
    /// pushed through [`column_mut`](Self::column_mut) while building an
    /// insert. Fails if the columns disagree.
    pub fn refresh_row_count(&mut self) -> Result<()> {
        let mut rows = None;
        for entry in &self.columns {
            match rows {
                None => rows = Some(entry.column.len()),
                Some(expected) if entry.column.len() != expected => {
                    return Err(Error::invalid(
                        "all columns in block must have same count of rows",
                    ));
                }
                Some(_) => {}
            }
        }
        self.rows = rows.unwrap_or(0);
        Ok(())
    }

    /// Resets the info header and drops all rows, keeping the column slots
    /// (and their allocations) so the block can be reused across result
    /// fragments.
    pub fn clear(&mut self) {
        self.info = BlockInfo::default();
        self.rows = 0;
        for entry in &mut self.columns {
            entry.name.clear();
            entry.column.clear();
        }
    }

    /// Forwards a capacity hint to every column.
    pub fn reserve_rows(&mut self, rows: usize) {
        for entry in &mut self.columns {
            entry.column.reserve(rows);
        }
    }

    /// Iterates over `(name, type, column)` in insertion order.
    pub fn iter(&self) -> BlockIter<'_> {
        BlockIter {
            entries: self.columns.iter(),
        }
    }
}

pub struct BlockIter<'a> {
    entries: std::slice::Iter<'a, BlockColumn>,
}

impl<'a> Iterator for BlockIter<'a> {
    type Item = (&'a str, Type, &'a Column);

    fn next(&mut self) -> Option<Self::Item> {
        self.entries
            .next()
            .map(|entry| (entry.name.as_str(), entry.column.column_type(), &entry.column))
    }
}

impl<'a> IntoIterator for &'a Block {
    type Item = (&'a str, Type, &'a Column);
    type IntoIter = BlockIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
