// Copyright 2022 RisingLight Project Authors. Licensed under Apache-2.0.

use std::borrow::Cow;

use bytes::{Buf, BufMut};

use crate::{wire, Error, Result};

/// A column of variable-length byte strings.
///
/// Values live in one flat buffer addressed by an offsets vector (with a
/// leading 0 sentinel), so `clear` resets the row count while keeping both
/// allocations for the next load.
///
/// The wire body is `rows` length-prefixed strings.
#[derive(Debug, Clone, PartialEq)]
pub struct StringColumn {
    offsets: Vec<usize>,
    data: Vec<u8>,
}

impl Default for StringColumn {
    fn default() -> Self {
        Self::new()
    }
}

impl StringColumn {
    pub fn new() -> Self {
        StringColumn {
            offsets: vec![0],
            data: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends one byte string to the end of the column.
    pub fn push(&mut self, value: impl AsRef<[u8]>) {
        self.data.extend_from_slice(value.as_ref());
        self.offsets.push(self.data.len());
    }

    /// Returns the bytes at the given row number.
    pub fn at(&self, n: usize) -> Result<&[u8]> {
        if n >= self.len() {
            return Err(Error::out_of_range("row", n, self.len()));
        }
        Ok(&self.data[self.offsets[n]..self.offsets[n + 1]])
    }

    /// Returns the row as text, replacing invalid UTF-8.
    pub fn str_at(&self, n: usize) -> Result<Cow<'_, str>> {
        Ok(String::from_utf8_lossy(self.at(n)?))
    }

    pub fn append(&mut self, other: &Self) {
        let base = self.data.len();
        self.data.extend_from_slice(&other.data);
        self.offsets
            .extend(other.offsets[1..].iter().map(|end| base + end));
    }

    pub fn slice(&self, begin: usize, len: usize) -> Self {
        let begin = begin.min(self.len());
        let end = begin + len.min(self.len() - begin);
        let lo = self.offsets[begin];
        StringColumn {
            data: self.data[lo..self.offsets[end]].to_vec(),
            offsets: self.offsets[begin..=end].iter().map(|o| o - lo).collect(),
        }
    }

    pub fn clear(&mut self) {
        self.offsets.truncate(1);
        self.data.clear();
    }

    pub fn reserve(&mut self, rows: usize) {
        self.offsets.reserve(rows);
    }

    pub(crate) fn clone_empty(&self) -> Self {
        Self::new()
    }

    pub fn load(&mut self, input: &mut impl Buf, rows: usize) -> bool {
        for _ in 0..rows {
            let Ok(len) = wire::get_uvarint(&mut *input) else {
                return false;
            };
            let len = len as usize;
            if input.remaining() < len {
                return false;
            }
            let start = self.data.len();
            self.data.resize(start + len, 0);
            input.copy_to_slice(&mut self.data[start..]);
            self.offsets.push(self.data.len());
        }
        true
    }

    pub fn save(&self, output: &mut impl BufMut) {
        for n in 0..self.len() {
            wire::put_string(&mut *output, &self.data[self.offsets[n]..self.offsets[n + 1]]);
        }
    }
}

impl<S: AsRef<[u8]>> FromIterator<S> for StringColumn {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut column = StringColumn::new();
        for value in iter {
            column.push(value);
        }
        column
    }
}

/// A column of fixed-width byte strings, stored as one contiguous buffer of
/// `len * width` bytes. Short values are right-padded with `\0`, long values
/// are truncated to `width`.
///
/// The wire body is the raw buffer, with no per-row terminators.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedStringColumn {
    width: usize,
    data: Vec<u8>,
}

impl FixedStringColumn {
    /// Creates a column of strings of exactly `width` bytes; `width` must be
    /// at least 1.
    pub fn new(width: usize) -> Result<Self> {
        if width == 0 {
            return Err(Error::invalid("FixedString width must be at least 1"));
        }
        Ok(FixedStringColumn {
            width,
            data: Vec::new(),
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn len(&self) -> usize {
        self.data.len() / self.width
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Appends one value, truncating or zero-padding to the column width.
    pub fn push(&mut self, value: impl AsRef<[u8]>) {
        let value = value.as_ref();
        let take = value.len().min(self.width);
        self.data.extend_from_slice(&value[..take]);
        self.data.resize(self.data.len() + (self.width - take), 0);
    }

    /// Returns the padded bytes at the given row number, exactly `width` long.
    pub fn at(&self, n: usize) -> Result<&[u8]> {
        if n >= self.len() {
            return Err(Error::out_of_range("row", n, self.len()));
        }
        Ok(&self.data[n * self.width..(n + 1) * self.width])
    }

    /// The whole column as a contiguous buffer, for zero-copy readers.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn append(&mut self, other: &Self) {
        self.data.extend_from_slice(&other.data);
    }

    pub fn slice(&self, begin: usize, len: usize) -> Self {
        let begin = begin.min(self.len());
        let end = begin + len.min(self.len() - begin);
        FixedStringColumn {
            width: self.width,
            data: self.data[begin * self.width..end * self.width].to_vec(),
        }
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    pub fn reserve(&mut self, rows: usize) {
        self.data.reserve(rows * self.width);
    }

    pub(crate) fn clone_empty(&self) -> Self {
        FixedStringColumn {
            width: self.width,
            data: Vec::new(),
        }
    }

    /// Decodes `rows * width` raw bytes, appending to the tail of the buffer.
    pub fn load(&mut self, input: &mut impl Buf, rows: usize) -> bool {
        for _ in 0..rows {
            if input.remaining() < self.width {
                return false;
            }
            let start = self.data.len();
            self.data.resize(start + self.width, 0);
            input.copy_to_slice(&mut self.data[start..]);
        }
        true
    }

    pub fn save(&self, output: &mut impl BufMut) {
        output.put_slice(&self.data);
    }
}
