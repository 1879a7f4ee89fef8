// Copyright 2022 RisingLight Project Authors. Licensed under Apache-2.0.

use bytes::{Buf, BufMut};

use super::vector::VectorColumn;
use super::Column;
use crate::types::Type;
use crate::{Error, Result};

/// A column of `Array(T)` rows.
///
/// All elements live in one inner column of type `T`; rows are delimited by
/// cumulative end-offsets. Row `i` spans inner elements
/// `offsets[i - 1]..offsets[i]`, with an implicit leading 0.
///
/// The wire body is the offsets column followed by the inner column.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayColumn {
    inner: Box<Column>,
    offsets: VectorColumn<u64>,
}

impl ArrayColumn {
    /// Creates an array column whose element type is the type of `inner`.
    /// Any rows already in `inner` are ignored until appended through the
    /// array API.
    pub fn new(inner: Column) -> Self {
        ArrayColumn {
            inner: Box::new(inner),
            offsets: VectorColumn::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn element_type(&self) -> Type {
        self.inner.column_type()
    }

    /// The column holding all rows' elements back to back.
    pub fn inner(&self) -> &Column {
        &self.inner
    }

    /// The cumulative end-offsets, one per row.
    pub fn offsets(&self) -> &[u64] {
        self.offsets.data()
    }

    /// Total element count across all rows.
    fn total_elements(&self) -> usize {
        self.offsets.data().last().copied().unwrap_or(0) as usize
    }

    /// Index of the first element of row `n` in the inner column.
    ///
    /// Panics if `n` is out of bounds.
    pub fn offset_of(&self, n: usize) -> usize {
        assert!(n < self.offsets.len(), "row {n} out of bounds");
        if n == 0 {
            0
        } else {
            self.offsets.data()[n - 1] as usize
        }
    }

    /// Number of elements in row `n`.
    ///
    /// Panics if `n` is out of bounds.
    pub fn element_count(&self, n: usize) -> usize {
        self.offsets.data()[n] as usize - self.offset_of(n)
    }

    /// Appends the whole of `column` as one array row. The column's type must
    /// equal the element type.
    pub fn push_column(&mut self, column: Column) -> Result<()> {
        if column.column_type() != self.inner.column_type() {
            return Err(Error::invalid(format!(
                "can't append column of type {} to array of {}",
                column.column_type(),
                self.inner.column_type()
            )));
        }
        let end = (self.total_elements() + column.len()) as u64;
        self.inner.append_unchecked(&column);
        self.offsets.push(end);
        Ok(())
    }

    /// Copies row `n` out as a standalone column of the element type.
    ///
    /// Panics if `n` is out of bounds. For a zero-copy read, combine
    /// [`offset_of`](Self::offset_of), [`element_count`](Self::element_count)
    /// and [`inner`](Self::inner) instead.
    pub fn row_column(&self, n: usize) -> Column {
        self.inner.slice(self.offset_of(n), self.element_count(n))
    }

    pub(crate) fn append_unchecked(&mut self, other: &Self) {
        let base = self.total_elements() as u64;
        self.inner.append_unchecked(&other.inner);
        for &end in other.offsets.data() {
            self.offsets.push(base + end);
        }
    }

    /// Copies rows `[begin, begin + len)` into a new array column; offsets of
    /// the copy are rebased to start at zero.
    pub fn slice(&self, begin: usize, len: usize) -> Self {
        let begin = begin.min(self.len());
        let len = len.min(self.len() - begin);
        if len == 0 {
            return ArrayColumn {
                inner: Box::new(self.inner.clone_empty()),
                offsets: VectorColumn::new(),
            };
        }
        let start = self.offset_of(begin);
        let end = self.offsets.data()[begin + len - 1] as usize;
        ArrayColumn {
            inner: Box::new(self.inner.slice(start, end - start)),
            offsets: self.offsets.data()[begin..begin + len]
                .iter()
                .map(|&off| off - start as u64)
                .collect(),
        }
    }

    pub fn clear(&mut self) {
        self.inner.clear();
        self.offsets.clear();
    }

    pub fn reserve(&mut self, rows: usize) {
        // Assume two elements per row.
        self.offsets.reserve(rows);
        self.inner.reserve(rows * 2);
    }

    pub(crate) fn clone_empty(&self) -> Self {
        ArrayColumn {
            inner: Box::new(self.inner.clone_empty()),
            offsets: VectorColumn::new(),
        }
    }

    pub(crate) fn push_default(&mut self) {
        self.offsets.push(self.total_elements() as u64);
    }

    /// Decodes `rows` offsets and then the elements they cover. When the
    /// column already holds rows, the new offsets are rebased onto the
    /// previous cumulative end, so repeated loads accumulate one coherent
    /// column. On `false` nothing from the failed batch is kept.
    pub fn load(&mut self, input: &mut impl Buf, rows: usize) -> bool {
        let old_offset_count = self.offsets.len();
        if !self.offsets.load(input, rows) {
            self.offsets.truncate(old_offset_count);
            return false;
        }
        let new_offset_count = self.offsets.len();
        let batch_elements = if new_offset_count > old_offset_count {
            self.offsets.data()[new_offset_count - 1] as usize
        } else {
            0
        };

        let mut batch = self.inner.clone_empty();
        if !batch.load(input, batch_elements) {
            self.offsets.truncate(old_offset_count);
            return false;
        }
        self.inner.append_unchecked(&batch);

        if old_offset_count > 0 {
            let adjust = self.offsets.data()[old_offset_count - 1];
            for end in &mut self.offsets.data_mut()[old_offset_count..] {
                *end += adjust;
            }
        }
        true
    }

    pub fn save(&self, output: &mut impl BufMut) {
        self.offsets.save(&mut *output);
        self.inner.save(&mut *output);
    }
}
