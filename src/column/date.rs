// Copyright 2022 RisingLight Project Authors. Licensed under Apache-2.0.

use bytes::{Buf, BufMut};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

use super::vector::VectorColumn;
use crate::Result;

const SECONDS_PER_DAY: i64 = 86_400;

fn unix_epoch_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).expect("1970-01-01 is a valid date")
}

/// A column of dates, stored as `u16` days since the Unix epoch.
///
/// The wire body is the inner `UInt16` column unchanged; conversion to and
/// from absolute time happens only on the accessors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DateColumn {
    data: VectorColumn<u16>,
}

impl DateColumn {
    pub fn new() -> Self {
        DateColumn {
            data: VectorColumn::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Appends a raw day count.
    pub fn push_days(&mut self, days: u16) {
        self.data.push(days);
    }

    /// Appends seconds since the Unix epoch, truncated to whole days.
    pub fn push_time(&mut self, seconds: i64) {
        self.data.push((seconds / SECONDS_PER_DAY) as u16);
    }

    pub fn push_date(&mut self, date: NaiveDate) {
        self.data
            .push((date - unix_epoch_date()).num_days() as u16);
    }

    pub fn days_at(&self, n: usize) -> Result<u16> {
        self.data.at(n)
    }

    /// Seconds since the Unix epoch at midnight of the stored day.
    pub fn time_at(&self, n: usize) -> Result<i64> {
        Ok(i64::from(self.data.at(n)?) * SECONDS_PER_DAY)
    }

    pub fn date_at(&self, n: usize) -> Result<NaiveDate> {
        Ok(unix_epoch_date() + Duration::days(i64::from(self.data.at(n)?)))
    }

    /// The raw day counts, for zero-copy readers.
    pub fn data(&self) -> &[u16] {
        self.data.data()
    }

    pub fn append(&mut self, other: &Self) {
        self.data.append(&other.data);
    }

    pub fn slice(&self, begin: usize, len: usize) -> Self {
        DateColumn {
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
        DateColumn::new()
    }

    pub fn load(&mut self, input: &mut impl Buf, rows: usize) -> bool {
        self.data.load(input, rows)
    }

    pub fn save(&self, output: &mut impl BufMut) {
        self.data.save(output);
    }
}

/// A column of timestamps, stored as `u32` seconds since the Unix epoch.
///
/// The wire body is the inner `UInt32` column unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DateTimeColumn {
    data: VectorColumn<u32>,
}

impl DateTimeColumn {
    pub fn new() -> Self {
        DateTimeColumn {
            data: VectorColumn::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn push_seconds(&mut self, seconds: u32) {
        self.data.push(seconds);
    }

    /// Appends seconds since the Unix epoch, truncated to the `u32` range the
    /// wire carries.
    pub fn push_time(&mut self, seconds: i64) {
        self.data.push(seconds as u32);
    }

    pub fn push_datetime(&mut self, datetime: DateTime<Utc>) {
        self.data.push(datetime.timestamp() as u32);
    }

    pub fn seconds_at(&self, n: usize) -> Result<u32> {
        self.data.at(n)
    }

    pub fn time_at(&self, n: usize) -> Result<i64> {
        Ok(i64::from(self.data.at(n)?))
    }

    pub fn datetime_at(&self, n: usize) -> Result<DateTime<Utc>> {
        let seconds = i64::from(self.data.at(n)?);
        Ok(Utc
            .timestamp_opt(seconds, 0)
            .single()
            .expect("u32 timestamp is in range"))
    }

    /// The raw second counts, for zero-copy readers.
    pub fn data(&self) -> &[u32] {
        self.data.data()
    }

    pub fn append(&mut self, other: &Self) {
        self.data.append(&other.data);
    }

    pub fn slice(&self, begin: usize, len: usize) -> Self {
        DateTimeColumn {
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
        DateTimeColumn::new()
    }

    pub fn load(&mut self, input: &mut impl Buf, rows: usize) -> bool {
        self.data.load(input, rows)
    }

    pub fn save(&self, output: &mut impl BufMut) {
        self.data.save(output);
    }
}
