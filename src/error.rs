// Copyright 2022 RisingLight Project Authors. Licensed under Apache-2.0.

use thiserror::Error;

/// The error type of all fallible operations in this crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{what} index {index} out of range (size {size})")]
    OutOfRange {
        what: &'static str,
        index: usize,
        size: usize,
    },

    #[error("unsupported: {0}")]
    Unsupported(&'static str),

    #[error("malformed wire data: {0}")]
    MalformedWire(String),

    #[error("unexpected end of stream")]
    Truncated,
}

impl Error {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidArgument(message.into())
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Error::MalformedWire(message.into())
    }

    pub(crate) fn out_of_range(what: &'static str, index: usize, size: usize) -> Self {
        Error::OutOfRange { what, index, size }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
