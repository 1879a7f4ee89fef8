// Copyright 2022 RisingLight Project Authors. Licensed under Apache-2.0.

//! Wire primitives shared by the column and block codecs.
//!
//! The native protocol is little-endian throughout: fixed-width scalars are
//! two's-complement / IEEE-754, unsigned integers of unknown magnitude are
//! LEB128 varuints, and strings are a varuint length followed by raw bytes.
//! Readers are [`Buf`], writers are [`BufMut`]; the transport hands the codec
//! the uncompressed bytes of one block at a time.

use bytes::{Buf, BufMut};

use crate::{Error, Result};

/// A varuint terminates within 10 bytes or the stream is malformed.
pub const MAX_VARUINT_BYTES: usize = 10;

/// A fixed-width scalar with a little-endian wire encoding.
pub trait Primitive:
    Copy + Default + PartialEq + std::fmt::Debug + Send + Sync + 'static
{
    /// Width of the encoded value in bytes.
    const WIDTH: usize;

    /// Encode the value to the end of `output`.
    fn put(self, output: &mut impl BufMut);

    /// Decode one value. The caller must have checked `remaining()`.
    fn get(input: &mut impl Buf) -> Self;
}

macro_rules! impl_primitive {
    ($($ty:ty: $put:ident, $get:ident;)*) => {$(
        impl Primitive for $ty {
            const WIDTH: usize = std::mem::size_of::<$ty>();

            fn put(self, output: &mut impl BufMut) {
                output.$put(self);
            }

            fn get(input: &mut impl Buf) -> Self {
                input.$get()
            }
        }
    )*};
}

impl_primitive! {
    i8: put_i8, get_i8;
    i16: put_i16_le, get_i16_le;
    i32: put_i32_le, get_i32_le;
    i64: put_i64_le, get_i64_le;
    u8: put_u8, get_u8;
    u16: put_u16_le, get_u16_le;
    u32: put_u32_le, get_u32_le;
    u64: put_u64_le, get_u64_le;
    f32: put_f32_le, get_f32_le;
    f64: put_f64_le, get_f64_le;
}

/// Decode one scalar, or `None` if the stream runs short.
pub fn get_primitive<T: Primitive>(input: &mut impl Buf) -> Option<T> {
    if input.remaining() < T::WIDTH {
        return None;
    }
    Some(T::get(input))
}

/// Encode an unsigned LEB128 varuint: 7 payload bits per byte, MSB set on
/// every byte but the last.
pub fn put_uvarint(output: &mut impl BufMut, mut value: u64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            output.put_u8(byte);
            return;
        }
        output.put_u8(byte | 0x80);
    }
}

/// Decode an unsigned LEB128 varuint.
pub fn get_uvarint(input: &mut impl Buf) -> Result<u64> {
    let mut value = 0u64;
    for group in 0..MAX_VARUINT_BYTES {
        if !input.has_remaining() {
            return Err(Error::Truncated);
        }
        let byte = input.get_u8();
        value |= u64::from(byte & 0x7f) << (7 * group);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(Error::malformed(format!(
        "varuint not terminated within {MAX_VARUINT_BYTES} bytes"
    )))
}

/// Encode a length-prefixed byte string.
pub fn put_string(output: &mut impl BufMut, bytes: &[u8]) {
    put_uvarint(&mut *output, bytes.len() as u64);
    output.put_slice(bytes);
}

/// Decode a length-prefixed byte string.
pub fn get_string(input: &mut impl Buf) -> Result<Vec<u8>> {
    let len = get_uvarint(&mut *input)? as usize;
    if input.remaining() < len {
        return Err(Error::Truncated);
    }
    let mut bytes = vec![0u8; len];
    input.copy_to_slice(&mut bytes);
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uvarint_roundtrip() {
        for value in [0u64, 1, 127, 128, 300, 16383, 16384, u64::MAX] {
            let mut buf = vec![];
            put_uvarint(&mut buf, value);
            let mut input = &buf[..];
            assert_eq!(get_uvarint(&mut input).unwrap(), value);
            assert!(input.is_empty());
        }
    }

    #[test]
    fn test_uvarint_single_byte_values() {
        let mut buf = vec![];
        put_uvarint(&mut buf, 5);
        assert_eq!(buf, [0x05]);

        let mut buf = vec![];
        put_uvarint(&mut buf, 300);
        assert_eq!(buf, [0xac, 0x02]);
    }

    #[test]
    fn test_uvarint_overlong() {
        let buf = [0xff; 11];
        let mut input = &buf[..];
        assert_eq!(
            get_uvarint(&mut input),
            Err(Error::malformed(
                "varuint not terminated within 10 bytes".to_string()
            ))
        );
    }

    #[test]
    fn test_uvarint_truncated() {
        let buf = [0x80, 0x80];
        let mut input = &buf[..];
        assert_eq!(get_uvarint(&mut input), Err(Error::Truncated));
    }

    #[test]
    fn test_string_roundtrip() {
        let mut buf = vec![];
        put_string(&mut buf, b"name");
        assert_eq!(buf, [0x04, b'n', b'a', b'm', b'e']);

        let mut input = &buf[..];
        assert_eq!(get_string(&mut input).unwrap(), b"name");
    }

    #[test]
    fn test_string_truncated() {
        let buf = [0x04, b'n', b'a'];
        let mut input = &buf[..];
        assert_eq!(get_string(&mut input), Err(Error::Truncated));
    }

    #[test]
    fn test_primitive_little_endian() {
        let mut buf = vec![];
        0x0102_0304u32.put(&mut buf);
        assert_eq!(buf, [0x04, 0x03, 0x02, 0x01]);

        let mut input = &buf[..];
        assert_eq!(get_primitive::<u32>(&mut input), Some(0x0102_0304));
        assert_eq!(get_primitive::<u32>(&mut input), None);
    }
}
