//! Typed decoding of values at buffer positions.
//!
//! [`Follow`] describes how to turn a position in a finished buffer into a value
//! without copying: scalars are decoded, strings and byte strings are borrowed
//! from the buffer, tables and vectors become thin views. [`ForwardsOffset`]
//! composes with any of them to first follow a stored `u32` offset.

use std::marker::PhantomData;

use tablebuf_common::{Result, error::Error};

use crate::codec::{SIZE_UOFFSET, Scalar, Struct, read_scalar, read_struct, resolve, slice_at};

/// Decodes a value of some wire type located at a buffer position.
pub trait Follow<'a> {
    /// The decoded (usually borrowed) representation.
    type Inner;

    fn follow(buf: &'a [u8], position: usize) -> Result<Self::Inner>;
}

/// A wire type with a fixed inline footprint, usable as a vector element.
pub trait Inline {
    /// Element stride in bytes.
    const SIZE: usize;
}

macro_rules! impl_follow_scalar {
    ($($ty:ty),*) => {
        $(
            impl<'a> Follow<'a> for $ty {
                type Inner = $ty;

                #[inline]
                fn follow(buf: &'a [u8], position: usize) -> Result<$ty> {
                    read_scalar::<$ty>(buf, position)
                }
            }

            impl Inline for $ty {
                const SIZE: usize = <$ty as Scalar>::SIZE;
            }
        )*
    };
}

impl_follow_scalar!(bool, u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

/// A `u32` offset stored inline that refers forward to a `T`.
pub struct ForwardsOffset<T>(PhantomData<T>);

impl<'a, T: Follow<'a>> Follow<'a> for ForwardsOffset<T> {
    type Inner = T::Inner;

    #[inline]
    fn follow(buf: &'a [u8], position: usize) -> Result<T::Inner> {
        T::follow(buf, resolve(buf, position)?)
    }
}

impl<T> Inline for ForwardsOffset<T> {
    const SIZE: usize = SIZE_UOFFSET;
}

/// A fixed-layout struct stored inline.
pub struct Packed<S>(PhantomData<S>);

impl<'a, S: Struct> Follow<'a> for Packed<S> {
    type Inner = S;

    #[inline]
    fn follow(buf: &'a [u8], position: usize) -> Result<S> {
        read_struct::<S>(buf, position)
    }
}

impl<S: Struct> Inline for Packed<S> {
    const SIZE: usize = S::SIZE;
}

/// Reads the `[len: u32][bytes]` payload shared by strings and byte strings.
#[inline]
fn follow_byte_string(buf: &[u8], position: usize) -> Result<&[u8]> {
    let len = read_scalar::<u32>(buf, position)? as usize;
    slice_at(buf, position + SIZE_UOFFSET, len)
}

impl<'a> Follow<'a> for &'a str {
    type Inner = &'a str;

    #[inline]
    fn follow(buf: &'a [u8], position: usize) -> Result<&'a str> {
        let bytes = follow_byte_string(buf, position)?;
        std::str::from_utf8(bytes).map_err(|e| Error::invalid_utf8(position, e))
    }
}

impl<'a> Follow<'a> for &'a [u8] {
    type Inner = &'a [u8];

    #[inline]
    fn follow(buf: &'a [u8], position: usize) -> Result<&'a [u8]> {
        follow_byte_string(buf, position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_follow_string() {
        // [pad][len=5]["hello"][NUL]
        let mut buf = vec![0u8; 2];
        buf.extend_from_slice(&5u32.to_le_bytes());
        buf.extend_from_slice(b"hello\0");
        assert_eq!(<&str>::follow(&buf, 2).unwrap(), "hello");
        assert_eq!(<&[u8]>::follow(&buf, 2).unwrap(), b"hello");

        // Truncated payload.
        assert!(<&str>::follow(&buf[..8], 2).unwrap_err().is_out_of_bounds());
    }

    #[test]
    fn test_follow_invalid_utf8() {
        let mut buf = 2u32.to_le_bytes().to_vec();
        buf.extend_from_slice(&[0xC3, 0x28, 0]);
        let err = <&str>::follow(&buf, 0).unwrap_err();
        assert!(matches!(
            err.kind(),
            tablebuf_common::error::ErrorKind::InvalidUtf8 { position: 0, .. }
        ));
        assert_eq!(<&[u8]>::follow(&buf, 0).unwrap(), &[0xC3, 0x28]);
    }

    #[test]
    fn test_follow_forwards_offset() {
        // Offset at 0 pointing to a u16 at 8.
        let mut buf = vec![0u8; 10];
        buf[0..4].copy_from_slice(&8u32.to_le_bytes());
        buf[8..10].copy_from_slice(&0xBEEFu16.to_le_bytes());
        assert_eq!(ForwardsOffset::<u16>::follow(&buf, 0).unwrap(), 0xBEEF);
        assert_eq!(<ForwardsOffset<u16> as Inline>::SIZE, 4);
    }
}
