//! Fixed-width little-endian encoding of scalars and the indirect-addressing
//! primitive shared by tables, strings and vectors.

use byteorder::{ByteOrder, LittleEndian};
use tablebuf_common::{Result, error::Error};

/// Size of an unsigned forward offset (`uoffset`).
pub const SIZE_UOFFSET: usize = 4;
/// Size of the signed table-to-vtable offset (`soffset`).
pub const SIZE_SOFFSET: usize = 4;
/// Size of a vtable entry (`voffset`).
pub const SIZE_VOFFSET: usize = 2;
/// Length of the optional file identifier stored right after the root offset.
pub const FILE_IDENTIFIER_LENGTH: usize = 4;
/// Size of the vtable header: its own byte size and the table's byte size.
pub const VTABLE_HEADER_SIZE: usize = 2 * SIZE_VOFFSET;
/// Width of the largest scalar; tables start on a multiple of it.
pub const MAX_SCALAR_SIZE: usize = 8;

/// A fixed-width value stored little-endian and aligned to its own size.
pub trait Scalar: Copy + PartialEq + std::fmt::Debug + Send + Sync + 'static {
    /// Encoded width in bytes; also the required alignment.
    const SIZE: usize;

    /// Encodes `self` into the first `SIZE` bytes of `dst`.
    fn write_le(self, dst: &mut [u8]);

    /// Decodes a value from the first `SIZE` bytes of `src`.
    fn read_le(src: &[u8]) -> Self;
}

macro_rules! impl_scalar {
    ($ty:ty, $read:ident, $write:ident) => {
        impl Scalar for $ty {
            const SIZE: usize = std::mem::size_of::<$ty>();

            #[inline]
            fn write_le(self, dst: &mut [u8]) {
                LittleEndian::$write(dst, self)
            }

            #[inline]
            fn read_le(src: &[u8]) -> Self {
                LittleEndian::$read(src)
            }
        }
    };
}

impl_scalar!(u16, read_u16, write_u16);
impl_scalar!(i16, read_i16, write_i16);
impl_scalar!(u32, read_u32, write_u32);
impl_scalar!(i32, read_i32, write_i32);
impl_scalar!(u64, read_u64, write_u64);
impl_scalar!(i64, read_i64, write_i64);
impl_scalar!(f32, read_f32, write_f32);
impl_scalar!(f64, read_f64, write_f64);

impl Scalar for u8 {
    const SIZE: usize = 1;

    #[inline]
    fn write_le(self, dst: &mut [u8]) {
        dst[0] = self;
    }

    #[inline]
    fn read_le(src: &[u8]) -> Self {
        src[0]
    }
}

impl Scalar for i8 {
    const SIZE: usize = 1;

    #[inline]
    fn write_le(self, dst: &mut [u8]) {
        dst[0] = self as u8;
    }

    #[inline]
    fn read_le(src: &[u8]) -> Self {
        src[0] as i8
    }
}

impl Scalar for bool {
    const SIZE: usize = 1;

    #[inline]
    fn write_le(self, dst: &mut [u8]) {
        dst[0] = self as u8;
    }

    #[inline]
    fn read_le(src: &[u8]) -> Self {
        src[0] != 0
    }
}

/// A fixed-layout struct stored inline, either in a table slot or as a vector
/// element.
///
/// Implementors are plain byte containers (typically `#[repr(transparent)]`
/// wrappers over `[u8; N]`) whose accessors decode little-endian fields, so the
/// in-memory representation is exactly the wire representation.
pub trait Struct: bytemuck::Pod + Send + Sync {
    /// Wire alignment of the struct: the largest alignment of its fields.
    const ALIGNMENT: usize;

    /// Encoded size in bytes.
    const SIZE: usize = std::mem::size_of::<Self>();
}

/// Returns `size` bytes of `buf` starting at `position`, or an out-of-bounds
/// error when any of them lies outside the buffer.
#[inline]
pub fn slice_at(buf: &[u8], position: usize, size: usize) -> Result<&[u8]> {
    position
        .checked_add(size)
        .and_then(|end| buf.get(position..end))
        .ok_or_else(|| Error::out_of_bounds(position, size, buf.len()))
}

/// Reads a little-endian scalar at `position`.
#[inline]
pub fn read_scalar<T: Scalar>(buf: &[u8], position: usize) -> Result<T> {
    slice_at(buf, position, T::SIZE).map(T::read_le)
}

/// Follows the relative offset stored at `position`: the result is
/// `position + u32 at position`.
///
/// This is the one addressing rule of the format; table references, strings
/// and vector elements are all resolved through it.
#[inline]
pub fn resolve(buf: &[u8], position: usize) -> Result<usize> {
    let relative = read_scalar::<u32>(buf, position)? as usize;
    position
        .checked_add(relative)
        .ok_or_else(|| Error::out_of_bounds(position, SIZE_UOFFSET, buf.len()))
}

/// Reads a copy of the inline struct stored at `position`.
#[inline]
pub fn read_struct<S: Struct>(buf: &[u8], position: usize) -> Result<S> {
    slice_at(buf, position, S::SIZE).map(bytemuck::pod_read_unaligned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip<T: Scalar>(value: T) -> T {
        let mut bytes = vec![0u8; T::SIZE];
        value.write_le(&mut bytes);
        T::read_le(&bytes)
    }

    #[test]
    fn test_scalars_are_little_endian() {
        let mut bytes = [0u8; 4];
        0x0A0B0C0Du32.write_le(&mut bytes);
        assert_eq!(bytes, [0x0D, 0x0C, 0x0B, 0x0A]);

        let mut bytes = [0u8; 2];
        (-2i16).write_le(&mut bytes);
        assert_eq!(bytes, [0xFE, 0xFF]);

        assert_eq!(round_trip(-5i8), -5);
        assert!(round_trip(true));
        assert_eq!(round_trip(1.25f32), 1.25);
        assert_eq!(round_trip(i64::MIN), i64::MIN);
        assert_eq!(round_trip(f64::MAX), f64::MAX);
    }

    #[test]
    fn test_read_scalar_bounds() {
        let buf = [1u8, 0, 0, 0, 2, 0];
        assert_eq!(read_scalar::<u32>(&buf, 0).unwrap(), 1);
        assert_eq!(read_scalar::<u16>(&buf, 4).unwrap(), 2);

        let err = read_scalar::<u32>(&buf, 4).unwrap_err();
        assert!(err.is_out_of_bounds());
        assert!(read_scalar::<u8>(&buf, 6).unwrap_err().is_out_of_bounds());
        assert!(read_scalar::<u8>(&buf, usize::MAX).unwrap_err().is_out_of_bounds());
    }

    #[test]
    fn test_resolve_adds_own_position() {
        let mut buf = vec![0u8; 16];
        8u32.write_le(&mut buf[4..8]);
        assert_eq!(resolve(&buf, 4).unwrap(), 12);
        assert!(resolve(&buf, 14).unwrap_err().is_out_of_bounds());
    }
}
