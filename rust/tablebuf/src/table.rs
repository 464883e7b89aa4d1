//! Zero-copy table access.
//!
//! A table starts with a signed 32-bit offset to its vtable
//! (`vtable position = table position - stored value`), followed by the field
//! bytes at the offsets the vtable lists. Nothing is decoded up front: every
//! accessor resolves the vtable slot for one field and reads only that field,
//! so malformed data is reported when the damaged field is first touched.

use tablebuf_common::{Result, error::Error};

use crate::{
    codec::{FILE_IDENTIFIER_LENGTH, SIZE_UOFFSET, Scalar, Struct, read_scalar, resolve, slice_at},
    follow::{Follow, ForwardsOffset, Inline, Packed},
    offset::FieldIndex,
    vector::Vector,
    vtable::VTable,
};

/// Thin view of one table: the buffer and the table's absolute position.
///
/// `Table` holds no other state, so it is `Copy` and can be rebound to another
/// position without allocating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Table<'a> {
    buf: &'a [u8],
    position: usize,
}

impl<'a> Table<'a> {
    #[inline]
    pub fn new(buf: &'a [u8], position: usize) -> Table<'a> {
        Table { buf, position }
    }

    #[inline]
    pub fn buf(&self) -> &'a [u8] {
        self.buf
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Points this view at another table of the same buffer.
    #[inline]
    pub fn rebind(&mut self, position: usize) {
        self.position = position;
    }

    /// Resolves the vtable describing this table.
    pub fn vtable(&self) -> Result<VTable<'a>> {
        let soffset = read_scalar::<i32>(self.buf, self.position)?;
        let vtable_position = self.position as i64 - soffset as i64;
        if vtable_position < 0 {
            return Err(Error::invalid_format(
                "vtable",
                format!(
                    "table at {} refers to a vtable before the buffer start ({vtable_position})",
                    self.position
                ),
            ));
        }
        VTable::init(self.buf, vtable_position as usize)
    }

    /// Byte offset of field `index` from the table start, or `0` when the field
    /// is absent (including fields unknown to the writer's schema).
    #[inline]
    pub fn field_offset(&self, index: FieldIndex) -> Result<u16> {
        Ok(self.vtable()?.slot(index))
    }

    #[inline]
    pub fn has_field(&self, index: FieldIndex) -> Result<bool> {
        Ok(self.field_offset(index)? != 0)
    }

    /// Decodes field `index` as a `T` stored inline in the table.
    pub fn get<T: Follow<'a>>(&self, index: FieldIndex) -> Result<Option<T::Inner>> {
        let offset = self.field_offset(index)?;
        if offset == 0 {
            return Ok(None);
        }
        T::follow(self.buf, self.position + offset as usize).map(Some)
    }

    /// Reads a scalar field, returning `default` when it is absent.
    pub fn get_scalar<T: Scalar>(&self, index: FieldIndex, default: T) -> Result<T> {
        let offset = self.field_offset(index)?;
        if offset == 0 {
            return Ok(default);
        }
        read_scalar::<T>(self.buf, self.position + offset as usize)
    }

    pub fn get_str(&self, index: FieldIndex) -> Result<Option<&'a str>> {
        self.get::<ForwardsOffset<&'a str>>(index)
    }

    pub fn get_bytes(&self, index: FieldIndex) -> Result<Option<&'a [u8]>> {
        self.get::<ForwardsOffset<&'a [u8]>>(index)
    }

    pub fn get_table(&self, index: FieldIndex) -> Result<Option<Table<'a>>> {
        self.get::<ForwardsOffset<Table<'a>>>(index)
    }

    pub fn get_vector<T: Follow<'a> + Inline>(
        &self,
        index: FieldIndex,
    ) -> Result<Option<Vector<'a, T>>> {
        self.get::<ForwardsOffset<Vector<'a, T>>>(index)
    }

    /// Reads a copy of an inline struct field.
    pub fn get_struct<S: Struct>(&self, index: FieldIndex) -> Result<Option<S>> {
        self.get::<Packed<S>>(index)
    }

    /// Reads a union stored as a `u8` discriminant field and a table offset field.
    ///
    /// Returns `None` when the discriminant is absent or `0` (the `NONE` member).
    pub fn get_union(
        &self,
        type_index: FieldIndex,
        value_index: FieldIndex,
    ) -> Result<Option<(u8, Table<'a>)>> {
        let discriminant = self.get_scalar::<u8>(type_index, 0)?;
        if discriminant == 0 {
            return Ok(None);
        }
        Ok(self.get_table(value_index)?.map(|table| (discriminant, table)))
    }
}

impl<'a> Follow<'a> for Table<'a> {
    type Inner = Table<'a>;

    #[inline]
    fn follow(buf: &'a [u8], position: usize) -> Result<Table<'a>> {
        Ok(Table::new(buf, position))
    }
}

/// Resolves the root table of a finished buffer.
pub fn get_root(buf: &[u8]) -> Result<Table<'_>> {
    root::<Table<'_>>(buf)
}

/// Resolves the root of a finished buffer as a `T`.
pub fn root<'a, T: Follow<'a>>(buf: &'a [u8]) -> Result<T::Inner> {
    ForwardsOffset::<T>::follow(buf, 0)
}

/// Returns the 4-byte file identifier stored after the root offset.
///
/// Buffers finished without an identifier carry arbitrary bytes at this
/// location, so this is only meaningful when the schema declares one.
pub fn file_identifier(buf: &[u8]) -> Result<&[u8]> {
    slice_at(buf, SIZE_UOFFSET, FILE_IDENTIFIER_LENGTH)
}

/// Checks whether the buffer carries the given file identifier.
pub fn buffer_has_identifier(buf: &[u8], identifier: &str) -> bool {
    identifier.len() == FILE_IDENTIFIER_LENGTH
        && file_identifier(buf).is_ok_and(|id| id == identifier.as_bytes())
}

/// Resolves the root offset stored at an arbitrary `position`, for buffers
/// embedded at a non-zero location of a larger region.
pub fn get_root_at(buf: &[u8], position: usize) -> Result<Table<'_>> {
    Ok(Table::new(buf, resolve(buf, position)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hand-assembled buffer with a root table holding an `i32` (field 0) and a
    /// string (field 2); field 1 is absent.
    ///
    /// ```text
    /// 0:  root uoffset = 16
    /// 4:  vtable [10, 12, 4, 0, 8]  (len, table size, slots)
    /// 14: padding
    /// 16: table soffset = 12 -> vtable at 4
    /// 20: i32 = -7
    /// 24: uoffset = 4 -> string at 28
    /// 28: [len=2]["hi"][NUL]
    /// ```
    fn sample() -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&16u32.to_le_bytes());
        for v in [10u16, 12, 4, 0, 8] {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        buf.extend_from_slice(&[0, 0]);
        buf.extend_from_slice(&12i32.to_le_bytes());
        buf.extend_from_slice(&(-7i32).to_le_bytes());
        buf.extend_from_slice(&4u32.to_le_bytes());
        buf.extend_from_slice(&2u32.to_le_bytes());
        buf.extend_from_slice(b"hi\0\0");
        buf
    }

    #[test]
    fn test_read_hand_assembled_table() {
        let buf = sample();
        let root = get_root(&buf).unwrap();
        assert_eq!(root.position(), 16);
        assert_eq!(root.vtable().unwrap().position(), 4);
        assert_eq!(root.get_scalar::<i32>(0, 0).unwrap(), -7);
        assert!(!root.has_field(1).unwrap());
        assert_eq!(root.get_scalar::<i32>(1, 99).unwrap(), 99);
        assert_eq!(root.get_str(2).unwrap(), Some("hi"));
        // Unknown trailing field reads as absent.
        assert_eq!(root.get_str(3).unwrap(), None);
        assert_eq!(root.get_scalar::<u64>(40, 5).unwrap(), 5);
    }

    #[test]
    fn test_rebind_reuses_view() {
        let buf = sample();
        let mut view = Table::new(&buf, 0);
        view.rebind(resolve(&buf, 0).unwrap());
        assert_eq!(view, get_root(&buf).unwrap());
    }

    #[test]
    fn test_truncated_buffer_fails_lazily() {
        let buf = sample();
        let truncated = &buf[..26];
        let root = get_root(truncated).unwrap();
        // Scalar field is intact; only the string is damaged.
        assert_eq!(root.get_scalar::<i32>(0, 0).unwrap(), -7);
        assert!(root.get_str(2).unwrap_err().is_out_of_bounds());

        assert!(get_root(&buf[..2]).unwrap_err().is_out_of_bounds());
        let root = get_root(&buf[..18]).unwrap();
        assert!(root.get_scalar::<i32>(0, 0).unwrap_err().is_out_of_bounds());
    }

    #[test]
    fn test_vtable_before_buffer_start() {
        let mut buf = sample();
        buf[16..20].copy_from_slice(&100i32.to_le_bytes());
        let root = get_root(&buf).unwrap();
        assert!(root.field_offset(0).is_err());
    }

    #[test]
    fn test_file_identifier() {
        let buf = sample();
        assert_eq!(file_identifier(&buf).unwrap(), &buf[4..8]);
        assert!(!buffer_has_identifier(&buf, "TBUF"));
        assert!(!buffer_has_identifier(&buf, "TOOLONG"));
        assert!(!buffer_has_identifier(&buf[..6], "TBUF"));
    }
}
