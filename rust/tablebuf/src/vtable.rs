//! Per-table field layout: encoding of vtables on the write side, deduplication
//! by content, and the read-side view.
//!
//! A vtable is a sequence of `u16` values:
//! * byte size of the vtable itself (including this header)
//! * byte size of the table it describes
//! * one entry per field: byte offset of the field from the table start, or `0`
//!   when the field is absent.
//!
//! Trailing absent fields are not stored at all; readers treat slots past the
//! end of a vtable as absent.

use ahash::AHashMap;
use byteorder::{ByteOrder, LittleEndian};
use tablebuf_common::{Result, verify_data};

use crate::{
    codec::{SIZE_VOFFSET, VTABLE_HEADER_SIZE, slice_at},
    offset::FieldIndex,
};

/// Location of a field written for the table currently under construction.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FieldLoc {
    pub index: FieldIndex,
    /// Position of the field value, measured from the buffer end.
    pub position: usize,
}

/// Encodes the vtable of a table whose header was written at `table_position`
/// (measured from the buffer end) into `out`.
///
/// When a field index was recorded more than once, the last value wins.
///
/// Slots are emitted up to the highest field index actually written, not up
/// to the declared field count: a table with fields `0..5` declared and only
/// field 1 set gets a vtable of 2 slots instead of 5. Readers see the missing
/// trailing slots as absent fields.
pub(crate) fn encode_vtable(
    table_size: u16,
    table_position: usize,
    fields: &[FieldLoc],
    out: &mut Vec<u8>,
) {
    let used = fields
        .iter()
        .map(|f| f.index as usize + 1)
        .max()
        .unwrap_or(0);
    let byte_len = VTABLE_HEADER_SIZE + used * SIZE_VOFFSET;

    out.clear();
    out.resize(byte_len, 0);
    LittleEndian::write_u16(&mut out[0..2], byte_len as u16);
    LittleEndian::write_u16(&mut out[2..4], table_size);
    for field in fields {
        let at = VTABLE_HEADER_SIZE + field.index as usize * SIZE_VOFFSET;
        let offset = (table_position - field.position) as u16;
        LittleEndian::write_u16(&mut out[at..at + SIZE_VOFFSET], offset);
    }
}

/// Content-addressed cache of the vtables already emitted by one builder.
///
/// Keys are the exact vtable bytes; values are the vtable positions (measured
/// from the buffer end). Identically shaped tables thus share one vtable.
#[derive(Debug, Default)]
pub struct VTableCache {
    entries: AHashMap<Vec<u8>, usize>,
}

impl VTableCache {
    pub fn new() -> VTableCache {
        Default::default()
    }

    #[inline]
    pub fn get(&self, vtable: &[u8]) -> Option<usize> {
        self.entries.get(vtable).copied()
    }

    pub fn insert(&mut self, vtable: &[u8], position: usize) {
        self.entries.insert(vtable.to_vec(), position);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Read-only view of a vtable inside a finished buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VTable<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> VTable<'a> {
    /// Validates the vtable header at `position` and returns a view over the
    /// whole vtable.
    pub fn init(buf: &'a [u8], position: usize) -> Result<VTable<'a>> {
        let header = slice_at(buf, position, VTABLE_HEADER_SIZE)?;
        let byte_len = LittleEndian::read_u16(&header[0..2]) as usize;
        verify_data!(vtable, byte_len >= VTABLE_HEADER_SIZE);
        verify_data!(vtable, byte_len % SIZE_VOFFSET == 0);
        let bytes = slice_at(buf, position, byte_len)?;
        Ok(VTable { bytes, position })
    }

    /// Absolute position of the vtable in the buffer.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Size of the vtable in bytes, header included.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    /// Size of the described table in bytes, including its vtable offset.
    #[inline]
    pub fn table_size(&self) -> u16 {
        LittleEndian::read_u16(&self.bytes[2..4])
    }

    /// Number of field slots stored in this vtable.
    #[inline]
    pub fn field_count(&self) -> usize {
        (self.bytes.len() - VTABLE_HEADER_SIZE) / SIZE_VOFFSET
    }

    /// Offset of field `index` from the table start, or `0` when the field is
    /// absent. Slots past the end of the vtable (data written with an older,
    /// shorter schema) read as absent.
    #[inline]
    pub fn slot(&self, index: FieldIndex) -> u16 {
        let at = VTABLE_HEADER_SIZE + index as usize * SIZE_VOFFSET;
        match self.bytes.get(at..at + SIZE_VOFFSET) {
            Some(entry) => LittleEndian::read_u16(entry),
            None => 0,
        }
    }

    /// Iterates over all stored slots in field order.
    pub fn slots(&self) -> impl Iterator<Item = u16> + 'a {
        self.bytes[VTABLE_HEADER_SIZE..]
            .chunks_exact(SIZE_VOFFSET)
            .map(LittleEndian::read_u16)
    }

    /// Raw vtable bytes.
    #[inline]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }
}
