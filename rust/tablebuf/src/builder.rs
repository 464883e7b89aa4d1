//! Bottom-up construction of table buffers.
//!
//! The [`Builder`] writes into a [`BackBuffer`] that grows toward lower
//! addresses, so every value is placed before the values that were written
//! earlier. A table can therefore only refer to values that already exist,
//! and all references are forward `u32` offsets relative to the referencing
//! position. A typical session:
//!
//! ```
//! use tablebuf::{Builder, get_root};
//!
//! let mut builder = Builder::new();
//! let name = builder.create_string("hello").unwrap();
//! builder.start_object(2).unwrap();
//! builder.add_offset(0, name).unwrap();
//! builder.add_scalar::<u32>(1, 7, 0).unwrap();
//! let root = builder.end_object().unwrap();
//! builder.finish(root, None).unwrap();
//!
//! let table = get_root(builder.finished_data().unwrap()).unwrap();
//! assert_eq!(table.get_str(0).unwrap(), Some("hello"));
//! assert_eq!(table.get_scalar::<u32>(1, 0).unwrap(), 7);
//! ```

use ahash::AHashMap;
use tablebuf_bytes::{BackBuffer, Bytes, align::padding_for};
use tablebuf_common::{Result, error::Error, verify_arg, verify_state};

use crate::{
    codec::{FILE_IDENTIFIER_LENGTH, MAX_SCALAR_SIZE, SIZE_UOFFSET, Scalar, Struct},
    offset::{AnyTable, FieldIndex, MAX_FIELD_COUNT, Offset},
    vtable::{FieldLoc, VTable, VTableCache, encode_vtable},
};

/// Builder configuration.
#[derive(Debug, Clone)]
pub struct BuilderOptions {
    /// Bytes of storage reserved up front.
    pub initial_capacity: usize,
    /// Maximum number of tables that may be under construction at once.
    pub max_depth: usize,
    /// Write scalar fields even when they equal their default value.
    pub force_defaults: bool,
    /// Share one vtable among all tables with identical layout.
    pub dedup_vtables: bool,
}

impl BuilderOptions {
    pub const DEFAULT_INITIAL_CAPACITY: usize = 1024;
    pub const DEFAULT_MAX_DEPTH: usize = 64;

    pub fn with_initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_force_defaults(mut self, force_defaults: bool) -> Self {
        self.force_defaults = force_defaults;
        self
    }

    pub fn with_dedup_vtables(mut self, dedup_vtables: bool) -> Self {
        self.dedup_vtables = dedup_vtables;
        self
    }
}

impl Default for BuilderOptions {
    fn default() -> Self {
        BuilderOptions {
            initial_capacity: Self::DEFAULT_INITIAL_CAPACITY,
            max_depth: Self::DEFAULT_MAX_DEPTH,
            force_defaults: false,
            dedup_vtables: true,
        }
    }
}

/// Observable state of the construction protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderState {
    /// No table is pending; strings, vectors and new tables may be started.
    Idle,
    /// `depth` tables are pending, innermost first to be ended.
    Building { depth: usize },
    /// The root has been written; only `reset` leaves this state.
    Finished,
}

/// A table between `start_object` and `end_object`.
#[derive(Debug)]
struct ObjectFrame {
    /// Cursor position when the object was started.
    start: usize,
    field_count: usize,
    /// Index of the first entry of this object in `Builder::fields`.
    first_field: usize,
}

/// A vector between `start_vector` and `end_vector`.
#[derive(Debug)]
struct VectorFrame {
    elem_size: usize,
    count: usize,
    pushed: usize,
    start: usize,
}

/// Stateful writer that assembles one buffer at a time.
///
/// A builder is reused across buffers via [`Builder::reset`], which keeps the
/// allocated storage. It is not meant to be shared between threads; every
/// mutating operation takes `&mut self`.
pub struct Builder {
    buf: BackBuffer,
    options: BuilderOptions,
    /// Largest alignment of any value written so far.
    min_align: usize,
    objects: Vec<ObjectFrame>,
    /// Fields written for all pending objects, innermost object last.
    fields: Vec<FieldLoc>,
    vector: Option<VectorFrame>,
    vtables: VTableCache,
    vtable_scratch: Vec<u8>,
    vtable_count: usize,
    strings: AHashMap<String, u32>,
    finished: bool,
}

impl Builder {
    /// Creates a builder with default options. Storage is allocated lazily.
    pub fn new() -> Builder {
        Builder::from_parts(BackBuffer::new(), BuilderOptions::default())
    }

    /// Creates a builder and reserves `options.initial_capacity` bytes.
    pub fn with_options(options: BuilderOptions) -> Result<Builder> {
        verify_arg!(max_depth, options.max_depth > 0);
        let buf = BackBuffer::with_capacity(options.initial_capacity)?;
        Ok(Builder::from_parts(buf, options))
    }

    fn from_parts(buf: BackBuffer, options: BuilderOptions) -> Builder {
        Builder {
            buf,
            options,
            min_align: 1,
            objects: Vec::new(),
            fields: Vec::new(),
            vector: None,
            vtables: VTableCache::new(),
            vtable_scratch: Vec::new(),
            vtable_count: 0,
            strings: AHashMap::new(),
            finished: false,
        }
    }

    pub fn options(&self) -> &BuilderOptions {
        &self.options
    }

    pub fn state(&self) -> BuilderState {
        if self.finished {
            BuilderState::Finished
        } else if self.objects.is_empty() {
            BuilderState::Idle
        } else {
            BuilderState::Building {
                depth: self.objects.len(),
            }
        }
    }

    /// Number of bytes written so far; also the position the next written
    /// value will be measured against.
    #[inline]
    pub fn current_offset(&self) -> usize {
        self.buf.len()
    }

    /// Largest alignment requirement of any value written in this session.
    pub fn min_alignment(&self) -> usize {
        self.min_align
    }

    /// Number of distinct vtables emitted in this session.
    pub fn vtable_count(&self) -> usize {
        self.vtable_count
    }

    /// Discards the current buffer and returns to the idle state, keeping the
    /// allocated storage for the next buffer.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.min_align = 1;
        self.objects.clear();
        self.fields.clear();
        self.vector = None;
        self.vtables.clear();
        self.vtable_count = 0;
        self.strings.clear();
        self.finished = false;
    }

    /// Begins a table with `field_count` declared fields.
    ///
    /// Tables may nest: a table started while another one is pending must be
    /// ended first, and the enclosing table's fields keep their recorded
    /// positions. Strings and vectors, on the other hand, must be written
    /// before the table that refers to them is started.
    pub fn start_object(&mut self, field_count: usize) -> Result<()> {
        self.ensure_writable("start_object")?;
        verify_state!(
            "start_object",
            self.objects.len() < self.options.max_depth,
            "nesting depth limit of {} reached",
            self.options.max_depth
        );
        verify_arg!(field_count, field_count <= MAX_FIELD_COUNT);
        // Field offsets and the table size then depend only on the sequence of
        // fields added, not on what was written before the table.
        let pad = padding_for(self.current_offset(), MAX_SCALAR_SIZE);
        self.buf.pad(pad)?;
        self.objects.push(ObjectFrame {
            start: self.current_offset(),
            field_count,
            first_field: self.fields.len(),
        });
        Ok(())
    }

    /// Adds a scalar field to the innermost pending table.
    ///
    /// A value equal to `default` is not written at all and the field reads as
    /// absent (and thus as the default), unless `force_defaults` is set.
    pub fn add_scalar<T: Scalar>(&mut self, index: FieldIndex, value: T, default: T) -> Result<()> {
        self.ensure_field("add_scalar", index)?;
        if value == default && !self.options.force_defaults {
            return Ok(());
        }
        let position = self.push_scalar_aligned(value)?;
        self.fields.push(FieldLoc { index, position });
        Ok(())
    }

    /// Adds a reference to an already written value to the innermost pending
    /// table. A null `target` leaves the field absent.
    ///
    /// Unlike [`Builder::add_scalar`] there is no `default` argument: the only
    /// default a reference can have is null.
    pub fn add_offset<T: ?Sized>(&mut self, index: FieldIndex, target: Offset<T>) -> Result<()> {
        self.ensure_field("add_offset", index)?;
        if target.is_null() {
            return Ok(());
        }
        let position = self.push_uoffset("add_offset", target.value())?;
        self.fields.push(FieldLoc { index, position });
        Ok(())
    }

    /// Writes a fixed-layout struct inline into the innermost pending table.
    pub fn add_struct<S: Struct>(&mut self, index: FieldIndex, value: &S) -> Result<()> {
        self.ensure_field("add_struct", index)?;
        self.prep(S::ALIGNMENT, S::SIZE)?;
        let position = self.buf.push_pod(value)?;
        self.fields.push(FieldLoc { index, position });
        Ok(())
    }

    /// Completes the innermost pending table: writes its vtable offset, emits
    /// (or reuses) its vtable and returns the table's position.
    pub fn end_object(&mut self) -> Result<Offset<AnyTable>> {
        self.ensure_no_vector("end_object")?;
        let Some(frame) = self.objects.pop() else {
            return Err(Error::invalid_state(
                "end_object",
                "no object is under construction",
            ));
        };

        let table_position = self.push_scalar_aligned(0i32)?;
        let table_size = table_position - frame.start;
        verify_state!(
            "end_object",
            table_size <= u16::MAX as usize,
            "table of {table_size} bytes does not fit the 16-bit vtable size field"
        );

        let mut vtable = std::mem::take(&mut self.vtable_scratch);
        encode_vtable(
            table_size as u16,
            table_position,
            &self.fields[frame.first_field..],
            &mut vtable,
        );
        self.fields.truncate(frame.first_field);
        let vtable_position = self.emit_vtable(&vtable);
        self.vtable_scratch = vtable;
        let vtable_position = vtable_position?;

        let soffset = vtable_position as i64 - table_position as i64;
        self.buf
            .patch(table_position, &(soffset as i32).to_le_bytes())?;
        Ok(Offset::new(table_position as u32))
    }

    fn emit_vtable(&mut self, vtable: &[u8]) -> Result<usize> {
        if self.options.dedup_vtables {
            if let Some(position) = self.vtables.get(vtable) {
                log::trace!("reusing vtable at {position} ({} bytes)", vtable.len());
                return Ok(position);
            }
        }
        // The table header just written keeps the cursor 4-aligned, and vtable
        // entries are 2 bytes wide.
        let position = self.buf.push_slice(vtable)?;
        self.vtable_count += 1;
        if self.options.dedup_vtables {
            self.vtables.insert(vtable, position);
        }
        log::trace!("emitted vtable at {position} ({} bytes)", vtable.len());
        Ok(position)
    }

    /// Checks that field `index` of the finished table at `table` was set.
    ///
    /// Generated code calls this after `end_object` for every field declared
    /// `required` in the schema.
    pub fn required<T: ?Sized>(&self, table: Offset<T>, index: FieldIndex) -> Result<()> {
        let table_position = table.value() as usize;
        let header = self.buf.bytes_at(table_position, 4)?;
        let soffset = i32::read_le(header) as i64;
        let vtable_position = table_position as i64 + soffset;
        verify_state!(
            "required",
            vtable_position > 0 && vtable_position as usize <= self.current_offset(),
            "{table:?} does not refer to a finished table"
        );
        let vtable_position = vtable_position as usize;
        let vtable = VTable::init(self.buf.bytes_at(vtable_position, vtable_position)?, 0)?;
        verify_state!(
            "required",
            vtable.slot(index) != 0,
            "required field {index} was not set"
        );
        Ok(())
    }

    /// Writes a UTF-8 string: `[len: u32][bytes][NUL]`.
    pub fn create_string(&mut self, value: &str) -> Result<Offset<str>> {
        Ok(self.write_byte_string("create_string", value.as_bytes())?.cast())
    }

    /// Writes a string, or returns the offset of an identical string written
    /// earlier in this session.
    pub fn create_shared_string(&mut self, value: &str) -> Result<Offset<str>> {
        self.ensure_idle("create_shared_string")?;
        if let Some(&position) = self.strings.get(value) {
            return Ok(Offset::new(position));
        }
        let offset = self.create_string(value)?;
        self.strings.insert(value.to_string(), offset.value());
        Ok(offset)
    }

    /// Writes a byte string with the same layout as a string.
    pub fn create_byte_string(&mut self, value: &[u8]) -> Result<Offset<[u8]>> {
        self.write_byte_string("create_byte_string", value)
    }

    fn write_byte_string(&mut self, operation: &str, value: &[u8]) -> Result<Offset<[u8]>> {
        self.ensure_idle(operation)?;
        self.ensure_u32_len(operation, value.len())?;
        self.prep(SIZE_UOFFSET, value.len() + 1)?;
        self.buf.pad(1)?;
        self.buf.push_slice(value)?;
        let position = self.push_scalar_aligned(value.len() as u32)?;
        Ok(Offset::new(position as u32))
    }

    /// Begins a vector of `count` elements of `elem_size` bytes each, aligned
    /// to `alignment`. Elements must then be pushed last to first.
    ///
    /// Fails with `InvalidState` while a table is pending.
    pub fn start_vector(&mut self, elem_size: usize, count: usize, alignment: usize) -> Result<()> {
        self.ensure_idle("start_vector")?;
        verify_arg!(alignment, alignment.is_power_of_two());
        self.ensure_u32_len("start_vector", count)?;
        let size = elem_size
            .checked_mul(count)
            .ok_or_else(|| Error::allocation_failed(usize::MAX, None))?;
        self.prep(SIZE_UOFFSET, size)?;
        self.prep(alignment, size)?;
        self.vector = Some(VectorFrame {
            elem_size,
            count,
            pushed: 0,
            start: self.current_offset(),
        });
        Ok(())
    }

    /// Pushes one scalar element into the pending vector.
    pub fn push_scalar<T: Scalar>(&mut self, value: T) -> Result<()> {
        self.ensure_vector_room("push_scalar")?;
        self.push_scalar_aligned(value)?;
        self.count_pushed(1);
        Ok(())
    }

    /// Pushes one offset element into the pending vector.
    pub fn push_offset<T: ?Sized>(&mut self, target: Offset<T>) -> Result<()> {
        self.ensure_vector_room("push_offset")?;
        verify_state!(
            "push_offset",
            !target.is_null(),
            "vector elements cannot be null offsets"
        );
        self.push_uoffset("push_offset", target.value())?;
        self.count_pushed(1);
        Ok(())
    }

    /// Completes the pending vector by writing its element count.
    pub fn end_vector<T>(&mut self) -> Result<Offset<[T]>> {
        let Some(vector) = self.vector.as_ref() else {
            return Err(Error::invalid_state(
                "end_vector",
                "no vector is under construction",
            ));
        };
        verify_state!(
            "end_vector",
            vector.pushed == vector.count,
            "vector declared with {} elements but {} were pushed",
            vector.count,
            vector.pushed
        );
        let written = self.current_offset() - vector.start;
        verify_state!(
            "end_vector",
            written == vector.count * vector.elem_size,
            "vector elements occupy {written} bytes, expected {}",
            vector.count * vector.elem_size
        );
        let count = vector.count as u32;
        self.vector = None;
        let position = self.push_scalar_aligned(count)?;
        Ok(Offset::new(position as u32))
    }

    /// Writes a vector of scalars in one step.
    pub fn create_vector<T: Scalar>(&mut self, values: &[T]) -> Result<Offset<[T]>> {
        self.start_vector(T::SIZE, values.len(), T::SIZE)?;
        self.buf.push_with(T::SIZE * values.len(), |dst| {
            for (chunk, value) in dst.chunks_exact_mut(T::SIZE).zip(values) {
                value.write_le(chunk);
            }
        })?;
        self.count_pushed(values.len());
        self.end_vector()
    }

    /// Writes a vector of references to already written values.
    pub fn create_vector_of_offsets<T: ?Sized>(
        &mut self,
        values: &[Offset<T>],
    ) -> Result<Offset<[Offset<T>]>> {
        self.start_vector(SIZE_UOFFSET, values.len(), SIZE_UOFFSET)?;
        for value in values.iter().rev() {
            self.push_offset(*value)?;
        }
        self.end_vector()
    }

    /// Writes a vector of fixed-layout structs.
    pub fn create_vector_of_structs<S: Struct>(&mut self, values: &[S]) -> Result<Offset<[S]>> {
        self.start_vector(S::SIZE, values.len(), S::ALIGNMENT)?;
        self.buf.push_slice(bytemuck::cast_slice(values))?;
        self.count_pushed(values.len());
        self.end_vector()
    }

    /// Writes the root reference (preceded by the optional 4-byte
    /// `file_identifier`) and completes the buffer.
    pub fn finish<T: ?Sized>(&mut self, root: Offset<T>, file_identifier: Option<&str>) -> Result<()> {
        verify_state!("finish", !self.finished, "buffer is already finished");
        verify_state!(
            "finish",
            self.objects.is_empty(),
            "{} objects are still under construction",
            self.objects.len()
        );
        self.ensure_no_vector("finish")?;
        verify_arg!(root, !root.is_null());
        if let Some(identifier) = file_identifier {
            verify_arg!(
                file_identifier,
                identifier.len() == FILE_IDENTIFIER_LENGTH
            );
        }

        let identifier_len = file_identifier.map_or(0, str::len);
        self.prep(self.min_align.max(SIZE_UOFFSET), SIZE_UOFFSET + identifier_len)?;
        if let Some(identifier) = file_identifier {
            self.buf.push_slice(identifier.as_bytes())?;
        }
        self.push_uoffset("finish", root.value())?;
        self.finished = true;

        log::debug!(
            "finished buffer of {} bytes ({} vtables, alignment {})",
            self.buf.len(),
            self.vtable_count,
            self.min_align
        );
        Ok(())
    }

    /// The finished buffer.
    pub fn finished_data(&self) -> Result<&[u8]> {
        verify_state!(
            "finished_data",
            self.finished,
            "finish() has not been called"
        );
        Ok(self.buf.as_slice())
    }

    /// A shareable copy of the finished buffer, independent of later builder
    /// reuse.
    pub fn finished_bytes(&self) -> Result<Bytes> {
        self.finished_data().map(Bytes::copy_from_slice)
    }

    /// Pads so that, after `additional` more bytes are written, the cursor is a
    /// multiple of `size`.
    fn prep(&mut self, size: usize, additional: usize) -> Result<()> {
        self.min_align = self.min_align.max(size);
        let pad = padding_for(self.buf.len() + additional, size);
        self.buf.reserve(pad + additional)?;
        self.buf.pad(pad)
    }

    fn push_scalar_aligned<T: Scalar>(&mut self, value: T) -> Result<usize> {
        self.prep(T::SIZE, 0)?;
        self.buf.push_with(T::SIZE, |dst| value.write_le(dst))
    }

    fn push_uoffset(&mut self, operation: &str, target: u32) -> Result<usize> {
        self.prep(SIZE_UOFFSET, 0)?;
        let target = target as usize;
        verify_state!(
            operation,
            target <= self.current_offset(),
            "offset {target} refers to a value that has not been written yet (cursor at {})",
            self.current_offset()
        );
        let relative = (self.current_offset() + SIZE_UOFFSET - target) as u32;
        self.buf
            .push_with(SIZE_UOFFSET, |dst| relative.write_le(dst))
    }

    fn ensure_writable(&self, operation: &str) -> Result<()> {
        verify_state!(
            operation,
            !self.finished,
            "buffer is finished; call reset() before reusing the builder"
        );
        self.ensure_no_vector(operation)
    }

    /// Strings and vectors are only written between tables.
    fn ensure_idle(&self, operation: &str) -> Result<()> {
        self.ensure_writable(operation)?;
        verify_state!(
            operation,
            self.objects.is_empty(),
            "{} objects are under construction",
            self.objects.len()
        );
        Ok(())
    }

    fn ensure_no_vector(&self, operation: &str) -> Result<()> {
        verify_state!(
            operation,
            self.vector.is_none(),
            "a vector is under construction"
        );
        Ok(())
    }

    fn ensure_field(&self, operation: &str, index: FieldIndex) -> Result<()> {
        self.ensure_no_vector(operation)?;
        let Some(frame) = self.objects.last() else {
            return Err(Error::invalid_state(
                operation,
                "no object is under construction",
            ));
        };
        verify_state!(
            operation,
            (index as usize) < frame.field_count,
            "field index {index} is out of range for an object of {} fields",
            frame.field_count
        );
        Ok(())
    }

    fn ensure_vector_room(&self, operation: &str) -> Result<()> {
        match &self.vector {
            Some(vector) if vector.pushed < vector.count => Ok(()),
            Some(vector) => Err(Error::invalid_state(
                operation,
                format!("vector of {} elements is already full", vector.count),
            )),
            None => Err(Error::invalid_state(
                operation,
                "no vector is under construction",
            )),
        }
    }

    fn ensure_u32_len(&self, operation: &str, len: usize) -> Result<()> {
        verify_state!(
            operation,
            len <= u32::MAX as usize,
            "length {len} does not fit a 32-bit length prefix"
        );
        Ok(())
    }

    fn count_pushed(&mut self, n: usize) {
        if let Some(vector) = self.vector.as_mut() {
            vector.pushed += n;
        }
    }
}

impl Default for Builder {
    fn default() -> Self {
        Builder::new()
    }
}

impl std::fmt::Debug for Builder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builder")
            .field("state", &self.state())
            .field("len", &self.buf.len())
            .field("min_align", &self.min_align)
            .field("vtable_count", &self.vtable_count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        follow::ForwardsOffset,
        table::{Table, get_root, root},
        vector::Vector,
    };

    #[test]
    fn test_single_field_layout() {
        let mut builder = Builder::new();
        builder.start_object(1).unwrap();
        builder.add_scalar::<u32>(0, 7, 0).unwrap();
        let root = builder.end_object().unwrap();
        assert_eq!(root.value(), 8);
        builder.finish(root, None).unwrap();

        let data = builder.finished_data().unwrap();
        #[rustfmt::skip]
        let expected: &[u8] = &[
            12, 0, 0, 0,        // root uoffset -> 12
            0, 0,               // padding
            6, 0, 8, 0, 4, 0,   // vtable: len 6, table size 8, field 0 at +4
            6, 0, 0, 0,         // table: vtable at 12 - 6
            7, 0, 0, 0,         // field 0
        ];
        assert_eq!(data, expected);
        assert_eq!(data.len() % builder.min_alignment(), 0);
    }

    #[test]
    fn test_string_layout() {
        let mut builder = Builder::new();
        let s = builder.create_string("abc").unwrap();
        assert_eq!(s.value(), 8);
        builder.start_object(1).unwrap();
        builder.add_offset(0, s).unwrap();
        let root = builder.end_object().unwrap();
        builder.finish(root, None).unwrap();
        let data = builder.finished_data().unwrap();
        assert_eq!(&data[data.len() - 8..], &[3, 0, 0, 0, b'a', b'b', b'c', 0]);
        let table = get_root(data).unwrap();
        assert_eq!(table.get_str(0).unwrap(), Some("abc"));
    }

    #[test]
    fn test_default_values_are_omitted() {
        let mut builder = Builder::new();
        builder.start_object(2).unwrap();
        let before = builder.current_offset();
        builder.add_scalar::<i16>(0, 5, 5).unwrap();
        builder.add_offset(1, Offset::<str>::null()).unwrap();
        assert_eq!(builder.current_offset(), before);
        let root = builder.end_object().unwrap();
        builder.finish(root, None).unwrap();

        let table = get_root(builder.finished_data().unwrap()).unwrap();
        assert_eq!(table.vtable().unwrap().field_count(), 0);
        assert_eq!(table.get_scalar::<i16>(0, 5).unwrap(), 5);
        assert_eq!(table.get_str(1).unwrap(), None);
    }

    #[test]
    fn test_force_defaults() {
        let options = BuilderOptions::default().with_force_defaults(true);
        let mut builder = Builder::with_options(options).unwrap();
        builder.start_object(1).unwrap();
        builder.add_scalar::<i16>(0, 5, 5).unwrap();
        let root = builder.end_object().unwrap();
        builder.finish(root, None).unwrap();
        let table = get_root(builder.finished_data().unwrap()).unwrap();
        assert!(table.has_field(0).unwrap());
    }

    #[test]
    fn test_vtable_reuse() {
        let mut builder = Builder::new();
        let mut tables = Vec::new();
        for i in 1..=3u32 {
            builder.start_object(2).unwrap();
            builder.add_scalar::<u32>(1, i, 0).unwrap();
            tables.push(builder.end_object().unwrap());
        }
        assert_eq!(builder.vtable_count(), 1);
        let root = builder.create_vector_of_offsets(&tables).unwrap();
        builder.finish(root, None).unwrap();
        let _ = builder.finished_data().unwrap();

        let mut builder =
            Builder::with_options(BuilderOptions::default().with_dedup_vtables(false)).unwrap();
        for i in 1..=3u32 {
            builder.start_object(2).unwrap();
            builder.add_scalar::<u32>(1, i, 0).unwrap();
            builder.end_object().unwrap();
        }
        assert_eq!(builder.vtable_count(), 3);
    }

    #[test]
    fn test_vtable_reuse_with_narrow_fields() {
        let mut builder = Builder::new();
        let mut tables = Vec::new();
        for i in 1..=4u8 {
            builder.start_object(1).unwrap();
            builder.add_scalar::<u8>(0, i, 0).unwrap();
            tables.push(builder.end_object().unwrap());
        }
        for i in 1..=3u16 {
            builder.create_byte_string(&vec![b'x'; i as usize]).unwrap();
            builder.start_object(3).unwrap();
            builder.add_scalar::<u64>(0, i as u64, 0).unwrap();
            builder.add_scalar::<u16>(1, i, 0).unwrap();
            builder.add_scalar::<u8>(2, i as u8, 0).unwrap();
            tables.push(builder.end_object().unwrap());
        }
        assert_eq!(builder.vtable_count(), 2);
        let root = builder.create_vector_of_offsets(&tables).unwrap();
        builder.finish(root, None).unwrap();

        let data = builder.finished_data().unwrap();
        let tables = crate::table::root::<Vector<ForwardsOffset<Table>>>(data)
            .unwrap()
            .to_vec()
            .unwrap();
        let vtables = tables
            .iter()
            .map(|table| table.vtable().unwrap().position())
            .collect::<Vec<_>>();
        assert!(vtables[..4].iter().all(|&v| v == vtables[0]));
        assert!(vtables[4..].iter().all(|&v| v == vtables[4]));
        for (i, table) in tables[..4].iter().enumerate() {
            assert_eq!(table.get_scalar::<u8>(0, 0).unwrap(), i as u8 + 1);
        }
        for (i, table) in tables[4..].iter().enumerate() {
            let i = i as u16 + 1;
            assert_eq!(table.get_scalar::<u64>(0, 0).unwrap(), i as u64);
            assert_eq!(table.get_scalar::<u16>(1, 0).unwrap(), i);
            assert_eq!(table.get_scalar::<u8>(2, 0).unwrap(), i as u8);
        }
    }

    #[test]
    fn test_state_transitions() {
        let mut builder = Builder::new();
        assert_eq!(builder.state(), BuilderState::Idle);
        builder.start_object(1).unwrap();
        builder.start_object(1).unwrap();
        assert_eq!(builder.state(), BuilderState::Building { depth: 2 });
        let inner = builder.end_object().unwrap();
        builder.add_offset(0, inner).unwrap();
        let outer = builder.end_object().unwrap();
        assert_eq!(builder.state(), BuilderState::Idle);
        builder.finish(outer, Some("TBUF")).unwrap();
        assert_eq!(builder.state(), BuilderState::Finished);

        assert!(builder.start_object(1).unwrap_err().is_invalid_state());
        assert!(builder.finish(outer, None).unwrap_err().is_invalid_state());
        assert!(builder.create_string("x").unwrap_err().is_invalid_state());

        builder.reset();
        assert_eq!(builder.state(), BuilderState::Idle);
        assert_eq!(builder.current_offset(), 0);
        assert!(builder.finished_data().unwrap_err().is_invalid_state());
    }

    #[test]
    fn test_protocol_violations() {
        let mut builder = Builder::new();
        assert!(builder.end_object().unwrap_err().is_invalid_state());
        assert!(builder.add_scalar::<u8>(0, 1, 0).unwrap_err().is_invalid_state());

        builder.start_object(2).unwrap();
        assert!(builder.add_scalar::<u8>(2, 1, 0).unwrap_err().is_invalid_state());
        // Referenced values are written before the table that refers to them.
        assert!(builder.create_string("x").unwrap_err().is_invalid_state());
        assert!(builder.create_shared_string("x").unwrap_err().is_invalid_state());
        assert!(builder.create_vector::<u16>(&[1]).unwrap_err().is_invalid_state());
        assert!(builder.start_vector(4, 1, 4).unwrap_err().is_invalid_state());
        // Target written after the cursor.
        let bogus = Offset::<str>::new(1000);
        assert!(builder.add_offset(0, bogus).unwrap_err().is_invalid_state());
        assert!(
            builder
                .finish(Offset::<AnyTable>::new(4), None)
                .unwrap_err()
                .is_invalid_state()
        );
        builder.end_object().unwrap();

        builder.start_vector(4, 1, 4).unwrap();
        assert!(builder.start_object(1).unwrap_err().is_invalid_state());
        assert!(builder.create_string("x").unwrap_err().is_invalid_state());
        assert!(builder.end_vector::<u32>().unwrap_err().is_invalid_state());
        builder.push_scalar::<u32>(1).unwrap();
        assert!(builder.push_scalar::<u32>(2).unwrap_err().is_invalid_state());
        builder.end_vector::<u32>().unwrap();
        assert!(builder.end_vector::<u32>().unwrap_err().is_invalid_state());
    }

    #[test]
    fn test_max_depth() {
        let options = BuilderOptions::default().with_max_depth(2);
        let mut builder = Builder::with_options(options).unwrap();
        builder.start_object(0).unwrap();
        builder.start_object(0).unwrap();
        let err = builder.start_object(0).unwrap_err();
        assert!(err.is_invalid_state());
        assert!(Builder::with_options(BuilderOptions::default().with_max_depth(0)).is_err());
    }

    #[test]
    fn test_required_field() {
        let mut builder = Builder::new();
        let name = builder.create_string("n").unwrap();
        builder.start_object(2).unwrap();
        builder.add_offset(1, name).unwrap();
        let table = builder.end_object().unwrap();
        builder.required(table, 1).unwrap();
        let err = builder.required(table, 0).unwrap_err();
        assert!(err.is_invalid_state());
        assert!(err.to_string().contains("required field 0"));

        // A second table sharing the cached vtable is checked the same way.
        builder.start_object(2).unwrap();
        builder.add_offset(1, name).unwrap();
        let again = builder.end_object().unwrap();
        assert_eq!(builder.vtable_count(), 1);
        builder.required(again, 1).unwrap();
    }

    #[test]
    fn test_shared_strings() {
        let mut builder = Builder::new();
        let a = builder.create_shared_string("same").unwrap();
        let b = builder.create_shared_string("same").unwrap();
        let c = builder.create_string("same").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);

        builder.start_object(1).unwrap();
        builder.add_offset(0, a).unwrap();
        let root = builder.end_object().unwrap();
        builder.finish(root, None).unwrap();
        // A cache hit is still subject to the finished state.
        let err = builder.create_shared_string("same").unwrap_err();
        assert!(err.is_invalid_state());
        builder.reset();
        builder.create_shared_string("same").unwrap();
        assert_eq!(builder.vtable_count(), 0);
    }

    #[test]
    fn test_vector_alignment() {
        let mut builder = Builder::new();
        builder.create_byte_string(b"x").unwrap();
        let v = builder.create_vector::<u64>(&[1, 2]).unwrap();
        // Elements start 8-aligned relative to the buffer end.
        assert_eq!((v.value() as usize - 4) % 8, 0);
        assert_eq!(builder.min_alignment(), 8);
        let empty = builder.create_vector::<u16>(&[]).unwrap();
        assert_eq!(empty.value() % 4, 0);
    }
}
