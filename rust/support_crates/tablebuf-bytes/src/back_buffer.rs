use tablebuf_common::{Result, error::Error};

/// Largest buffer the builder may produce. Offsets inside a finished buffer are
/// stored as signed 32-bit values, so nothing past `i32::MAX` is addressable.
pub const MAX_BUFFER_SIZE: usize = i32::MAX as usize;

/// A byte buffer that is filled from its end toward its start.
///
/// Every write lands immediately before the previously written bytes, and the
/// returned position is measured from the end of the buffer. Positions stay
/// valid across growth: when the storage is reallocated the written bytes move
/// to the tail of the new allocation and their distance from the end does not
/// change.
///
/// # Growth
/// Capacity doubles on growth (with a small floor) and is never allowed to
/// exceed [`MAX_BUFFER_SIZE`]. Reservation goes through `Vec::try_reserve_exact`
/// so exhaustion is reported as an error rather than aborting.
pub struct BackBuffer {
    /// Backing storage. The written bytes occupy `inner[head..]`.
    inner: Vec<u8>,
    /// Index of the first written byte, i.e. the amount of free headroom.
    head: usize,
}

impl BackBuffer {
    const MIN_CAPACITY: usize = 64;

    /// Creates an empty buffer without allocating.
    pub fn new() -> BackBuffer {
        BackBuffer {
            inner: Vec::new(),
            head: 0,
        }
    }

    /// Creates an empty buffer able to hold at least `capacity` bytes without
    /// reallocating.
    pub fn with_capacity(capacity: usize) -> Result<BackBuffer> {
        let mut buf = BackBuffer::new();
        if capacity != 0 {
            buf.grow(capacity)?;
        }
        Ok(buf)
    }

    /// Number of bytes written so far. This is also the position (offset from
    /// the end) of the most recently written byte.
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len() - self.head
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total storage size in bytes.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.inner.len()
    }

    /// Ensures that at least `additional` bytes can be written without
    /// reallocating.
    #[inline]
    pub fn reserve(&mut self, additional: usize) -> Result<()> {
        if self.head >= additional {
            return Ok(());
        }
        self.grow(additional)
    }

    /// Writes `bytes` immediately before the current cursor and returns the new
    /// position (offset from the end) of the first written byte.
    #[inline]
    pub fn push_slice(&mut self, bytes: &[u8]) -> Result<usize> {
        self.push_with(bytes.len(), |dst| dst.copy_from_slice(bytes))
    }

    /// Reserves `size` bytes before the cursor and lets `fill` initialize them
    /// in place. Returns the new position of the first reserved byte.
    #[inline]
    pub fn push_with<F>(&mut self, size: usize, fill: F) -> Result<usize>
    where
        F: FnOnce(&mut [u8]),
    {
        self.reserve(size)?;
        let start = self.head - size;
        fill(&mut self.inner[start..self.head]);
        self.head = start;
        Ok(self.len())
    }

    /// Writes the raw bytes of a plain-old-data value.
    #[inline]
    pub fn push_pod<T>(&mut self, value: &T) -> Result<usize>
    where
        T: bytemuck::NoUninit,
    {
        self.push_slice(bytemuck::bytes_of(value))
    }

    /// Writes `n` zero bytes. No-op when `n == 0`.
    #[inline]
    pub fn pad(&mut self, n: usize) -> Result<()> {
        if n != 0 {
            self.push_with(n, |dst| dst.fill(0))?;
        }
        Ok(())
    }

    /// Overwrites previously written bytes starting at `position` (offset from
    /// the end, as returned by the push methods).
    pub fn patch(&mut self, position: usize, bytes: &[u8]) -> Result<()> {
        if position > self.len() || bytes.len() > position {
            return Err(Error::out_of_bounds(
                self.len().wrapping_sub(position),
                bytes.len(),
                self.len(),
            ));
        }
        let start = self.inner.len() - position;
        self.inner[start..start + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    /// Returns the bytes written at `position` (offset from the end), up to
    /// `size` bytes long.
    pub fn bytes_at(&self, position: usize, size: usize) -> Result<&[u8]> {
        if position > self.len() || size > position {
            return Err(Error::out_of_bounds(
                self.len().wrapping_sub(position),
                size,
                self.len(),
            ));
        }
        let start = self.inner.len() - position;
        Ok(&self.inner[start..start + size])
    }

    /// The written bytes, in final buffer order.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.inner[self.head..]
    }

    /// Discards all written bytes while keeping the allocated storage.
    pub fn clear(&mut self) {
        self.head = self.inner.len();
    }

    #[cold]
    fn grow(&mut self, additional: usize) -> Result<()> {
        let len = self.len();
        let required = match len.checked_add(additional) {
            Some(required) if required <= MAX_BUFFER_SIZE => required,
            _ => {
                return Err(Error::allocation_failed(
                    len.saturating_add(additional),
                    None,
                ));
            }
        };
        let new_cap = (self.capacity() * 2)
            .max(required)
            .max(Self::MIN_CAPACITY)
            .min(MAX_BUFFER_SIZE);

        let mut storage = Vec::new();
        storage
            .try_reserve_exact(new_cap)
            .map_err(|e| Error::allocation_failed(new_cap, Some(e)))?;
        storage.resize(new_cap - len, 0);
        storage.extend_from_slice(self.as_slice());

        log::debug!(
            "back buffer grown from {} to {} bytes ({} bytes in use)",
            self.capacity(),
            new_cap,
            len
        );

        self.inner = storage;
        self.head = new_cap - len;
        Ok(())
    }
}

impl Default for BackBuffer {
    fn default() -> Self {
        BackBuffer::new()
    }
}

impl std::fmt::Debug for BackBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackBuffer")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_back_buffer_new() {
        let buf = BackBuffer::new();
        assert_eq!(buf.len(), 0);
        assert_eq!(buf.capacity(), 0);
        assert!(buf.is_empty());
        assert!(buf.as_slice().is_empty());
    }

    #[test]
    fn test_back_buffer_push_prepends() {
        let mut buf = BackBuffer::new();
        assert_eq!(buf.push_slice(b"world").unwrap(), 5);
        assert_eq!(buf.push_slice(b"hello ").unwrap(), 11);
        assert_eq!(buf.as_slice(), b"hello world");
    }

    #[test]
    fn test_back_buffer_positions_survive_growth() {
        let mut buf = BackBuffer::with_capacity(8).unwrap();
        let first = buf.push_slice(&[1, 2, 3, 4]).unwrap();
        let initial_capacity = buf.capacity();
        for _ in 0..100 {
            buf.push_slice(&[0xAA; 7]).unwrap();
        }
        assert!(buf.capacity() > initial_capacity);
        assert_eq!(buf.bytes_at(first, 4).unwrap(), &[1, 2, 3, 4]);
        assert_eq!(&buf.as_slice()[buf.len() - 4..], &[1, 2, 3, 4]);
    }

    #[test]
    fn test_back_buffer_doubling() {
        let mut buf = BackBuffer::with_capacity(100).unwrap();
        let cap = buf.capacity();
        buf.push_slice(&vec![1u8; cap]).unwrap();
        buf.push_slice(&[2]).unwrap();
        assert_eq!(buf.capacity(), cap * 2);
        assert_eq!(buf.len(), cap + 1);
    }

    #[test]
    fn test_back_buffer_pad() {
        let mut buf = BackBuffer::new();
        buf.push_slice(&[7]).unwrap();
        buf.pad(0).unwrap();
        assert_eq!(buf.len(), 1);
        buf.pad(3).unwrap();
        assert_eq!(buf.as_slice(), &[0, 0, 0, 7]);
    }

    #[test]
    fn test_back_buffer_pad_after_clear_writes_zeros() {
        let mut buf = BackBuffer::new();
        buf.push_slice(&[0xFF; 16]).unwrap();
        buf.clear();
        assert!(buf.is_empty());
        buf.pad(4).unwrap();
        assert_eq!(buf.as_slice(), &[0, 0, 0, 0]);
    }

    #[test]
    fn test_back_buffer_patch() {
        let mut buf = BackBuffer::new();
        buf.push_slice(&[1, 2, 3, 4]).unwrap();
        let pos = buf.push_slice(&[0, 0, 0, 0]).unwrap();
        buf.push_slice(&[9]).unwrap();
        buf.patch(pos, &[5, 6]).unwrap();
        assert_eq!(buf.as_slice(), &[9, 5, 6, 0, 0, 1, 2, 3, 4]);

        assert!(buf.patch(20, &[1]).unwrap_err().is_out_of_bounds());
        assert!(buf.patch(1, &[1, 2]).unwrap_err().is_out_of_bounds());
    }

    #[test]
    fn test_back_buffer_push_with_and_pod() {
        let mut buf = BackBuffer::new();
        buf.push_with(4, |dst| dst.copy_from_slice(&0x01020304u32.to_le_bytes()))
            .unwrap();
        let pos = buf.push_pod(&[0xABu8, 0xCD]).unwrap();
        assert_eq!(pos, 6);
        assert_eq!(buf.as_slice(), &[0xAB, 0xCD, 4, 3, 2, 1]);
    }

    #[test]
    fn test_back_buffer_refuses_oversized_growth() {
        let mut buf = BackBuffer::new();
        let err = buf.reserve(MAX_BUFFER_SIZE + 1).unwrap_err();
        assert!(matches!(
            err.kind(),
            tablebuf_common::error::ErrorKind::AllocationFailed { .. }
        ));
    }
}
