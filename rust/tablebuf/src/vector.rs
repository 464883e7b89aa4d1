use std::marker::PhantomData;

use tablebuf_common::{Result, verify_arg};

use crate::{
    codec::{SIZE_UOFFSET, read_scalar, slice_at},
    follow::{Follow, Inline},
};

/// Zero-copy view of a vector: `[count: u32][elements...]`.
///
/// Elements are decoded on access with `T`'s [`Follow`] implementation; use
/// [`ForwardsOffset`](crate::follow::ForwardsOffset) as `T` for vectors of
/// strings or tables.
pub struct Vector<'a, T> {
    buf: &'a [u8],
    /// Position of the first element.
    position: usize,
    len: usize,
    _marker: PhantomData<T>,
}

impl<'a, T> Clone for Vector<'a, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T> Copy for Vector<'a, T> {}

impl<'a, T> std::fmt::Debug for Vector<'a, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vector")
            .field("position", &self.position)
            .field("len", &self.len)
            .finish()
    }
}

impl<'a, T: Follow<'a> + Inline> Vector<'a, T> {
    /// Creates a view over the vector whose element count is stored at
    /// `position`. The element area is checked to lie within the buffer.
    pub fn init(buf: &'a [u8], position: usize) -> Result<Vector<'a, T>> {
        let len = read_scalar::<u32>(buf, position)? as usize;
        let start = position + SIZE_UOFFSET;
        slice_at(buf, start, len.saturating_mul(T::SIZE))?;
        Ok(Vector {
            buf,
            position: start,
            len,
            _marker: PhantomData,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Decodes element `index`.
    pub fn get(&self, index: usize) -> Result<T::Inner> {
        verify_arg!(index, index < self.len);
        T::follow(self.buf, self.position + index * T::SIZE)
    }

    /// Raw bytes of the element area.
    pub fn bytes(&self) -> &'a [u8] {
        &self.buf[self.position..self.position + self.len * T::SIZE]
    }

    pub fn iter(&self) -> VectorIter<'a, T> {
        VectorIter {
            vector: *self,
            next: 0,
        }
    }

    /// Decodes all elements into a `Vec`, failing on the first invalid one.
    pub fn to_vec(&self) -> Result<Vec<T::Inner>> {
        self.iter().collect()
    }
}

impl<'a, T: Follow<'a> + Inline> Follow<'a> for Vector<'a, T> {
    type Inner = Vector<'a, T>;

    #[inline]
    fn follow(buf: &'a [u8], position: usize) -> Result<Vector<'a, T>> {
        Vector::init(buf, position)
    }
}

pub struct VectorIter<'a, T> {
    vector: Vector<'a, T>,
    next: usize,
}

impl<'a, T: Follow<'a> + Inline> Iterator for VectorIter<'a, T> {
    type Item = Result<T::Inner>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.vector.len {
            return None;
        }
        let item = self.vector.get(self.next);
        self.next += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.vector.len - self.next;
        (remaining, Some(remaining))
    }
}

impl<'a, T: Follow<'a> + Inline> ExactSizeIterator for VectorIter<'a, T> {}

impl<'a, T: Follow<'a> + Inline> IntoIterator for Vector<'a, T> {
    type Item = Result<T::Inner>;
    type IntoIter = VectorIter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
