use std::marker::PhantomData;

/// Index of a field within its table, in declaration order.
pub type FieldIndex = u16;

/// Largest number of fields a table can declare: the vtable size is itself a
/// `u16`, and the header takes two of its entries.
pub const MAX_FIELD_COUNT: usize = (u16::MAX as usize - crate::codec::VTABLE_HEADER_SIZE) / 2;

/// Position of an already written value inside a buffer under construction.
///
/// The value is measured from the *end* of the buffer, since that is the only
/// fixed point while the builder grows toward lower addresses. A zero offset is
/// the null offset: nothing is ever written at position 0, and a null offset
/// passed for a table field leaves the field absent.
///
/// The type parameter records what lives at the position (`str`, `[T]`, a table
/// marker type), so that offsets cannot be stored into slots of the wrong type.
pub struct Offset<T: ?Sized> {
    value: u32,
    _marker: PhantomData<fn() -> *const T>,
}

impl<T: ?Sized> Offset<T> {
    #[inline]
    pub const fn new(value: u32) -> Offset<T> {
        Offset {
            value,
            _marker: PhantomData,
        }
    }

    /// The null offset: "no value".
    #[inline]
    pub const fn null() -> Offset<T> {
        Offset::new(0)
    }

    #[inline]
    pub const fn value(self) -> u32 {
        self.value
    }

    #[inline]
    pub const fn is_null(self) -> bool {
        self.value == 0
    }

    /// Reinterprets the offset as pointing to a value of type `U`.
    #[inline]
    pub const fn cast<U: ?Sized>(self) -> Offset<U> {
        Offset::new(self.value)
    }
}

impl<T: ?Sized> Clone for Offset<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for Offset<T> {}

impl<T: ?Sized> PartialEq for Offset<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T: ?Sized> Eq for Offset<T> {}

impl<T: ?Sized> std::hash::Hash for Offset<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T: ?Sized> Default for Offset<T> {
    fn default() -> Self {
        Offset::null()
    }
}

impl<T: ?Sized> std::fmt::Debug for Offset<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Offset({})", self.value)
    }
}

/// Marker for a finished table whose schema type is not tracked.
pub enum AnyTable {}
