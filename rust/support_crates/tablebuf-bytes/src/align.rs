/// Aligns a number up to the next multiple of the specified alignment.
///
/// # Examples
///
/// ```
/// use tablebuf_bytes::align::align_up;
///
/// assert_eq!(align_up(0, 8), 0);
/// assert_eq!(align_up(1, 8), 8);
/// assert_eq!(align_up(8, 8), 8);
/// assert_eq!(align_up(9, 4), 12);
/// ```
///
/// # Panics
///
/// Panics in debug builds if `alignment` is zero or not a power of 2.
#[inline]
pub fn align_up(n: usize, alignment: usize) -> usize {
    debug_assert_ne!(alignment, 0);
    debug_assert!(alignment.is_power_of_two());
    (n + alignment - 1) & !(alignment - 1)
}

/// Returns the number of padding bytes needed to bring `len` up to a multiple
/// of `alignment`.
///
/// The back buffer measures positions from its end, so this is the amount of
/// zero bytes to prepend before writing a value of the given alignment once
/// `len` bytes have been written.
///
/// ```
/// use tablebuf_bytes::align::padding_for;
///
/// assert_eq!(padding_for(0, 4), 0);
/// assert_eq!(padding_for(5, 4), 3);
/// assert_eq!(padding_for(6, 2), 0);
/// assert_eq!(padding_for(13, 8), 3);
/// ```
#[inline]
pub fn padding_for(len: usize, alignment: usize) -> usize {
    debug_assert_ne!(alignment, 0);
    debug_assert!(alignment.is_power_of_two());
    len.wrapping_neg() & (alignment - 1)
}

/// Checks if a number is aligned to the specified alignment boundary.
///
/// ```
/// use tablebuf_bytes::align::is_aligned;
///
/// assert!(is_aligned(0, 8));
/// assert!(!is_aligned(7, 8));
/// assert!(is_aligned(16, 8));
/// ```
#[inline]
pub fn is_aligned(n: usize, alignment: usize) -> bool {
    debug_assert_ne!(alignment, 0);
    debug_assert!(alignment.is_power_of_two());
    (n & (alignment - 1)) == 0
}
