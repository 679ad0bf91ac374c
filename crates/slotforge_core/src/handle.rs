//! # Object Handles
//!
//! Handles are 32-bit identifiers consisting of:
//! - A 26-bit slot id (lower bits)
//! - A 6-bit generation counter (upper bits) for detecting stale references
//!
//! The raw value is what gets embedded in component records, so the bit
//! layout is part of the public contract.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use bytemuck::{Pod, Zeroable};

/// Number of bits used by the generation counter.
pub const GENERATION_BITS: u32 = 6;
/// Position of the generation counter inside the raw value.
pub const GENERATION_SHIFT: u32 = 32 - GENERATION_BITS;
/// Mask selecting the generation bits of a raw value.
pub const GENERATION_MASK: u32 = ((1 << GENERATION_BITS) - 1) << GENERATION_SHIFT;
/// Mask selecting the id bits of a raw value.
pub const ID_MASK: u32 = !GENERATION_MASK;
/// Id value marking an unassigned handle or an empty slot.
pub const INVALID_ID: u32 = ID_MASK;
/// Largest generation value; the next release wraps back to 0.
pub const MAX_GENERATION: u32 = (1 << GENERATION_BITS) - 1;

/// Returns the generation stored in a raw handle value.
#[inline]
#[must_use]
pub const fn generation_of(raw: u32) -> u32 {
    raw >> GENERATION_SHIFT
}

/// Returns the generation following `generation`, wrapping after [`MAX_GENERATION`].
#[inline]
#[must_use]
pub const fn next_generation(generation: u32) -> u32 {
    if generation >= MAX_GENERATION {
        0
    } else {
        generation + 1
    }
}

/// Stamps `id` with the generation currently stored in `slot_value`.
#[inline]
#[must_use]
pub const fn compose(slot_value: u32, id: u32) -> u32 {
    (generation_of(slot_value) << GENERATION_SHIFT) | (id & ID_MASK)
}

/// Value a slot holds once released: next generation, invalid id.
#[inline]
#[must_use]
pub const fn release_value(slot_value: u32) -> u32 {
    (next_generation(generation_of(slot_value)) << GENERATION_SHIFT) | INVALID_ID
}

/// Untyped handle to a slot of an object table.
///
/// Ordering and hashing follow the raw value. `Pod` so handle arrays can be
/// viewed as plain `u32` words.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Pod, Zeroable)]
#[repr(transparent)]
pub struct Handle(u32);

impl Handle {
    /// The unassigned handle (generation 0, invalid id).
    pub const INVALID: Self = Self(INVALID_ID);

    /// Rebuilds a handle from its raw 32-bit value.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw 32-bit value.
    #[inline]
    #[must_use]
    pub const fn to_raw(self) -> u32 {
        self.0
    }

    /// Returns the slot id.
    #[inline]
    #[must_use]
    pub const fn id(self) -> u32 {
        self.0 & ID_MASK
    }

    /// Returns the generation (0 to [`MAX_GENERATION`]).
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        generation_of(self.0)
    }

    /// Checks whether the handle was ever assigned to a slot.
    #[inline]
    #[must_use]
    pub const fn is_assigned(self) -> bool {
        self.id() != INVALID_ID
    }
}

impl Default for Handle {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_assigned() {
            write!(f, "Handle({}v{})", self.id(), self.generation())
        } else {
            write!(f, "Handle(unassigned)")
        }
    }
}

/// Handle bound to the object type of an [`crate::ObjectTable`].
///
/// Same representation as [`Handle`]; the type parameter only prevents
/// handing a handle to the wrong table.
#[repr(transparent)]
pub struct TypedHandle<T> {
    raw: Handle,
    _marker: PhantomData<fn() -> T>,
}

impl<T> TypedHandle<T> {
    /// The unassigned handle.
    pub const INVALID: Self = Self::from_untyped(Handle::INVALID);

    /// Wraps an untyped handle.
    #[inline]
    #[must_use]
    pub const fn from_untyped(raw: Handle) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }

    /// Returns the untyped handle.
    #[inline]
    #[must_use]
    pub const fn untyped(self) -> Handle {
        self.raw
    }

    /// Returns the slot id.
    #[inline]
    #[must_use]
    pub const fn id(self) -> u32 {
        self.raw.id()
    }

    /// Returns the generation.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.raw.generation()
    }

    /// Checks whether the handle was ever assigned to a slot.
    #[inline]
    #[must_use]
    pub const fn is_assigned(self) -> bool {
        self.raw.is_assigned()
    }
}

// Manual impls: derives would require `T` to implement these traits.
impl<T> Clone for TypedHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for TypedHandle<T> {}

impl<T> PartialEq for TypedHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T> Eq for TypedHandle<T> {}

impl<T> PartialOrd for TypedHandle<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for TypedHandle<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl<T> Hash for TypedHandle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T> Default for TypedHandle<T> {
    fn default() -> Self {
        Self::INVALID
    }
}

impl<T> fmt::Debug for TypedHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.raw.fmt(f)
    }
}

impl<T> From<TypedHandle<T>> for Handle {
    fn from(handle: TypedHandle<T>) -> Self {
        handle.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(GENERATION_MASK, 0xFC00_0000);
        assert_eq!(ID_MASK, 0x03FF_FFFF);
        assert_eq!(MAX_GENERATION, 63);
        assert_eq!(Handle::INVALID.to_raw(), 0x03FF_FFFF);
    }

    #[test]
    fn test_default_is_unassigned() {
        let handle = Handle::default();
        assert!(!handle.is_assigned());
        assert_eq!(handle.generation(), 0);
        assert!(!TypedHandle::<u64>::default().is_assigned());
    }

    #[test]
    fn test_compose_keeps_slot_generation() {
        let slot = release_value(compose(Handle::INVALID.to_raw(), 7));
        let handle = Handle::from_raw(compose(slot, 7));
        assert_eq!(handle.id(), 7);
        assert_eq!(handle.generation(), 1);
    }

    #[test]
    fn test_release_value_invalidates_id() {
        let live = compose(0, 42);
        let released = release_value(live);
        assert_eq!(released & ID_MASK, INVALID_ID);
        assert_eq!(generation_of(released), 1);
    }

    #[test]
    fn test_generation_wraps() {
        assert_eq!(next_generation(MAX_GENERATION - 1), MAX_GENERATION);
        assert_eq!(next_generation(MAX_GENERATION), 0);

        let mut slot = Handle::INVALID.to_raw();
        for _ in 0..=MAX_GENERATION {
            slot = release_value(slot);
        }
        assert_eq!(generation_of(slot), 0);
    }

    #[test]
    fn test_typed_handle_is_transparent() {
        assert_eq!(
            std::mem::size_of::<TypedHandle<[u8; 64]>>(),
            std::mem::size_of::<u32>()
        );
        let raw = Handle::from_raw(compose(0, 3));
        let typed = TypedHandle::<String>::from_untyped(raw);
        assert_eq!(Handle::from(typed), raw);
        assert_eq!(typed.id(), 3);
    }

    #[test]
    fn test_ordering_follows_raw_value() {
        let a = Handle::from_raw(compose(0, 1));
        let b = Handle::from_raw(compose(release_value(0), 1));
        assert!(a < b);
        assert_ne!(a, b);
    }

    #[test]
    fn test_handles_cast_to_words() {
        let handles = [Handle::INVALID, Handle::from_raw(compose(0, 9))];
        let words: &[u32] = bytemuck::cast_slice(&handles);
        assert_eq!(words, &[INVALID_ID, 9]);
    }
}
