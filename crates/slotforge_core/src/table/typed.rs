//! # Typed Object Table
//!
//! [`ObjectTable<T>`] puts values of one type into a [`RawObjectTable`] and
//! owns their construction and destruction.

// SAFETY: Every slot pointer handed out by the raw table is valid storage for
// one `T`. A slot holds an initialised `T` exactly while its handle is valid.
#![allow(unsafe_code)]

use std::marker::PhantomData;
use std::ops::{Index, IndexMut};
use std::ptr;

use super::page::ObjectLayout;
use super::raw::RawObjectTable;
use crate::config::StoreConfig;
use crate::error::StoreResult;
use crate::handle::TypedHandle;

/// Drops the `T` stored at `ptr`.
unsafe fn drop_erased<T>(ptr: *mut u8) {
    ptr::drop_in_place(ptr.cast::<T>());
}

/// Used when the value was moved out before release.
unsafe fn forget_erased(_: *mut u8) {}

/// Generational table of `T` values addressed by [`TypedHandle<T>`].
///
/// # Example
///
/// ```rust
/// use slotforge_core::ObjectTable;
///
/// let mut table: ObjectTable<String> = ObjectTable::new();
/// let handle = table.insert("tile".to_string());
/// assert_eq!(table[handle], "tile");
///
/// table.release(handle);
/// assert!(table.try_get(handle).is_none());
/// ```
pub struct ObjectTable<T> {
    raw: RawObjectTable,
    _marker: PhantomData<T>,
}

/// Handle type of an [`ObjectTable<T>`].
pub type ObjectHandle<T> = TypedHandle<T>;

impl<T> ObjectTable<T> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            raw: RawObjectTable::new(ObjectLayout::of::<T>()),
            _marker: PhantomData,
        }
    }

    /// Creates an empty table sized by `config`.
    #[must_use]
    pub fn with_config(config: &StoreConfig) -> Self {
        Self {
            raw: RawObjectTable::with_config(ObjectLayout::of::<T>(), config),
            _marker: PhantomData,
        }
    }

    /// Returns the untyped implementation.
    #[inline]
    #[must_use]
    pub fn raw(&self) -> &RawObjectTable {
        &self.raw
    }

    /// Returns the number of live objects.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Checks if the table holds no live object.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Allocates a slot holding `T::default()`.
    ///
    /// # Panics
    ///
    /// Panics if the id space is exhausted, like [`Self::insert`].
    pub fn alloc(&mut self) -> TypedHandle<T>
    where
        T: Default,
    {
        self.insert(T::default())
    }

    /// Moves `value` into a new slot.
    ///
    /// # Panics
    ///
    /// Panics if the id space is exhausted. Allocation is otherwise treated as
    /// unable to fail, so this panic is a deliberate exception that keeps the
    /// common path free of `Result`. Use [`Self::try_insert`] to get
    /// [`crate::StoreError::IdSpaceExhausted`] instead.
    pub fn insert(&mut self, value: T) -> TypedHandle<T> {
        let (handle, slot) = self.raw.alloc();
        // SAFETY: Fresh slot storage sized and aligned for T.
        unsafe { slot.as_ptr().cast::<T>().write(value) };
        TypedHandle::from_untyped(handle)
    }

    /// Moves `value` into a new slot.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StoreError::IdSpaceExhausted`] if every id is in use;
    /// `value` is dropped in that case.
    pub fn try_insert(&mut self, value: T) -> StoreResult<TypedHandle<T>> {
        let (handle, slot) = self.raw.try_alloc()?;
        // SAFETY: Fresh slot storage sized and aligned for T.
        unsafe { slot.as_ptr().cast::<T>().write(value) };
        Ok(TypedHandle::from_untyped(handle))
    }

    /// Checks whether `handle` designates a live object.
    #[inline]
    #[must_use]
    pub fn is_valid(&self, handle: TypedHandle<T>) -> bool {
        self.raw.is_valid(handle.untyped())
    }

    /// Returns the object, or `None` for a stale or unassigned handle.
    #[inline]
    #[must_use]
    pub fn try_get(&self, handle: TypedHandle<T>) -> Option<&T> {
        let slot = self.raw.try_get(handle.untyped())?;
        // SAFETY: Valid handle, so the slot holds an initialised T.
        Some(unsafe { slot.cast::<T>().as_ref() })
    }

    /// Returns the object mutably, or `None` for a stale or unassigned handle.
    #[inline]
    #[must_use]
    pub fn try_get_mut(&mut self, handle: TypedHandle<T>) -> Option<&mut T> {
        let slot = self.raw.try_get(handle.untyped())?;
        // SAFETY: Valid handle, and `&mut self` guarantees exclusive access.
        Some(unsafe { slot.cast::<T>().as_mut() })
    }

    /// Returns the object.
    ///
    /// # Panics
    ///
    /// Panics if `handle` is stale or unassigned.
    #[inline]
    #[must_use]
    pub fn get(&self, handle: TypedHandle<T>) -> &T {
        match self.try_get(handle) {
            Some(value) => value,
            None => panic!("invalid object handle {handle:?}"),
        }
    }

    /// Returns the object mutably.
    ///
    /// # Panics
    ///
    /// Panics if `handle` is stale or unassigned.
    #[inline]
    #[must_use]
    pub fn get_mut(&mut self, handle: TypedHandle<T>) -> &mut T {
        match self.try_get_mut(handle) {
            Some(value) => value,
            None => panic!("invalid object handle {handle:?}"),
        }
    }

    /// Returns the object, explaining why the handle is invalid otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StoreError::UnassignedHandle`] or
    /// [`crate::StoreError::StaleHandle`].
    pub fn fetch(&self, handle: TypedHandle<T>) -> StoreResult<&T> {
        self.raw.check(handle.untyped())?;
        Ok(self.get(handle))
    }

    /// Mutable version of [`Self::fetch`].
    ///
    /// # Errors
    ///
    /// Same as [`Self::fetch`].
    pub fn fetch_mut(&mut self, handle: TypedHandle<T>) -> StoreResult<&mut T> {
        self.raw.check(handle.untyped())?;
        Ok(self.get_mut(handle))
    }

    /// Returns the object without validating the handle.
    ///
    /// # Safety
    ///
    /// `handle` must be valid for this table.
    #[inline]
    #[must_use]
    pub unsafe fn get_unchecked(&self, handle: TypedHandle<T>) -> &T {
        self.raw.get_unchecked(handle.untyped()).cast::<T>().as_ref()
    }

    /// Returns the object mutably without validating the handle.
    ///
    /// # Safety
    ///
    /// `handle` must be valid for this table.
    #[inline]
    #[must_use]
    pub unsafe fn get_unchecked_mut(&mut self, handle: TypedHandle<T>) -> &mut T {
        self.raw.get_unchecked(handle.untyped()).cast::<T>().as_mut()
    }

    /// Drops the object and frees its slot.
    ///
    /// Returns `false` for stale, unassigned or already released handles.
    pub fn release(&mut self, handle: TypedHandle<T>) -> bool {
        // SAFETY: A valid slot holds an initialised T.
        unsafe { self.raw.release(handle.untyped(), drop_erased::<T>) }
    }

    /// Moves the object out and frees its slot.
    pub fn remove(&mut self, handle: TypedHandle<T>) -> Option<T> {
        let slot = self.raw.try_get(handle.untyped())?;
        // SAFETY: Valid handle; the slot is released right after without
        // dropping, so the value is read exactly once.
        let value = unsafe { slot.cast::<T>().as_ptr().read() };
        // SAFETY: forget_erased does not touch the storage.
        unsafe { self.raw.release(handle.untyped(), forget_erased) };
        Some(value)
    }

    /// Drops every object and frees all pages.
    pub fn reset(&mut self) {
        // SAFETY: reset only runs the deleter on live slots, which hold a T.
        unsafe { self.raw.reset(drop_erased::<T>) };
    }

    /// Calls `f` on every live object in page order, then slot order.
    pub fn iterate<F>(&self, mut f: F)
    where
        F: FnMut(&T, TypedHandle<T>),
    {
        for (handle, value) in self.iter() {
            f(value, handle);
        }
    }

    /// Calls `f` on every live object mutably, in page order, then slot order.
    pub fn iterate_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut T, TypedHandle<T>),
    {
        for (handle, value) in self.iter_mut() {
            f(value, handle);
        }
    }

    /// Iterates over live objects in page order, then slot order.
    pub fn iter(&self) -> impl Iterator<Item = (TypedHandle<T>, &T)> + '_ {
        self.raw.live_slots().map(|(handle, slot)| {
            // SAFETY: live slots hold an initialised T.
            (TypedHandle::from_untyped(handle), unsafe { slot.cast::<T>().as_ref() })
        })
    }

    /// Iterates mutably over live objects in page order, then slot order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (TypedHandle<T>, &mut T)> + '_ {
        self.raw.live_slots().map(|(handle, slot)| {
            // SAFETY: live slots hold an initialised T, every slot is yielded
            // once, and the iterator borrows the table exclusively.
            (TypedHandle::from_untyped(handle), unsafe { slot.cast::<T>().as_mut() })
        })
    }
}

impl<T> Default for ObjectTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for ObjectTable<T> {
    fn drop(&mut self) {
        self.reset();
    }
}

impl<T> Index<TypedHandle<T>> for ObjectTable<T> {
    type Output = T;

    fn index(&self, handle: TypedHandle<T>) -> &T {
        self.get(handle)
    }
}

impl<T> IndexMut<TypedHandle<T>> for ObjectTable<T> {
    fn index_mut(&mut self, handle: TypedHandle<T>) -> &mut T {
        self.get_mut(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StoreError;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Counts drops through a shared counter.
    struct Tracked {
        drops: Rc<Cell<u32>>,
    }

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.drops.set(self.drops.get() + 1);
        }
    }

    #[test]
    fn test_alloc_default() {
        let mut table: ObjectTable<u32> = ObjectTable::new();
        let handle = table.alloc();
        assert_eq!(*table.get(handle), 0);
        *table.get_mut(handle) = 7;
        assert_eq!(table[handle], 7);
    }

    #[test]
    fn test_release_drops_once() {
        let drops = Rc::new(Cell::new(0));
        let mut table = ObjectTable::new();
        let handle = table.insert(Tracked { drops: drops.clone() });
        assert!(table.release(handle));
        assert!(!table.release(handle));
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn test_reset_and_drop_release_everything() {
        let drops = Rc::new(Cell::new(0));
        let mut table = ObjectTable::new();
        for _ in 0..10 {
            table.insert(Tracked { drops: drops.clone() });
        }
        let survivor = table.insert(Tracked { drops: drops.clone() });
        table.reset();
        assert_eq!(drops.get(), 11);
        assert!(!table.is_valid(survivor));

        for _ in 0..5 {
            table.insert(Tracked { drops: drops.clone() });
        }
        drop(table);
        assert_eq!(drops.get(), 16);
    }

    #[test]
    fn test_remove_moves_value_out() {
        let drops = Rc::new(Cell::new(0));
        let mut table = ObjectTable::new();
        let handle = table.insert(Tracked { drops: drops.clone() });
        let value = table.remove(handle).unwrap();
        assert_eq!(drops.get(), 0);
        assert!(!table.is_valid(handle));
        assert!(table.remove(handle).is_none());
        drop(value);
        assert_eq!(drops.get(), 1);
        drop(table);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn test_fetch_classifies_errors() {
        let mut table: ObjectTable<u8> = ObjectTable::new();
        let handle = table.insert(3);
        assert_eq!(*table.fetch(handle).unwrap(), 3);
        *table.fetch_mut(handle).unwrap() = 4;
        table.release(handle);
        assert!(matches!(
            table.fetch(handle),
            Err(StoreError::StaleHandle { id: 0, generation: 0 })
        ));
        assert!(matches!(
            table.fetch(TypedHandle::INVALID),
            Err(StoreError::UnassignedHandle)
        ));
    }

    #[test]
    #[should_panic(expected = "invalid object handle")]
    fn test_get_panics_on_stale_handle() {
        let mut table: ObjectTable<u8> = ObjectTable::new();
        let handle = table.insert(1);
        table.release(handle);
        let _ = table.get(handle);
    }

    #[test]
    fn test_unchecked_access() {
        let mut table: ObjectTable<u64> = ObjectTable::new();
        let handle = table.insert(10);
        unsafe {
            *table.get_unchecked_mut(handle) += 1;
            assert_eq!(*table.get_unchecked(handle), 11);
        }
    }

    #[test]
    fn test_iter_mut_updates_all() {
        let mut table: ObjectTable<u32> = ObjectTable::new();
        let handles: Vec<_> = (0..100).map(|i| table.insert(i)).collect();
        table.release(handles[50]);
        table.iterate_mut(|value, _| *value *= 2);
        let sum: u32 = table.iter().map(|(_, v)| *v).sum();
        assert_eq!(sum, (0..100).filter(|&i| i != 50).map(|i| i * 2).sum());
    }

    #[test]
    #[should_panic(expected = "id space exhausted: limit 1")]
    fn test_insert_panics_when_ids_run_out() {
        let config = StoreConfig::from_toml_str("[table]\nid_limit = 1\n").unwrap();
        let mut table: ObjectTable<u8> = ObjectTable::with_config(&config);
        table.insert(1);
        table.insert(2);
    }

    #[test]
    fn test_try_insert_reports_exhaustion() {
        let config = StoreConfig::from_toml_str("[table]\nid_limit = 1\n").unwrap();
        let mut table: ObjectTable<String> = ObjectTable::with_config(&config);
        let first = table.insert("a".into());
        assert!(matches!(
            table.try_insert("b".into()),
            Err(StoreError::IdSpaceExhausted { limit: 1 })
        ));
        assert!(table.remove(first).is_some());
        assert!(table.try_insert("c".into()).is_ok());
    }

    #[test]
    fn test_zero_sized_values() {
        let mut table: ObjectTable<()> = ObjectTable::new();
        let a = table.alloc();
        let b = table.alloc();
        assert_ne!(a, b);
        assert_eq!(table.len(), 2);
        assert!(table.release(a));
        assert_eq!(table.iter().count(), 1);
    }
}
