//! # Untyped Object Table
//!
//! The paged, generation-checked arena underneath every [`crate::ObjectTable`].
//! It only knows object size and alignment; construction and destruction are
//! the caller's business, the latter through a [`Deleter`] callback.

// SAFETY: Slots are raw memory. The table never reads object bytes itself,
// it only forwards slot pointers to callers and deleters.
#![allow(unsafe_code)]

use std::ptr::NonNull;

use tracing::{debug, trace, warn};

use super::page::{ObjectLayout, Page, PAGE_SIZE};
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::handle::{compose, release_value, Handle, ID_MASK, INVALID_ID};
use crate::ids::IdGenerator;

/// Type-erased destructor run on a slot before it is released.
///
/// The pointer addresses a slot of the table's object layout.
pub type Deleter = unsafe fn(*mut u8);

/// Splits a slot id into (page index, local slot).
#[inline]
const fn split(id: u32) -> (usize, usize) {
    let id = id as usize;
    (id / PAGE_SIZE, id % PAGE_SIZE)
}

/// Paged storage for objects of one layout.
///
/// # Pointer Stability
///
/// Page headers live in a `Vec` that reallocates when the table grows, but
/// every page buffer is its own heap block: a live object never moves.
///
/// # Drop
///
/// Dropping the table frees its pages without running any deleter. Call
/// [`RawObjectTable::reset`] first if the slots hold values that need dropping.
pub struct RawObjectTable {
    /// Page headers, indexed by `id / PAGE_SIZE`.
    pages: Vec<Page>,
    /// Geometry of the stored objects.
    layout: ObjectLayout,
    /// Slot id allocator.
    ids: IdGenerator,
    /// Live objects across all pages.
    len: u32,
}

impl RawObjectTable {
    /// Creates an empty table. No page is allocated until the first `alloc`.
    #[must_use]
    pub fn new(layout: ObjectLayout) -> Self {
        Self {
            pages: Vec::new(),
            layout,
            ids: IdGenerator::with_limit(INVALID_ID),
            len: 0,
        }
    }

    /// Creates an empty table sized by `config`.
    #[must_use]
    pub fn with_config(layout: ObjectLayout, config: &StoreConfig) -> Self {
        let mut table = Self::new(layout);
        table.ids = IdGenerator::with_limit(config.table.effective_id_limit().min(INVALID_ID));
        table.pages.reserve_exact(config.table.reserve_pages as usize);
        table
    }

    /// Returns the object layout.
    #[inline]
    #[must_use]
    pub const fn layout(&self) -> &ObjectLayout {
        &self.layout
    }

    /// Returns the number of live objects.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len as usize
    }

    /// Checks if the table holds no live object.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of allocated pages.
    #[inline]
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Returns the number of slots in allocated pages.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.pages.len() * PAGE_SIZE
    }

    /// Reserves room for `additional` more page headers.
    pub fn reserve_pages(&mut self, additional: usize) {
        self.pages.reserve(additional);
    }

    /// Allocates a slot and returns its handle and uninitialised storage.
    ///
    /// # Panics
    ///
    /// Panics if the id space is exhausted. Allocation is otherwise treated as
    /// unable to fail, so this panic is a deliberate exception that keeps the
    /// common path free of `Result`. Use [`Self::try_alloc`] to get
    /// [`StoreError::IdSpaceExhausted`] instead.
    pub fn alloc(&mut self) -> (Handle, NonNull<u8>) {
        match self.try_alloc() {
            Ok(slot) => slot,
            Err(err) => panic!("{err}"),
        }
    }

    /// Allocates a slot and returns its handle and uninitialised storage.
    ///
    /// The lowest free id is used. The handle carries the slot's current
    /// generation, which was advanced when the slot was last released.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::IdSpaceExhausted`] if every id is in use.
    pub fn try_alloc(&mut self) -> StoreResult<(Handle, NonNull<u8>)> {
        let Some(id) = self.ids.get() else {
            let limit = self.ids.limit();
            warn!(limit, "object table id space exhausted");
            return Err(StoreError::IdSpaceExhausted { limit });
        };

        let (page_index, local) = split(id);
        if page_index >= self.pages.len() {
            self.grow_to(page_index + 1);
        }

        let stride = self.layout.stride();
        let page = &mut self.pages[page_index];
        let value = compose(page.slot_value(local), id);
        page.set_slot_value(local, value);
        // local < PAGE_SIZE
        page.max_id = page.max_id.max(local as u32 + 1);
        page.used += 1;
        self.len += 1;

        Ok((Handle::from_raw(value), page.object_ptr(local, stride)))
    }

    fn grow_to(&mut self, page_count: usize) {
        let added = page_count - self.pages.len();
        self.pages.reserve_exact(added);
        while self.pages.len() < page_count {
            self.pages.push(Page::new(&self.layout));
        }
        debug!(
            pages = page_count,
            added,
            page_bytes = self.layout.page_bytes(),
            "object table grew"
        );
    }

    /// Finds the page and local slot a handle points to, if in range.
    #[inline]
    fn locate(&self, handle: Handle) -> Option<(&Page, usize)> {
        if !handle.is_assigned() {
            return None;
        }
        let (page_index, local) = split(handle.id());
        self.pages.get(page_index).map(|page| (page, local))
    }

    /// Checks whether a handle designates a live object of this table.
    #[inline]
    #[must_use]
    pub fn is_valid(&self, handle: Handle) -> bool {
        self.locate(handle)
            .is_some_and(|(page, local)| page.slot_value(local) == handle.to_raw())
    }

    /// Returns the storage of a live object, or `None` for stale,
    /// unassigned or foreign handles.
    #[inline]
    #[must_use]
    pub fn try_get(&self, handle: Handle) -> Option<NonNull<u8>> {
        let (page, local) = self.locate(handle)?;
        (page.slot_value(local) == handle.to_raw())
            .then(|| page.object_ptr(local, self.layout.stride()))
    }

    /// Explains why a handle is not valid.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnassignedHandle`] or [`StoreError::StaleHandle`].
    pub fn check(&self, handle: Handle) -> StoreResult<()> {
        if !handle.is_assigned() {
            return Err(StoreError::UnassignedHandle);
        }
        if self.is_valid(handle) {
            Ok(())
        } else {
            Err(StoreError::StaleHandle {
                id: handle.id(),
                generation: handle.generation(),
            })
        }
    }

    /// Returns the storage of an object without validating the handle.
    ///
    /// Debug builds still assert validity.
    ///
    /// # Safety
    ///
    /// `handle` must be valid for this table (see [`Self::is_valid`]).
    #[inline]
    #[must_use]
    pub unsafe fn get_unchecked(&self, handle: Handle) -> NonNull<u8> {
        debug_assert!(self.is_valid(handle), "invalid handle {handle:?}");
        let (page_index, local) = split(handle.id());
        self.pages
            .get_unchecked(page_index)
            .object_ptr(local, self.layout.stride())
    }

    /// Releases a live object, running `deleter` on its storage.
    ///
    /// Stale, unassigned and already released handles are ignored.
    /// Returns `true` if an object was released.
    ///
    /// # Safety
    ///
    /// `deleter` must be sound to call on the storage of this slot.
    pub unsafe fn release(&mut self, handle: Handle, deleter: Deleter) -> bool {
        if !handle.is_assigned() {
            return false;
        }
        let id = handle.id();
        let (page_index, local) = split(id);
        let stride = self.layout.stride();
        let Some(page) = self.pages.get_mut(page_index) else {
            trace!(?handle, "release of out-of-range handle ignored");
            return false;
        };

        let current = page.slot_value(local);
        if current != handle.to_raw() {
            trace!(?handle, slot = current, "release of stale handle ignored");
            return false;
        }

        // Book-keeping first: a panicking deleter must not leave the slot live.
        page.set_slot_value(local, release_value(current));
        debug_assert!(page.used > 0, "live slot in a page counted empty");
        page.used -= 1;
        if local as u32 + 1 == page.max_id {
            page.shrink_max_id();
        }
        let object = page.object_ptr(local, stride);
        self.ids.release(id);
        self.len -= 1;

        deleter(object.as_ptr());
        true
    }

    /// Runs `deleter` on every live object and frees all pages.
    ///
    /// # Safety
    ///
    /// `deleter` must be sound to call on the storage of every live slot.
    pub unsafe fn reset(&mut self, deleter: Deleter) {
        let stride = self.layout.stride();
        let released = self.len;
        for page in &mut self.pages {
            for local in 0..page.max_id as usize {
                let current = page.slot_value(local);
                if current & ID_MASK != INVALID_ID {
                    page.set_slot_value(local, release_value(current));
                    deleter(page.object_ptr(local, stride).as_ptr());
                }
            }
            page.used = 0;
            page.max_id = 0;
        }
        let pages = self.pages.len();
        self.pages.clear();
        self.ids.reset();
        self.len = 0;
        debug!(pages, released, "object table reset");
    }

    /// Iterates over live slots in page order, then slot order.
    pub fn live_slots(&self) -> impl Iterator<Item = (Handle, NonNull<u8>)> + '_ {
        let stride = self.layout.stride();
        self.pages.iter().flat_map(move |page| {
            (0..page.max_id as usize).filter_map(move |local| {
                let value = page.slot_value(local);
                (value & ID_MASK != INVALID_ID)
                    .then(|| (Handle::from_raw(value), page.object_ptr(local, stride)))
            })
        })
    }

    /// Iterates over the handles of live objects in page order, then slot order.
    pub fn live_handles(&self) -> impl Iterator<Item = Handle> + '_ {
        self.live_slots().map(|(handle, _)| handle)
    }
}
