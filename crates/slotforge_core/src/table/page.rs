//! # Object Pages
//!
//! A page is one heap block holding `PAGE_SIZE` generation words followed by
//! `PAGE_SIZE` object slots:
//!
//! ```text
//! | gen[0] .. gen[1023] | pad | obj[0] | obj[1] | .. | obj[1023] |
//!                              ^ aligned to the object alignment
//! ```
//!
//! The padding is whatever `Layout::extend` needs to align the object region,
//! so over-aligned types (SIMD vectors, cache-line padded structs) share the
//! block with the 4-byte generation words.

// SAFETY: This module owns raw page buffers.
// Every pointer handed out stays inside the page allocation.
#![allow(unsafe_code)]

use std::alloc::{alloc, dealloc, handle_alloc_error, Layout};
use std::ptr::NonNull;

use crate::error::{StoreError, StoreResult};
use crate::handle::{Handle, ID_MASK, INVALID_ID};

/// Number of slots in one page.
pub const PAGE_SIZE: usize = 1024;

/// Size, alignment and derived page geometry of the objects stored in a table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObjectLayout {
    size: usize,
    align: usize,
    stride: usize,
    objects_offset: usize,
    page: Layout,
}

impl ObjectLayout {
    /// Computes the page geometry for objects of `size` bytes aligned to `align`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidLayout`] if `align` is not a power of two
    /// or a page of such objects would not fit in the address space.
    pub fn new(size: usize, align: usize) -> StoreResult<Self> {
        let invalid = StoreError::InvalidLayout { size, align };
        if !align.is_power_of_two() {
            return Err(invalid);
        }
        let Some(stride) = size.checked_add(align - 1).map(|s| s & !(align - 1)) else {
            return Err(invalid);
        };
        let Some((page, objects_offset)) = Self::page_layout(stride, align) else {
            return Err(invalid);
        };
        Ok(Self {
            size,
            align,
            stride,
            objects_offset,
            page,
        })
    }

    /// Layout for values of type `T`.
    ///
    /// # Panics
    ///
    /// Panics if a page of `T` does not fit in the address space.
    #[must_use]
    pub fn of<T>() -> Self {
        Self::new(std::mem::size_of::<T>(), std::mem::align_of::<T>())
            .expect("Invalid object layout")
    }

    fn page_layout(stride: usize, align: usize) -> Option<(Layout, usize)> {
        let generations = Layout::array::<u32>(PAGE_SIZE).ok()?;
        let objects = Layout::from_size_align(stride.checked_mul(PAGE_SIZE)?, align).ok()?;
        let (layout, offset) = generations.extend(objects).ok()?;
        Some((layout.pad_to_align(), offset))
    }

    /// Object size in bytes.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Object alignment in bytes.
    #[inline]
    #[must_use]
    pub const fn align(&self) -> usize {
        self.align
    }

    /// Distance between two consecutive slots.
    #[inline]
    #[must_use]
    pub const fn stride(&self) -> usize {
        self.stride
    }

    /// Size in bytes of one page allocation.
    #[inline]
    #[must_use]
    pub const fn page_bytes(&self) -> usize {
        self.page.size()
    }
}

/// One block of slots.
///
/// Each generation word holds the last handle value of its slot: the live
/// handle while occupied, `INVALID_ID` plus the next generation once released.
pub(crate) struct Page {
    buffer: NonNull<u8>,
    objects: NonNull<u8>,
    layout: Layout,
    /// Live slots in this page.
    pub(crate) used: u32,
    /// One past the highest live local slot.
    pub(crate) max_id: u32,
}

impl Page {
    /// Allocates a page with every slot empty at generation 0.
    pub(crate) fn new(object: &ObjectLayout) -> Self {
        let layout = object.page;
        // SAFETY: The page layout always has a non-zero size (the generation words).
        let buffer = unsafe {
            let ptr = alloc(layout);
            let Some(buffer) = NonNull::new(ptr) else {
                handle_alloc_error(layout);
            };
            let generations = buffer.as_ptr().cast::<u32>();
            for local in 0..PAGE_SIZE {
                generations.add(local).write(Handle::INVALID.to_raw());
            }
            buffer
        };
        // SAFETY: objects_offset was produced by Layout::extend for this layout.
        let objects = unsafe { NonNull::new_unchecked(buffer.as_ptr().add(object.objects_offset)) };

        Self {
            buffer,
            objects,
            layout,
            used: 0,
            max_id: 0,
        }
    }

    /// Reads the generation word of a local slot.
    #[inline]
    pub(crate) fn slot_value(&self, local: usize) -> u32 {
        debug_assert!(local < PAGE_SIZE);
        // SAFETY: Callers pass `id % PAGE_SIZE` or a bound below `max_id`,
        // so local < PAGE_SIZE; all generation words were initialised.
        unsafe { self.buffer.as_ptr().cast::<u32>().add(local).read() }
    }

    /// Overwrites the generation word of a local slot.
    #[inline]
    pub(crate) fn set_slot_value(&mut self, local: usize, value: u32) {
        debug_assert!(local < PAGE_SIZE);
        // SAFETY: local < PAGE_SIZE as in `slot_value`, and `&mut self` gives
        // exclusive access.
        unsafe { self.buffer.as_ptr().cast::<u32>().add(local).write(value) }
    }

    /// Checks whether a local slot currently holds an object.
    #[inline]
    pub(crate) fn is_live(&self, local: usize) -> bool {
        self.slot_value(local) & ID_MASK != INVALID_ID
    }

    /// Pointer to the storage of a local slot.
    #[inline]
    pub(crate) fn object_ptr(&self, local: usize, stride: usize) -> NonNull<u8> {
        debug_assert!(local < PAGE_SIZE);
        // SAFETY: local * stride is inside the object region of this allocation.
        unsafe { NonNull::new_unchecked(self.objects.as_ptr().add(local * stride)) }
    }

    /// Recomputes `max_id` after the trailing live slot was released.
    pub(crate) fn shrink_max_id(&mut self) {
        let mut bound = self.max_id as usize;
        while bound > 0 && !self.is_live(bound - 1) {
            bound -= 1;
        }
        // bound <= PAGE_SIZE
        self.max_id = bound as u32;
    }
}

impl Drop for Page {
    fn drop(&mut self) {
        // SAFETY: buffer was allocated in `Page::new` with this exact layout.
        unsafe {
            dealloc(self.buffer.as_ptr(), self.layout);
        }
    }
}

// SAFETY: A page is plain memory owned by exactly one table. Thread-safety of
// the objects inside is enforced by the typed table's bounds.
unsafe impl Send for Page {}
// SAFETY: Shared access to a page only reads generation words.
unsafe impl Sync for Page {}
