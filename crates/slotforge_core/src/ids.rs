//! # Id Generator
//!
//! Hands out small reusable integer ids. Returned ids are recycled before any
//! fresh id, lowest id first, which keeps object tables densely packed.

use std::collections::BTreeSet;

/// Allocator of reusable integer ids in `0..limit`.
///
/// # Example
///
/// ```rust
/// use slotforge_core::IdGenerator;
///
/// let mut ids = IdGenerator::new();
/// let a = ids.get().unwrap();
/// let b = ids.get().unwrap();
/// ids.release(a);
/// assert_eq!(ids.get(), Some(a));
/// assert_eq!(b, 1);
/// ```
#[derive(Clone, Debug)]
pub struct IdGenerator {
    /// Released ids below `next`.
    free: BTreeSet<u32>,
    /// First id never handed out.
    next: u32,
    /// Exclusive upper bound.
    limit: u32,
    /// Ids currently handed out.
    count: u32,
}

impl IdGenerator {
    /// Creates a generator over the whole `u32` range.
    #[must_use]
    pub fn new() -> Self {
        Self::with_limit(u32::MAX)
    }

    /// Creates a generator handing out ids in `0..limit`.
    #[must_use]
    pub fn with_limit(limit: u32) -> Self {
        Self {
            free: BTreeSet::new(),
            next: 0,
            limit,
            count: 0,
        }
    }

    /// Returns the exclusive upper bound.
    #[inline]
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Returns the number of ids currently handed out.
    #[inline]
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// Returns one past the highest id in use or held on the free list.
    ///
    /// Releasing the top id lowers it again.
    #[inline]
    #[must_use]
    pub const fn high_water(&self) -> u32 {
        self.next
    }

    /// Takes the lowest available id, or `None` when the range is exhausted.
    pub fn get(&mut self) -> Option<u32> {
        let id = match self.free.pop_first() {
            Some(id) => id,
            None if self.next < self.limit => {
                let id = self.next;
                self.next += 1;
                id
            }
            None => return None,
        };
        self.count += 1;
        Some(id)
    }

    /// Returns the id [`Self::get`] would hand out next, without taking it.
    #[must_use]
    pub fn peek(&self) -> Option<u32> {
        match self.free.first() {
            Some(&id) => Some(id),
            None if self.next < self.limit => Some(self.next),
            None => None,
        }
    }

    /// Marks a specific id as taken.
    ///
    /// Returns `false` if the id is out of range or already taken.
    pub fn reserve(&mut self, id: u32) -> bool {
        if id >= self.limit {
            return false;
        }
        if id >= self.next {
            self.free.extend(self.next..id);
            self.next = id + 1;
        } else if !self.free.remove(&id) {
            return false;
        }
        self.count += 1;
        true
    }

    /// Gives an id back. Returning an id that is not taken is ignored.
    pub fn release(&mut self, id: u32) -> bool {
        if id >= self.next || !self.free.insert(id) {
            return false;
        }
        self.count -= 1;
        // Fold trailing free ids back into the fresh range.
        while self.next > 0 && self.free.remove(&(self.next - 1)) {
            self.next -= 1;
        }
        true
    }

    /// Checks whether `id` is currently handed out.
    #[must_use]
    pub fn is_taken(&self, id: u32) -> bool {
        id < self.next && !self.free.contains(&id)
    }

    /// Returns every id to the generator.
    pub fn reset(&mut self) {
        self.free.clear();
        self.next = 0;
        self.count = 0;
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
