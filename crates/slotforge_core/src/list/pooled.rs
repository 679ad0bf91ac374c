//! # Pooled List
//!
//! A doubly linked list whose nodes live in a shared [`Pool`]. The list only
//! stores its first and last node indices; the pool is passed to every call.
//!
//! ```text
//! Pool nodes:  [ a | x | b | y | c ]     list A: a -> b -> c
//!                                         list B: x -> y
//! ```
//!
//! Every node carries the identity of the list that linked it. A list only
//! follows, edits or frees nodes stamped with its own identity, so a cursor
//! that outlived its node, or came from another list, cannot reach into a
//! foreign chain.

// SAFETY: Only `IterMut` needs unsafe, to hand out `&mut T` to distinct
// nodes of one exclusively borrowed pool.
#![allow(unsafe_code)]

use std::iter::FusedIterator;
use std::marker::PhantomData;

use super::pool::{ListId, ListNode, Pool, PoolId, NIL};

/// Position inside a [`PooledList`]; [`Cursor::END`] is one past the last node.
///
/// A cursor stays usable until its node is erased. After that the list
/// treats it as a position it does not contain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Cursor(i32);

impl Cursor {
    /// The past-the-end position.
    pub const END: Self = Self(NIL);

    /// Checks if this is the past-the-end position.
    #[inline]
    #[must_use]
    pub const fn is_end(self) -> bool {
        self.0 == NIL
    }

    /// Returns the pool node index, or `None` at the end.
    #[inline]
    #[must_use]
    pub const fn node_index(self) -> Option<u32> {
        if self.0 == NIL {
            None
        } else {
            Some(self.0 as u32)
        }
    }

    /// Returns the following position.
    #[inline]
    #[must_use]
    pub fn next<T>(self, pool: &Pool<T>) -> Self {
        Self(pool.node(self.0).map_or(NIL, |node| node.next))
    }

    /// Returns the preceding position, or [`Cursor::END`] before the first node.
    #[inline]
    #[must_use]
    pub fn prev<T>(self, pool: &Pool<T>) -> Self {
        Self(pool.node(self.0).map_or(NIL, |node| node.prev))
    }
}

/// Doubly linked list of `T` stored in a shared [`Pool<T>`].
///
/// The list does not own its pool. Dropping a list without [`Self::clear`]
/// leaves its nodes allocated until the pool itself is dropped.
///
/// Copies are explicit ([`Self::duplicate`]) and always allocate fresh nodes;
/// two lists never share a node.
///
/// # Panics
///
/// Every operation taking a pool panics if it is not the pool the list was
/// created with.
///
/// # Example
///
/// ```rust
/// use slotforge_core::{Pool, PooledList};
///
/// let mut pool = Pool::new();
/// let mut starts = PooledList::new(&pool);
/// let mut ends = PooledList::new(&pool);
///
/// starts.push_back(&mut pool, 1u32);
/// ends.push_back(&mut pool, 7u32);
/// starts.push_back(&mut pool, 2u32);
///
/// assert_eq!(starts.iter(&pool).copied().collect::<Vec<_>>(), vec![1, 2]);
/// assert_eq!(ends.iter(&pool).copied().collect::<Vec<_>>(), vec![7]);
/// ```
#[derive(Debug)]
pub struct PooledList<T> {
    /// First node, or `NIL`.
    begin: i32,
    /// Last node, or `NIL`.
    last: i32,
    /// Pool the nodes belong to.
    pool: PoolId,
    /// Stamp on every node of this chain.
    id: ListId,
    _marker: PhantomData<fn() -> T>,
}

impl<T> PooledList<T> {
    /// Creates an empty list using nodes of `pool`.
    #[must_use]
    pub fn new(pool: &Pool<T>) -> Self {
        Self::empty_in(pool.id())
    }

    fn empty_in(pool: PoolId) -> Self {
        Self {
            begin: NIL,
            last: NIL,
            pool,
            id: ListId::fresh(),
            _marker: PhantomData,
        }
    }

    #[inline]
    fn check_pool(&self, pool: &Pool<T>) {
        assert_eq!(self.pool, pool.id(), "list used with a foreign pool");
    }

    /// A node of this chain, reached through a link of this chain.
    fn chain_mut<'p>(&self, pool: &'p mut Pool<T>, index: i32) -> &'p mut ListNode<T> {
        match pool.owned_mut(index, self.id) {
            Some(node) => node,
            None => panic!("list link to node {index} it does not own"),
        }
    }

    /// Returns the identity of the pool this list lives in.
    #[inline]
    #[must_use]
    pub const fn pool_id(&self) -> PoolId {
        self.pool
    }

    /// Checks if the list is empty.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.begin == NIL
    }

    /// Counts the elements. O(n).
    #[must_use]
    pub fn len(&self, pool: &Pool<T>) -> usize {
        self.iter(pool).count()
    }

    /// Position of the first element.
    #[inline]
    #[must_use]
    pub const fn begin(&self) -> Cursor {
        Cursor(self.begin)
    }

    /// Past-the-end position.
    #[inline]
    #[must_use]
    pub const fn end(&self) -> Cursor {
        Cursor::END
    }

    /// Position of the last element, or [`Cursor::END`] if empty.
    #[inline]
    #[must_use]
    pub const fn last(&self) -> Cursor {
        Cursor(self.last)
    }

    /// Checks whether `at` designates an element of this list.
    #[inline]
    #[must_use]
    pub fn contains(&self, pool: &Pool<T>, at: Cursor) -> bool {
        self.check_pool(pool);
        pool.owned(at.0, self.id).is_some()
    }

    /// Element at `at`, or `None` at the end or for a position not in this list.
    #[must_use]
    pub fn get<'a>(&self, pool: &'a Pool<T>, at: Cursor) -> Option<&'a T> {
        self.check_pool(pool);
        pool.owned(at.0, self.id)?.value()
    }

    /// Element at `at` mutably, or `None` at the end or for a position not
    /// in this list.
    #[must_use]
    pub fn get_mut<'a>(&self, pool: &'a mut Pool<T>, at: Cursor) -> Option<&'a mut T> {
        self.check_pool(pool);
        pool.owned_mut(at.0, self.id)?.value_mut()
    }

    /// First element.
    #[must_use]
    pub fn front<'a>(&self, pool: &'a Pool<T>) -> Option<&'a T> {
        self.get(pool, self.begin())
    }

    /// Last element.
    #[must_use]
    pub fn back<'a>(&self, pool: &'a Pool<T>) -> Option<&'a T> {
        self.get(pool, self.last())
    }

    /// Takes a node from the pool and stores `value` in it, unlinked.
    fn new_node(&self, pool: &mut Pool<T>, value: T) -> i32 {
        let index = pool.allocate_node();
        pool.link(index, self.id, value);
        // allocate_node keeps indices below i32::MAX
        index as i32
    }

    /// Inserts `value` before the first element.
    pub fn push_front(&mut self, pool: &mut Pool<T>, value: T) -> Cursor {
        self.check_pool(pool);
        let index = self.new_node(pool, value);
        if self.begin == NIL {
            self.last = index;
        } else {
            self.chain_mut(pool, self.begin).prev = index;
            self.chain_mut(pool, index).next = self.begin;
        }
        self.begin = index;
        Cursor(index)
    }

    /// Inserts `value` after the last element.
    pub fn push_back(&mut self, pool: &mut Pool<T>, value: T) -> Cursor {
        self.check_pool(pool);
        let index = self.new_node(pool, value);
        if self.last == NIL {
            self.begin = index;
        } else {
            self.chain_mut(pool, self.last).next = index;
            self.chain_mut(pool, index).prev = self.last;
        }
        self.last = index;
        Cursor(index)
    }

    /// Inserts `value` before `at`; inserting before the end appends.
    ///
    /// Returns the position of the new element.
    ///
    /// # Panics
    ///
    /// Panics if `at` is neither the end nor an element of this list.
    pub fn insert(&mut self, pool: &mut Pool<T>, at: Cursor, value: T) -> Cursor {
        if at.is_end() {
            return self.push_back(pool, value);
        }
        self.check_pool(pool);
        let Some(prev) = pool.owned(at.0, self.id).map(|node| node.prev) else {
            panic!("insert at {at:?}, which is not in this list");
        };

        let index = self.new_node(pool, value);
        self.chain_mut(pool, at.0).prev = index;
        self.chain_mut(pool, index).next = at.0;
        if prev == NIL {
            self.begin = index;
        } else {
            self.chain_mut(pool, prev).next = index;
            self.chain_mut(pool, index).prev = prev;
        }
        Cursor(index)
    }

    /// Unlinks the node at `index` and frees it, returning its value.
    ///
    /// Does nothing if the node is not part of this list.
    fn unlink(&mut self, pool: &mut Pool<T>, index: i32) -> Option<T> {
        let (prev, next) = {
            let node = pool.owned(index, self.id)?;
            (node.prev, node.next)
        };
        if prev == NIL {
            self.begin = next;
        } else {
            self.chain_mut(pool, prev).next = next;
        }
        if next == NIL {
            self.last = prev;
        } else {
            self.chain_mut(pool, next).prev = prev;
        }
        pool.take_node(index, self.id)
    }

    /// Removes the element at `at` and returns the position that followed it.
    ///
    /// Erasing the end, an already erased position or a position of another
    /// list does nothing and returns the end.
    pub fn erase(&mut self, pool: &mut Pool<T>, at: Cursor) -> Cursor {
        self.check_pool(pool);
        let Some(next) = pool.owned(at.0, self.id).map(|node| node.next) else {
            return Cursor::END;
        };
        drop(self.unlink(pool, at.0));
        Cursor(next)
    }

    /// Removes and returns the first element.
    pub fn pop_front(&mut self, pool: &mut Pool<T>) -> Option<T> {
        self.check_pool(pool);
        self.unlink(pool, self.begin)
    }

    /// Removes and returns the last element.
    pub fn pop_back(&mut self, pool: &mut Pool<T>) -> Option<T> {
        self.check_pool(pool);
        self.unlink(pool, self.last)
    }

    /// Erases every element, returning all nodes to the pool.
    pub fn clear(&mut self, pool: &mut Pool<T>) {
        while self.pop_front(pool).is_some() {}
    }

    /// Position of the first element matching `pred`, or the end.
    #[must_use]
    pub fn find<P>(&self, pool: &Pool<T>, mut pred: P) -> Cursor
    where
        P: FnMut(&T) -> bool,
    {
        let mut at = self.begin();
        while let Some(value) = self.get(pool, at) {
            if pred(value) {
                return at;
            }
            at = at.next(pool);
        }
        Cursor::END
    }

    /// Iterates front to back.
    #[must_use]
    pub fn iter<'a>(&self, pool: &'a Pool<T>) -> Iter<'a, T> {
        self.check_pool(pool);
        Iter {
            pool,
            owner: self.id,
            front: self.begin,
            back: self.last,
        }
    }

    /// Iterates front to back with mutable access.
    #[must_use]
    pub fn iter_mut<'a>(&self, pool: &'a mut Pool<T>) -> IterMut<'a, T> {
        self.check_pool(pool);
        let nodes = pool.nodes_mut();
        IterMut {
            nodes: nodes.as_mut_ptr(),
            len: nodes.len(),
            remaining: nodes.len(),
            owner: self.id,
            front: self.begin,
            back: self.last,
            _marker: PhantomData,
        }
    }

    /// Deep-copies this list into new nodes of the same pool.
    #[must_use]
    pub fn duplicate(&self, pool: &mut Pool<T>) -> Self
    where
        T: Clone,
    {
        self.check_pool(pool);
        let mut copy = Self::new(pool);
        let mut at = self.begin;
        while let Some(node) = pool.owned(at, self.id) {
            let next = node.next;
            if let Some(value) = node.value().cloned() {
                copy.push_back(pool, value);
            }
            at = next;
        }
        copy
    }

    /// Deep-copies this list into new nodes of another pool.
    #[must_use]
    pub fn duplicate_into(&self, source: &Pool<T>, target: &mut Pool<T>) -> Self
    where
        T: Clone,
    {
        let mut copy = Self::new(target);
        for value in self.iter(source) {
            copy.push_back(target, value.clone());
        }
        copy
    }

    /// Replaces the contents with a deep copy of `other` (same pool).
    pub fn assign_from(&mut self, pool: &mut Pool<T>, other: &Self)
    where
        T: Clone,
    {
        self.clear(pool);
        *self = other.duplicate(pool);
    }

    /// Moves the chain out, leaving this list empty. The pool is untouched.
    ///
    /// The returned list keeps this list's identity; this list gets a new
    /// one, so cursors into the moved chain follow the returned list.
    #[must_use]
    pub fn take(&mut self) -> Self {
        let empty = Self::empty_in(self.pool);
        std::mem::replace(self, empty)
    }

    /// Clears this list, then steals the chain of `other`, leaving it empty.
    pub fn assign_take(&mut self, pool: &mut Pool<T>, other: &mut Self) {
        self.clear(pool);
        *self = other.take();
    }
}

/// Front-to-back iterator over a [`PooledList`].
#[derive(Debug)]
pub struct Iter<'a, T> {
    pool: &'a Pool<T>,
    owner: ListId,
    front: i32,
    back: i32,
}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool,
            owner: self.owner,
            front: self.front,
            back: self.back,
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let node: &'a ListNode<T> = self.pool.owned(self.front, self.owner)?;
        if self.front == self.back {
            self.front = NIL;
            self.back = NIL;
        } else {
            self.front = node.next;
        }
        node.value()
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<&'a T> {
        let node: &'a ListNode<T> = self.pool.owned(self.back, self.owner)?;
        if self.front == self.back {
            self.front = NIL;
            self.back = NIL;
        } else {
            self.back = node.prev;
        }
        node.value()
    }
}

impl<T> FusedIterator for Iter<'_, T> {}

/// Front-to-back iterator with mutable access.
///
/// Only nodes stamped with the list's identity are yielded, and never more
/// items than the pool has nodes.
#[derive(Debug)]
pub struct IterMut<'a, T> {
    nodes: *mut ListNode<T>,
    len: usize,
    remaining: usize,
    owner: ListId,
    front: i32,
    back: i32,
    _marker: PhantomData<&'a mut ListNode<T>>,
}

impl<'a, T> IterMut<'a, T> {
    /// Takes the node at `index` if it belongs to the list, ending the
    /// iteration otherwise.
    ///
    /// # Safety
    ///
    /// `index` must not have been yielded before.
    unsafe fn claim(&mut self, index: i32) -> Option<&'a mut ListNode<T>> {
        let slot = usize::try_from(index).ok().filter(|&slot| slot < self.len);
        let node = match slot {
            Some(slot) if self.remaining > 0 => &mut *self.nodes.add(slot),
            _ => return self.finish(),
        };
        if !node.is_owned_by(self.owner) {
            return self.finish();
        }
        self.remaining -= 1;
        Some(node)
    }

    fn finish(&mut self) -> Option<&'a mut ListNode<T>> {
        self.front = NIL;
        self.back = NIL;
        None
    }
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<&'a mut T> {
        // SAFETY: Chains of one list are acyclic, and front and back meet
        // exactly once, so every node is taken once.
        let node = unsafe { self.claim(self.front) }?;
        if self.front == self.back {
            self.finish();
        } else {
            self.front = node.next;
        }
        node.value_mut()
    }
}

impl<'a, T> DoubleEndedIterator for IterMut<'a, T> {
    fn next_back(&mut self) -> Option<&'a mut T> {
        // SAFETY: As in `next`.
        let node = unsafe { self.claim(self.back) }?;
        if self.front == self.back {
            self.finish();
        } else {
            self.back = node.prev;
        }
        node.value_mut()
    }
}

impl<T> FusedIterator for IterMut<'_, T> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(list: &PooledList<u32>, pool: &Pool<u32>) -> Vec<u32> {
        list.iter(pool).copied().collect()
    }

    /// Walks the chain both ways and checks every link mirrors its neighbour.
    fn check_links(list: &PooledList<u32>, pool: &Pool<u32>) {
        let mut prev = NIL;
        let mut at = list.begin;
        while at != NIL {
            assert_eq!(pool.node(at).unwrap().prev, prev);
            prev = at;
            at = pool.node(at).unwrap().next;
        }
        assert_eq!(list.last, prev);
    }

    #[test]
    fn test_push_back_keeps_order() {
        let mut pool = Pool::new();
        let mut list = PooledList::new(&pool);
        for i in 0..10 {
            list.push_back(&mut pool, i);
        }
        assert_eq!(collect(&list, &pool), (0..10).collect::<Vec<_>>());
        assert_eq!(list.len(&pool), 10);
        check_links(&list, &pool);
    }

    #[test]
    fn test_push_front() {
        let mut pool = Pool::new();
        let mut list = PooledList::new(&pool);
        list.push_front(&mut pool, 1);
        list.push_front(&mut pool, 2);
        list.push_back(&mut pool, 0);
        assert_eq!(collect(&list, &pool), vec![2, 1, 0]);
        assert_eq!(list.front(&pool), Some(&2));
        assert_eq!(list.back(&pool), Some(&0));
        check_links(&list, &pool);
    }

    #[test]
    fn test_insert_positions() {
        let mut pool = Pool::new();
        let mut list = PooledList::new(&pool);
        let two = list.push_back(&mut pool, 2);
        list.insert(&mut pool, two, 1);
        list.insert(&mut pool, list.begin(), 0);
        list.insert(&mut pool, list.end(), 3);
        assert_eq!(collect(&list, &pool), vec![0, 1, 2, 3]);
        check_links(&list, &pool);
    }

    #[test]
    fn test_erase_middle_preserves_order() {
        let mut pool = Pool::new();
        let mut list = PooledList::new(&pool);
        for i in 0..5 {
            list.push_back(&mut pool, i);
        }
        let at = list.find(&pool, |&v| v == 2);
        let next = list.erase(&mut pool, at);
        assert_eq!(list.get(&pool, next), Some(&3));
        assert_eq!(collect(&list, &pool), vec![0, 1, 3, 4]);
        check_links(&list, &pool);

        list.erase(&mut pool, list.begin());
        list.erase(&mut pool, list.last());
        assert_eq!(collect(&list, &pool), vec![1, 3]);
        check_links(&list, &pool);
        assert!(list.erase(&mut pool, list.end()).is_end());
    }

    #[test]
    fn test_clear_returns_nodes() {
        let mut pool = Pool::new();
        let mut list = PooledList::new(&pool);
        for i in 0..8 {
            list.push_back(&mut pool, i);
        }
        list.clear(&mut pool);
        assert!(list.is_empty());
        assert_eq!(list.begin(), list.end());
        assert_eq!(pool.live_count(), 0);
        assert_eq!(pool.free_count(), 8);
    }

    #[test]
    fn test_pop_both_ends() {
        let mut pool = Pool::new();
        let mut list = PooledList::new(&pool);
        for i in 0..3 {
            list.push_back(&mut pool, i);
        }
        assert_eq!(list.pop_front(&mut pool), Some(0));
        assert_eq!(list.pop_back(&mut pool), Some(2));
        assert_eq!(list.pop_back(&mut pool), Some(1));
        assert_eq!(list.pop_back(&mut pool), None);
        assert!(list.is_empty());
    }

    #[test]
    fn test_iterators_are_double_ended() {
        let mut pool = Pool::new();
        let mut list = PooledList::new(&pool);
        for i in 0..5 {
            list.push_back(&mut pool, i);
        }
        let reversed: Vec<u32> = list.iter(&pool).rev().copied().collect();
        assert_eq!(reversed, vec![4, 3, 2, 1, 0]);

        let mut iter = list.iter(&pool);
        assert_eq!(iter.next(), Some(&0));
        assert_eq!(iter.next_back(), Some(&4));
        assert_eq!(iter.next(), Some(&1));
        assert_eq!(iter.next_back(), Some(&3));
        assert_eq!(iter.next(), Some(&2));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next_back(), None);

        for value in list.iter_mut(&mut pool) {
            *value *= 10;
        }
        assert_eq!(collect(&list, &pool), vec![0, 10, 20, 30, 40]);
    }

    #[test]
    fn test_cursor_walk() {
        let mut pool = Pool::new();
        let mut list = PooledList::new(&pool);
        list.push_back(&mut pool, 1);
        list.push_back(&mut pool, 2);
        let first = list.begin();
        let second = first.next(&pool);
        assert_eq!(list.get(&pool, second), Some(&2));
        assert!(second.next(&pool).is_end());
        assert_eq!(second.prev(&pool), first);
        assert!(first.prev(&pool).is_end());
        *list.get_mut(&mut pool, second).unwrap() = 5;
        assert_eq!(collect(&list, &pool), vec![1, 5]);
    }

    #[test]
    fn test_duplicate_allocates_fresh_nodes() {
        let mut pool = Pool::new();
        let mut list = PooledList::new(&pool);
        for i in 0..4 {
            list.push_back(&mut pool, i);
        }
        let mut copy = list.duplicate(&mut pool);
        assert_eq!(pool.live_count(), 8);
        copy.push_back(&mut pool, 99);
        *list.get_mut(&mut pool, list.begin()).unwrap() = 42;
        assert_eq!(collect(&list, &pool), vec![42, 1, 2, 3]);
        assert_eq!(collect(&copy, &pool), vec![0, 1, 2, 3, 99]);
        check_links(&copy, &pool);
    }

    #[test]
    fn test_duplicate_into_other_pool() {
        let mut source = Pool::new();
        let mut target = Pool::new();
        let mut list = PooledList::new(&source);
        list.push_back(&mut source, 7);
        list.push_back(&mut source, 8);
        let copy = list.duplicate_into(&source, &mut target);
        assert_eq!(copy.pool_id(), target.id());
        assert_eq!(collect(&copy, &target), vec![7, 8]);
        assert_eq!(target.live_count(), 2);
    }

    #[test]
    fn test_assign_from() {
        let mut pool = Pool::new();
        let mut a = PooledList::new(&pool);
        let mut b = PooledList::new(&pool);
        a.push_back(&mut pool, 1);
        b.push_back(&mut pool, 2);
        b.push_back(&mut pool, 3);
        a.assign_from(&mut pool, &b);
        assert_eq!(collect(&a, &pool), vec![2, 3]);
        assert_eq!(pool.live_count(), 4);
    }

    #[test]
    fn test_take_leaves_source_empty() {
        let mut pool = Pool::new();
        let mut list = PooledList::new(&pool);
        list.push_back(&mut pool, 1);
        list.push_back(&mut pool, 2);
        let moved = list.take();
        assert!(list.is_empty());
        assert_eq!(list.last(), Cursor::END);
        assert_eq!(collect(&moved, &pool), vec![1, 2]);
        assert_eq!(pool.live_count(), 2);

        let mut target = PooledList::new(&pool);
        target.push_back(&mut pool, 9);
        let mut source = moved;
        target.assign_take(&mut pool, &mut source);
        assert!(source.is_empty());
        assert_eq!(collect(&target, &pool), vec![1, 2]);
        assert_eq!(pool.live_count(), 2);
    }

    #[test]
    fn test_double_erase_is_ignored() {
        let mut pool = Pool::new();
        let mut list = PooledList::new(&pool);
        let first = list.push_back(&mut pool, 1);
        list.push_back(&mut pool, 2);

        let next = list.erase(&mut pool, first);
        assert_eq!(list.get(&pool, next), Some(&2));
        assert!(list.erase(&mut pool, first).is_end());
        assert_eq!(collect(&list, &pool), vec![2]);
        assert_eq!((pool.live_count(), pool.free_count()), (1, 1));

        let a = list.push_back(&mut pool, 10);
        let b = list.push_back(&mut pool, 20);
        assert_ne!(a.node_index(), b.node_index());
        assert_eq!(collect(&list, &pool), vec![2, 10, 20]);
        assert_eq!((pool.live_count(), pool.free_count()), (3, 0));
        check_links(&list, &pool);
    }

    #[test]
    fn test_stale_cursor_cannot_reach_other_list() {
        let mut pool = Pool::new();
        let mut a = PooledList::new(&pool);
        let mut b = PooledList::new(&pool);
        let stale = a.push_back(&mut pool, 1);
        a.push_back(&mut pool, 2);
        a.erase(&mut pool, stale);

        // b now owns the node `stale` pointed to
        let reused = b.push_back(&mut pool, 5);
        assert_eq!(reused, stale);
        assert!(!a.contains(&pool, stale));
        assert!(b.contains(&pool, stale));
        assert_eq!(a.get(&pool, stale), None);
        assert_eq!(a.get_mut(&mut pool, stale), None);

        assert!(a.erase(&mut pool, stale).is_end());
        assert_eq!(collect(&a, &pool), vec![2]);
        assert_eq!(collect(&b, &pool), vec![5]);
        check_links(&a, &pool);
        check_links(&b, &pool);
        assert_eq!(pool.live_count(), 2);
    }

    #[test]
    #[should_panic(expected = "not in this list")]
    fn test_insert_at_foreign_cursor_panics() {
        let mut pool = Pool::new();
        let mut a = PooledList::new(&pool);
        let mut b = PooledList::new(&pool);
        let theirs = b.push_back(&mut pool, 1);
        a.push_back(&mut pool, 2);
        a.insert(&mut pool, theirs, 3);
    }

    #[test]
    #[should_panic(expected = "foreign pool")]
    fn test_foreign_pool_panics() {
        let mut home: Pool<u32> = Pool::new();
        let mut other: Pool<u32> = Pool::new();
        let mut list = PooledList::new(&home);
        list.push_back(&mut home, 1);
        list.push_back(&mut other, 2);
    }

    #[test]
    fn test_free_node_leaves_linked_nodes_alone() {
        let mut pool = Pool::new();
        let mut list = PooledList::new(&pool);
        let at = list.push_back(&mut pool, 7);
        list.push_back(&mut pool, 8);

        assert!(!pool.free_node(at.node_index().unwrap()));
        assert_eq!(pool.free_count(), 0);
        assert_eq!(collect(&list, &pool), vec![7, 8]);

        let next = list.push_back(&mut pool, 9);
        assert_ne!(next, at);
    }

    #[test]
    fn test_iter_mut_yields_each_node_once() {
        let mut pool = Pool::new();
        let mut list = PooledList::new(&pool);
        let stale = list.push_back(&mut pool, 0);
        list.erase(&mut pool, stale);
        list.erase(&mut pool, stale);
        for i in 1..4 {
            list.push_back(&mut pool, i);
        }
        let mut seen: Vec<*const u32> = list
            .iter_mut(&mut pool)
            .map(|value| std::ptr::addr_of!(*value))
            .collect();
        assert_eq!(seen.len(), 3);
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), 3);
    }
}
