//! # Node Pool
//!
//! Shared arena of index-linked list nodes. Many small lists can live in one
//! pool, which keeps their nodes in a single dense vector.
//!
//! Every node is in exactly one state:
//!
//! ```text
//! Free --allocate_node--> Detached --link--> Linked(list) --take_node--> Free
//!                            |
//!                            +--free_node--> Free
//! ```
//!
//! Only the owning list may read or unlink a linked node.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use tracing::{debug, trace};

use crate::config::StoreConfig;

/// Link value meaning "no node".
pub(crate) const NIL: i32 = -1;

static NEXT_POOL_ID: AtomicU32 = AtomicU32::new(0);
static NEXT_LIST_ID: AtomicU64 = AtomicU64::new(0);

/// Process-unique identity of a [`Pool`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PoolId(u32);

/// Process-unique identity of a list, stamped on the nodes it owns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct ListId(u64);

impl ListId {
    pub(crate) fn fresh() -> Self {
        Self(NEXT_LIST_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum NodeState {
    /// On the free stack.
    Free,
    /// Handed out by `allocate_node`, not yet linked.
    Detached,
    /// Linked into the chain of one list.
    Linked(ListId),
}

/// One node of a pooled list.
///
/// `value` is `Some` exactly while the node is linked.
#[derive(Debug)]
pub(crate) struct ListNode<T> {
    value: Option<T>,
    state: NodeState,
    pub(crate) next: i32,
    pub(crate) prev: i32,
}

impl<T> ListNode<T> {
    const fn detached() -> Self {
        Self {
            value: None,
            state: NodeState::Detached,
            next: NIL,
            prev: NIL,
        }
    }

    /// Checks whether `owner` has this node in its chain.
    #[inline]
    pub(crate) fn is_owned_by(&self, owner: ListId) -> bool {
        self.state == NodeState::Linked(owner)
    }

    pub(crate) fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub(crate) fn value_mut(&mut self) -> Option<&mut T> {
        self.value.as_mut()
    }
}

/// Arena of list nodes shared by any number of [`crate::PooledList`]s.
///
/// # Thread Safety
///
/// Not thread-safe. Every list sharing the pool must be driven from the
/// thread that owns it.
#[derive(Debug)]
pub struct Pool<T> {
    /// All nodes, whatever their state.
    nodes: Vec<ListNode<T>>,
    /// Indices of free nodes, reused last-in first-out.
    free: Vec<u32>,
    /// Identity checked by the lists using this pool.
    id: PoolId,
}

impl<T> Pool<T> {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a pool with room for `capacity` nodes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            free: Vec::with_capacity(capacity),
            id: PoolId(NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed)),
        }
    }

    /// Creates a pool sized by `config`.
    #[must_use]
    pub fn with_config(config: &StoreConfig) -> Self {
        Self::with_capacity(config.pool.reserve_nodes as usize)
    }

    /// Returns the identity of this pool.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> PoolId {
        self.id
    }

    /// Reserves room for `additional` more nodes.
    pub fn reserve(&mut self, additional: usize) {
        self.nodes.reserve(additional);
        self.free.reserve(additional);
    }

    /// Returns the total number of nodes.
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of nodes on the free stack.
    #[inline]
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Returns the number of nodes not on the free stack.
    #[inline]
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Takes a free node, appending a new one if none is free.
    ///
    /// The node is detached: it holds no value and belongs to no list until
    /// a list links it, or it is handed back with [`Self::free_node`].
    ///
    /// # Panics
    ///
    /// Panics if the pool already holds `i32::MAX` nodes.
    pub fn allocate_node(&mut self) -> u32 {
        if let Some(index) = self.free.pop() {
            self.nodes[index as usize].state = NodeState::Detached;
            return index;
        }
        let index = self.nodes.len();
        assert!(index < i32::MAX as usize, "node pool is full");
        if index == self.nodes.capacity() {
            debug!(pool = self.id.0, nodes = index, "node pool growing");
        }
        self.nodes.push(ListNode::detached());
        // index < i32::MAX
        index as u32
    }

    /// Puts a detached node back on the free stack.
    ///
    /// Nodes linked into a list are only freed through that list, so this
    /// returns `false` for linked, already free or out-of-range indices.
    pub fn free_node(&mut self, index: u32) -> bool {
        match self.nodes.get_mut(index as usize) {
            Some(node) if node.state == NodeState::Detached => {
                node.state = NodeState::Free;
                self.free.push(index);
                true
            }
            Some(node) => {
                trace!(pool = self.id.0, index, state = ?node.state, "free_node ignored");
                false
            }
            None => false,
        }
    }

    /// Stores `value` in a detached node and marks it owned by `owner`.
    ///
    /// # Panics
    ///
    /// Panics if the node is not detached.
    pub(crate) fn link(&mut self, index: u32, owner: ListId, value: T) {
        let node = &mut self.nodes[index as usize];
        assert!(
            node.state == NodeState::Detached,
            "linking node {index} in state {:?}",
            node.state
        );
        node.value = Some(value);
        node.state = NodeState::Linked(owner);
        node.next = NIL;
        node.prev = NIL;
    }

    /// Moves the value out of a node owned by `owner` and frees the node.
    ///
    /// Returns `None`, changing nothing, if `owner` does not own the node.
    pub(crate) fn take_node(&mut self, index: i32, owner: ListId) -> Option<T> {
        let node = self.owned_mut(index, owner)?;
        let value = node.value.take();
        node.state = NodeState::Free;
        node.next = NIL;
        node.prev = NIL;
        // owned_mut only accepts index >= 0
        self.free.push(index as u32);
        value
    }

    /// The node at `index` if it is linked into the list `owner`.
    #[inline]
    pub(crate) fn owned(&self, index: i32, owner: ListId) -> Option<&ListNode<T>> {
        let slot = usize::try_from(index).ok()?;
        self.nodes.get(slot).filter(|node| node.is_owned_by(owner))
    }

    /// Mutable version of [`Self::owned`].
    #[inline]
    pub(crate) fn owned_mut(&mut self, index: i32, owner: ListId) -> Option<&mut ListNode<T>> {
        let slot = usize::try_from(index).ok()?;
        self.nodes.get_mut(slot).filter(|node| node.is_owned_by(owner))
    }

    /// Node at `index`, whatever its state.
    #[inline]
    pub(crate) fn node(&self, index: i32) -> Option<&ListNode<T>> {
        self.nodes.get(usize::try_from(index).ok()?)
    }

    #[inline]
    pub(crate) fn nodes_mut(&mut self) -> &mut [ListNode<T>] {
        &mut self.nodes
    }
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}
