//! # Pooled Lists
//!
//! Doubly linked lists whose nodes come from a shared, index-addressed pool.
//! Links are `i32` node indices with `-1` as the end marker, so a list is two
//! integers plus the pool identity.

mod pool;
mod pooled;

pub use pool::{Pool, PoolId};
pub use pooled::{Cursor, Iter, IterMut, PooledList};
