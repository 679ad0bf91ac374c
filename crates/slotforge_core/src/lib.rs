//! # SLOTFORGE Core
//!
//! Generational slot-map object store and pooled linked lists, the storage
//! layer under the engine's entity and component managers.
//!
//! - [`ObjectTable<T>`] hands out 32-bit [`TypedHandle`]s that stay valid
//!   until the object is released, and detect use after release
//! - Objects live in 1024-slot pages that are never moved, so an object's
//!   address is stable while it is alive
//! - [`PooledList<T>`] keeps many small linked lists inside one shared [`Pool`]
//!
//! ## Example
//!
//! ```rust
//! use slotforge_core::ObjectTable;
//!
//! let mut table: ObjectTable<u64> = ObjectTable::new();
//! let handle = table.insert(7);
//! assert_eq!(table.try_get(handle), Some(&7));
//!
//! table.release(handle);
//! assert!(!table.is_valid(handle));
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod handle;
pub mod ids;
pub mod list;
pub mod table;

pub use config::{PoolConfig, StoreConfig, TableConfig};
pub use error::{StoreError, StoreResult};
pub use handle::{Handle, TypedHandle, INVALID_ID};
pub use ids::IdGenerator;
pub use list::{Cursor, Pool, PoolId, PooledList};
pub use table::{Deleter, ObjectHandle, ObjectLayout, ObjectTable, RawObjectTable, PAGE_SIZE};
