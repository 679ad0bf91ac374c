//! # Object Tables
//!
//! Generational slot maps with paged storage.
//!
//! ## Design Philosophy
//!
//! - Handles, not pointers: a 32-bit (generation, id) pair survives moves,
//!   reallocation and reuse of the slot
//! - One untyped arena serves every object type; the typed façade only adds
//!   construction, destruction and type safety
//! - Stale handles degrade to `false` / `None`, never to a crash

mod page;
mod raw;
mod typed;

pub use page::{ObjectLayout, PAGE_SIZE};
pub use raw::{Deleter, RawObjectTable};
pub use typed::{ObjectHandle, ObjectTable};
