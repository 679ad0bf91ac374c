//! # Store Error Types
//!
//! Errors reported by the checked entry points of the object store.
//!
//! The silent paths (`is_valid`, `try_get`, `release`) never produce these;
//! they answer with `false` / `None` instead.

use thiserror::Error;

/// Errors that can occur in the object store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The handle's generation no longer matches the slot.
    #[error("stale handle: id {id} generation {generation}")]
    StaleHandle {
        /// Slot id carried by the handle.
        id: u32,
        /// Generation carried by the handle.
        generation: u32,
    },

    /// The handle was never assigned to a slot.
    #[error("unassigned handle")]
    UnassignedHandle,

    /// Object size / alignment cannot be stored in a page.
    #[error("invalid object layout: size {size}, align {align}")]
    InvalidLayout {
        /// Requested object size in bytes.
        size: usize,
        /// Requested object alignment in bytes.
        align: usize,
    },

    /// Every id below the limit is in use.
    #[error("id space exhausted: limit {limit}")]
    IdSpaceExhausted {
        /// The id limit that was reached.
        limit: u32,
    },

    /// Configuration values are out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file is not valid TOML for [`crate::StoreConfig`].
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    ConfigIo(#[from] std::io::Error),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
