//! Configuration types
//!
//! Board-agnostic settings for the master and endpoint roles, optionally
//! stored as postcard binary data.

#[cfg(feature = "serde")]
pub mod storage;
pub mod types;

pub use types::*;
