//! Compressed, staleness-bounded listing cache
//!
//! # Modules
//!
//! - [`store`]: Raw key-value persistence (`ListingStore`, SQLite implementation)
//! - [`codec`]: JSON + gzip payload encoding
//! - [`entry`]: Typed entries and the allowed-age policy

pub mod codec;
pub mod entry;
pub mod store;

pub use entry::{CacheEntry, VersionCache};
pub use store::{ListingKind, ListingStore, SqliteStore, StoredItem};
