//! In-memory caching of the facility list.
//!
//! `CacheStore` keeps the most recent successful fetch and hands it out in
//! pages. Data is considered stale after 5 minutes by default; a failed
//! refresh falls back to whatever is cached, stale or not. Nothing is written
//! to disk.

pub mod cursor;
pub mod entry;
pub mod error;
pub mod store;

pub use cursor::PaginationCursor;
pub use entry::CacheEntry;
pub use error::StoreError;
pub use store::{CacheStore, StoreConfig, DEFAULT_FRESHNESS_MINUTES, INITIAL_PAGE_SIZE, PAGE_SIZE};
