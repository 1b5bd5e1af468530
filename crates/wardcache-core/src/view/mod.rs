//! Consumer-facing view of the facility list.
//!
//! - `ViewState`: loaded items, filtered items, flags and counters
//! - `FacilityFeed`: drives the cache store and publishes `ViewState` changes

pub mod feed;
pub mod state;

pub use feed::FacilityFeed;
pub use state::{apply_filter, ViewState};
