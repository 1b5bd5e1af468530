//! wardcache core - cached, paginated access to a public healthcare facility list.
//!
//! The facility list is fetched through a `DataSource`, held in memory by a
//! `CacheStore` and handed to consumers page by page. A `FacilityFeed` folds
//! store results into an observable `ViewState`.

pub mod api;
pub mod cache;
pub mod config;
pub mod models;
pub mod resource;
pub mod utils;
pub mod view;

#[cfg(test)]
mod testing;

pub use api::{ApiError, DataSource, FacilityApi};
pub use cache::{CacheStore, StoreConfig, StoreError};
pub use config::Config;
pub use models::{Facility, ThumbnailKey};
pub use resource::Resource;
pub use view::{FacilityFeed, ViewState};
