//! Data source module for the facility endpoint.
//!
//! This module provides the `DataSource` contract the cache store depends on,
//! and `FacilityApi`, its HTTP implementation backed by reqwest.

pub mod client;
pub mod error;
pub mod source;

pub use client::{FacilityApi, DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT_SECS};
pub use error::ApiError;
pub use source::DataSource;
