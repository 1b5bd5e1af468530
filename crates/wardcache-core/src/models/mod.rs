//! Data models for facility records.
//!
//! - `Facility`: one healthcare facility as delivered by the endpoint
//! - `ThumbnailKey`: presentational category derived from name and province

pub mod facility;

pub use facility::{Facility, ThumbnailKey, NO_PHONE_PLACEHOLDER};
