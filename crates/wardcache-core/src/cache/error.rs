use thiserror::Error;

use crate::api::ApiError;

#[derive(Error, Debug)]
pub enum StoreError {
    /// The fetch failed and there is no cached list to fall back on.
    #[error(transparent)]
    EmptyCache(ApiError),

    #[error("No data available")]
    NoData,
}
