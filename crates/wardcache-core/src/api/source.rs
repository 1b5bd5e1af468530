use std::future::Future;

use crate::models::Facility;

use super::ApiError;

/// Something that can produce the complete facility list in one call.
///
/// Implementations perform a single attempt: no retries and no timeout
/// handling of their own beyond what the transport provides.
pub trait DataSource: Send + Sync {
    fn fetch_all(&self) -> impl Future<Output = Result<Vec<Facility>, ApiError>> + Send;
}
