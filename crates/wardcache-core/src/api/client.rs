//! HTTP client for the public facility list endpoint.
//!
//! This module provides `FacilityApi`, the `DataSource` used outside of tests.

use std::time::Duration;

use reqwest::{header, Client};
use tracing::{debug, warn};

use crate::models::Facility;

use super::{ApiError, DataSource};

// ============================================================================
// Constants
// ============================================================================

/// Base URL of the facility endpoint host.
pub const DEFAULT_BASE_URL: &str = "https://dekontaminasi.com";

/// Path of the facility list, relative to the base URL.
const FACILITIES_PATH: &str = "api/id/covid19/hospitals";

/// HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// API client for the facility endpoint.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct FacilityApi {
    client: Client,
    base_url: String,
}

impl FacilityApi {
    /// Create a client against the default host
    pub fn new() -> Result<Self, ApiError> {
        Self::with_options(DEFAULT_BASE_URL, Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
    }

    pub fn with_options(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn facilities_url(&self) -> String {
        format!("{}/{}", self.base_url, FACILITIES_PATH)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Fetch the full facility list
    pub async fn fetch_facilities(&self) -> Result<Vec<Facility>, ApiError> {
        let url = self.facilities_url();
        debug!(url = %url, "Fetching facility list");

        let response = self
            .client
            .get(&url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let response = match Self::check_response(response).await {
            Ok(response) => response,
            Err(e) => {
                warn!(url = %url, error = %e, "Facility request rejected");
                return Err(e);
            }
        };

        let text = response.text().await?;
        let facilities = parse_facilities(&text)?;
        debug!(count = facilities.len(), "Facility list received");
        Ok(facilities)
    }
}

impl DataSource for FacilityApi {
    async fn fetch_all(&self) -> Result<Vec<Facility>, ApiError> {
        self.fetch_facilities().await
    }
}

/// Decode a facility list body. A JSON `null` body is treated as an empty list.
fn parse_facilities(body: &str) -> Result<Vec<Facility>, ApiError> {
    let parsed: Option<Vec<Facility>> = serde_json::from_str(body)
        .map_err(|e| ApiError::InvalidResponse(format!("facility list: {}", e)))?;
    Ok(parsed.unwrap_or_default())
}
