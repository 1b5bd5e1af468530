//! Shared fixtures for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::api::{ApiError, DataSource};
use crate::models::Facility;

pub fn facility(name: &str, province: &str) -> Facility {
    Facility {
        name: name.to_string(),
        address: format!("Jl. {}", name),
        region: format!("Kota {}", province),
        province: province.to_string(),
        phone: None,
    }
}

/// `count` facilities named "RS 0", "RS 1", ... spread over two provinces.
pub fn facilities(count: usize) -> Vec<Facility> {
    (0..count)
        .map(|i| facility(&format!("RS {}", i), if i % 2 == 0 { "Aceh" } else { "Bali" }))
        .collect()
}

/// Data source that replays queued responses and counts calls.
/// Once the queue is empty every call fails.
#[derive(Default)]
pub struct ScriptedSource {
    responses: Mutex<VecDeque<Result<Vec<Facility>, ApiError>>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn succeed(self, items: Vec<Facility>) -> Self {
        self.push(Ok(items));
        self
    }

    pub fn fail(self) -> Self {
        self.push(Err(ApiError::ServerError("503 unavailable".to_string())));
        self
    }

    /// Sleep this long inside every fetch.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push(&self, response: Result<Vec<Facility>, ApiError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DataSource for ScriptedSource {
    async fn fetch_all(&self) -> Result<Vec<Facility>, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.responses.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Err(ApiError::ServerError("503 unavailable".to_string())))
    }
}
