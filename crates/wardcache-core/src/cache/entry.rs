use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use crate::models::Facility;
use crate::utils::format_age;

/// One successful fetch of the facility list.
///
/// Entries are replaced wholesale, never edited in place. Freshness is measured
/// on the monotonic clock; `fetched_at` is kept for display only.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    items: Vec<Facility>,
    fetched_at: DateTime<Utc>,
    fetched_instant: Instant,
}

impl CacheEntry {
    pub fn new(items: Vec<Facility>) -> Self {
        Self {
            items,
            fetched_at: Utc::now(),
            fetched_instant: Instant::now(),
        }
    }

    pub fn items(&self) -> &[Facility] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    pub fn fetched_at_millis(&self) -> i64 {
        self.fetched_at.timestamp_millis()
    }

    pub fn elapsed(&self) -> Duration {
        self.fetched_instant.elapsed()
    }

    pub fn is_fresh(&self, window: Duration) -> bool {
        self.elapsed() < window
    }

    pub fn age_minutes(&self) -> i64 {
        (self.elapsed().as_secs() / 60) as i64
    }

    pub fn age_display(&self) -> String {
        format_age(self.age_minutes())
    }
}
