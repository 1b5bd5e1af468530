//! In-memory, paginated facility cache.
//!
//! `CacheStore` owns the cached list, its fetch timestamp, the pagination
//! cursor and the load-more in-flight flag. All four live behind one lock so
//! nothing outside the store can break the cursor invariant.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use tracing::{debug, error, info, warn};

use crate::api::DataSource;
use crate::models::Facility;
use crate::resource::Resource;
use crate::utils::contains_ignore_case;

use super::{CacheEntry, PaginationCursor, StoreError};

// ============================================================================
// Constants
// ============================================================================

/// Cached data younger than this is served without a network call.
pub const DEFAULT_FRESHNESS_MINUTES: u64 = 5;

/// Number of facilities in the first page after a load.
pub const INITIAL_PAGE_SIZE: usize = 10;

/// Number of facilities added by each load-more.
pub const PAGE_SIZE: usize = 20;

/// Tuning for a `CacheStore`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    pub freshness_window: Duration,
    pub initial_page_size: usize,
    pub page_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            freshness_window: Duration::from_secs(DEFAULT_FRESHNESS_MINUTES * 60),
            initial_page_size: INITIAL_PAGE_SIZE,
            page_size: PAGE_SIZE,
        }
    }
}

struct StoreState {
    entry: Option<CacheEntry>,
    cursor: PaginationCursor,
    loading_more: bool,
    /// Bumped by `invalidate` so a load-more started before it leaves the new
    /// state alone.
    epoch: u64,
}

impl StoreState {
    fn is_fresh(&self, window: Duration) -> bool {
        self.entry
            .as_ref()
            .map(|e| !e.is_empty() && e.is_fresh(window))
            .unwrap_or(false)
    }

    fn first_page(&self) -> Vec<Facility> {
        self.entry
            .as_ref()
            .map(|e| e.items().iter().take(self.cursor.initial_page_size()).cloned().collect())
            .unwrap_or_default()
    }

    fn current_page(&self) -> Result<Vec<Facility>, StoreError> {
        let entry = self.entry.as_ref().ok_or(StoreError::NoData)?;
        let range = self.cursor.page_range(entry.len());
        Ok(entry.items()[range].to_vec())
    }

    fn filter<P: Fn(&Facility) -> bool>(&self, predicate: P) -> Vec<Facility> {
        self.entry
            .as_ref()
            .map(|e| e.items().iter().filter(|&f| predicate(f)).cloned().collect())
            .unwrap_or_default()
    }
}

pub struct CacheStore<S> {
    source: S,
    config: StoreConfig,
    state: Mutex<StoreState>,
    /// Serializes `load` so at most one fetch is outstanding.
    load_gate: tokio::sync::Mutex<()>,
}

impl<S> CacheStore<S> {
    fn state(&self) -> MutexGuard<'_, StoreState> {
        // State stays consistent even if a holder panicked; every write is a
        // whole-field assignment.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Full-text filter over every cached facility, not just loaded pages.
    pub fn search_local(&self, query: &str) -> Vec<Facility> {
        self.state().filter(|f| f.matches(query))
    }

    pub fn filter_by_province(&self, province: &str) -> Vec<Facility> {
        self.state().filter(|f| f.in_province(province))
    }

    /// Substring match on the region field only, e.g. "denpasar".
    pub fn filter_by_region(&self, region: &str) -> Vec<Facility> {
        self.state().filter(|f| contains_ignore_case(&f.region, region))
    }

    pub fn has_more(&self) -> bool {
        let state = self.state();
        match state.entry {
            Some(ref entry) => state.cursor.has_more(entry.len()),
            None => false,
        }
    }

    /// Number of pages loaded beyond the initial page.
    pub fn current_page(&self) -> usize {
        self.state().cursor.pages_loaded()
    }

    pub fn loaded_count(&self) -> usize {
        let state = self.state();
        let total = state.entry.as_ref().map(CacheEntry::len).unwrap_or(0);
        state.cursor.loaded_count(total)
    }

    pub fn total_count(&self) -> usize {
        self.state().entry.as_ref().map(CacheEntry::len).unwrap_or(0)
    }

    pub fn is_loading_more(&self) -> bool {
        self.state().loading_more
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.state().entry.as_ref().map(CacheEntry::fetched_at)
    }

    pub fn fetched_at_millis(&self) -> Option<i64> {
        self.state().entry.as_ref().map(CacheEntry::fetched_at_millis)
    }

    pub fn cache_age(&self) -> Option<String> {
        self.state().entry.as_ref().map(CacheEntry::age_display)
    }

    pub fn is_fresh(&self) -> bool {
        self.state().is_fresh(self.config.freshness_window)
    }

    /// Drop the cached list and all pagination state.
    pub fn invalidate(&self) {
        let mut state = self.state();
        state.entry = None;
        state.cursor.reset();
        state.loading_more = false;
        state.epoch += 1;
        info!("Facility cache invalidated");
    }
}

impl<S: DataSource> CacheStore<S> {
    pub fn new(source: S) -> Self {
        Self::with_config(source, StoreConfig::default())
    }

    pub fn with_config(source: S, config: StoreConfig) -> Self {
        Self {
            source,
            config,
            state: Mutex::new(StoreState {
                entry: None,
                cursor: PaginationCursor::new(config.initial_page_size, config.page_size),
                loading_more: false,
                epoch: 0,
            }),
            load_gate: tokio::sync::Mutex::new(()),
        }
    }

    /// Load the first page, fetching only when the cache is missing or stale.
    ///
    /// Yields `Loading` and then exactly one `Success` or `Error`. A failed
    /// fetch is only reported when there is no cached list to fall back on.
    pub fn load(&self) -> impl Stream<Item = Resource<Vec<Facility>>> + Send + '_ {
        stream::once(future::ready(Resource::Loading))
            .chain(stream::once(async move { Resource::from(self.fetch_first_page().await) }))
    }

    async fn fetch_first_page(&self) -> Result<Vec<Facility>, StoreError> {
        let _gate = self.load_gate.lock().await;

        {
            let mut state = self.state();
            if state.is_fresh(self.config.freshness_window) {
                debug!("Serving facilities from fresh cache");
                state.cursor.reset();
                return Ok(state.first_page());
            }
        }

        match self.source.fetch_all().await {
            Ok(items) => {
                info!(count = items.len(), "Facility cache refreshed");
                let mut state = self.state();
                state.entry = Some(CacheEntry::new(items));
                state.cursor.reset();
                Ok(state.first_page())
            }
            Err(e) => {
                let mut state = self.state();
                match state.entry.as_ref().map(CacheEntry::age_display) {
                    Some(age) => {
                        // Timestamp is left alone so the next load retries the fetch
                        warn!(error = %e, age = %age, "Fetch failed, serving cached facilities");
                        state.cursor.reset();
                        Ok(state.first_page())
                    }
                    None => {
                        error!(error = %e, "Fetch failed with nothing cached");
                        Err(StoreError::EmptyCache(e))
                    }
                }
            }
        }
    }

    /// Hand out the next page of the cached list.
    ///
    /// If a load-more is already in flight the returned stream is empty.
    /// Otherwise it yields `Loading` and then the page, which is empty once the
    /// list is exhausted. On failure the cursor is rolled back before `Error`
    /// is yielded, so a retry produces the same range.
    pub fn load_more(&self) -> BoxStream<'_, Resource<Vec<Facility>>> {
        let epoch = {
            let mut state = self.state();
            if state.loading_more {
                debug!("Load more already in flight, ignoring");
                return stream::empty().boxed();
            }
            state.loading_more = true;
            state.epoch
        };
        let in_flight = InFlight { store: self, epoch };

        stream::once(future::ready(Some(Resource::Loading)))
            .chain(stream::once(async move { in_flight.next_page() }))
            .filter_map(future::ready)
            .boxed()
    }
}

/// Claim on the load-more flag. Released on drop unless `invalidate` has
/// already reset the store.
struct InFlight<'a, S> {
    store: &'a CacheStore<S>,
    epoch: u64,
}

impl<S> InFlight<'_, S> {
    fn next_page(&self) -> Option<Resource<Vec<Facility>>> {
        let mut state = self.store.state();
        if state.epoch != self.epoch {
            debug!("Load more superseded by invalidate");
            return None;
        }

        state.cursor.advance();
        match state.current_page() {
            Ok(page) => {
                debug!(
                    page = state.cursor.pages_loaded(),
                    count = page.len(),
                    "Loaded next facility page"
                );
                Some(Resource::Success(page))
            }
            Err(e) => {
                state.cursor.rollback();
                warn!(error = %e, "Load more failed");
                Some(Resource::Error(format!("Failed to load more: {}", e)))
            }
        }
    }
}

impl<S> Drop for InFlight<'_, S> {
    fn drop(&mut self) {
        let mut state = self.store.state();
        if state.epoch == self.epoch {
            state.loading_more = false;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::testing::{facilities, facility, ScriptedSource};

    async fn collect<St>(s: St) -> Vec<Resource<Vec<Facility>>>
    where
        St: Stream<Item = Resource<Vec<Facility>>>,
    {
        s.collect().await
    }

    fn names(items: &[Facility]) -> Vec<String> {
        items.iter().map(|f| f.name.clone()).collect()
    }

    fn success(outcome: &[Resource<Vec<Facility>>]) -> Vec<Facility> {
        match outcome.last() {
            Some(Resource::Success(items)) => items.clone(),
            other => panic!("expected success, got {:?}", other),
        }
    }

    // -------------------------------------------------------------------------
    // load
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_load_without_cache_and_failing_source_yields_one_error() {
        let store = CacheStore::new(ScriptedSource::new().fail());
        let outcome = collect(store.load()).await;

        assert_eq!(outcome.len(), 2);
        assert!(outcome[0].is_loading());
        assert_eq!(outcome.iter().filter(|r| r.is_error()).count(), 1);
        assert_eq!(
            outcome[1],
            Resource::Error("Server error: 503 unavailable".to_string())
        );
        assert!(!store.has_more());
    }

    #[tokio::test]
    async fn test_load_success_returns_initial_page() {
        let store = CacheStore::new(ScriptedSource::new().succeed(facilities(45)));
        let outcome = collect(store.load()).await;

        assert!(outcome[0].is_loading());
        let page = success(&outcome);
        assert_eq!(page, facilities(45)[..10].to_vec());
        assert_eq!(store.total_count(), 45);
        assert_eq!(store.loaded_count(), 10);
        assert_eq!(store.current_page(), 0);
        assert!(store.has_more());
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_falls_back_to_stale_cache_on_failure() {
        let store = CacheStore::new(ScriptedSource::new().succeed(facilities(25)).fail());
        collect(store.load()).await;
        let fetched_at = store.fetched_at();

        tokio::time::advance(Duration::from_secs(10 * 60)).await;
        let outcome = collect(store.load()).await;

        assert_eq!(store.source().calls(), 2);
        assert!(outcome.iter().all(|r| !r.is_error()));
        assert_eq!(success(&outcome), facilities(25)[..10].to_vec());
        // Fallback does not refresh the timestamp
        assert_eq!(store.fetched_at(), fetched_at);
        assert!(!store.is_fresh());
    }

    #[tokio::test]
    async fn test_load_fallback_resets_cursor() {
        let store = CacheStore::with_config(
            ScriptedSource::new().succeed(facilities(60)).fail(),
            StoreConfig {
                freshness_window: Duration::ZERO,
                ..StoreConfig::default()
            },
        );
        collect(store.load()).await;
        collect(store.load_more()).await;
        assert_eq!(store.current_page(), 1);

        let outcome = collect(store.load()).await;
        assert!(outcome[1].is_success());
        assert_eq!(store.current_page(), 0);
    }

    #[tokio::test]
    async fn test_load_smaller_than_initial_page_has_no_more() {
        let store = CacheStore::new(ScriptedSource::new().succeed(facilities(4)));
        let outcome = collect(store.load()).await;

        assert_eq!(success(&outcome).len(), 4);
        assert!(!store.has_more());
    }

    #[tokio::test]
    async fn test_load_empty_list_is_success() {
        let store = CacheStore::new(
            ScriptedSource::new()
                .succeed(Vec::new())
                .succeed(facilities(3)),
        );
        let first = collect(store.load()).await;
        assert!(success(&first).is_empty());

        // An empty cache is never considered fresh
        let second = collect(store.load()).await;
        assert_eq!(success(&second).len(), 3);
        assert_eq!(store.source().calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_loads_share_one_fetch() {
        let store = CacheStore::new(
            ScriptedSource::new()
                .succeed(facilities(15))
                .with_delay(Duration::from_secs(2)),
        );

        let (a, b) = tokio::join!(collect(store.load()), collect(store.load()));

        assert_eq!(store.source().calls(), 1);
        assert_eq!(a.len(), 2);
        assert_eq!(b.len(), 2);
        assert_eq!(success(&a), facilities(15)[..10].to_vec());
        assert_eq!(success(&b), facilities(15)[..10].to_vec());
    }

    #[tokio::test(start_paused = true)]
    async fn test_freshness_window_scenario() {
        let store = CacheStore::new(
            ScriptedSource::new()
                .succeed(facilities(12))
                .succeed(facilities(30)),
        );

        collect(store.load()).await;
        assert_eq!(store.source().calls(), 1);

        tokio::time::advance(Duration::from_secs(60)).await;
        let cached = collect(store.load()).await;
        assert_eq!(store.source().calls(), 1);
        assert_eq!(success(&cached), facilities(12)[..10].to_vec());

        tokio::time::advance(Duration::from_secs(340)).await;
        collect(store.load()).await;
        assert_eq!(store.source().calls(), 2);
        assert_eq!(store.total_count(), 30);
    }

    // -------------------------------------------------------------------------
    // load_more
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_pages_reconstruct_items_in_order() {
        let all = facilities(57);
        let store = CacheStore::new(ScriptedSource::new().succeed(all.clone()));

        let mut seen = success(&collect(store.load()).await);
        while store.has_more() {
            seen.extend(success(&collect(store.load_more()).await));
        }

        assert_eq!(names(&seen), names(&all));
        assert_eq!(store.current_page(), 3);
        assert_eq!(store.loaded_count(), 57);
    }

    #[tokio::test]
    async fn test_load_more_past_end_is_empty_success() {
        let store = CacheStore::new(ScriptedSource::new().succeed(facilities(15)));
        collect(store.load()).await;

        let second = collect(store.load_more()).await;
        assert_eq!(success(&second).len(), 5);
        let third = collect(store.load_more()).await;
        assert_eq!(third, vec![Resource::Loading, Resource::Success(Vec::new())]);
    }

    #[tokio::test]
    async fn test_failed_load_more_rolls_back_cursor() {
        let all = facilities(45);
        let store = CacheStore::new(ScriptedSource::new().succeed(all.clone()));

        let failed = collect(store.load_more()).await;
        assert_eq!(failed.len(), 2);
        assert_eq!(
            failed[1],
            Resource::Error("Failed to load more: No data available".to_string())
        );
        assert_eq!(store.current_page(), 0);
        assert!(!store.is_loading_more());

        collect(store.load()).await;
        let page = success(&collect(store.load_more()).await);
        assert_eq!(page, all[10..30].to_vec());
        assert_eq!(store.current_page(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_load_more_is_single_flight() {
        let store = CacheStore::new(ScriptedSource::new().succeed(facilities(45)));
        collect(store.load()).await;

        let first = store.load_more();
        let second = store.load_more();
        let (a, b) = tokio::join!(collect(first), collect(second));

        assert_eq!(a.len(), 2);
        assert!(a[0].is_loading());
        assert!(a[1].is_success());
        assert!(b.is_empty());
        assert_eq!(store.current_page(), 1);

        // Flag released once the first finished
        let third = collect(store.load_more()).await;
        assert_eq!(success(&third), facilities(45)[30..45].to_vec());
    }

    #[tokio::test]
    async fn test_dropped_load_more_releases_flag() {
        let store = CacheStore::new(ScriptedSource::new().succeed(facilities(45)));
        collect(store.load()).await;

        let pending = store.load_more();
        assert!(store.is_loading_more());
        drop(pending);
        assert!(!store.is_loading_more());
        assert_eq!(store.current_page(), 0);
    }

    #[tokio::test]
    async fn test_load_more_superseded_by_invalidate() {
        let store = CacheStore::new(ScriptedSource::new().succeed(facilities(45)));
        collect(store.load()).await;

        let mut pending = store.load_more();
        assert_eq!(pending.next().await, Some(Resource::Loading));
        store.invalidate();

        let replacement = store.load_more();
        assert_eq!(pending.next().await, None);
        drop(pending);
        // The stale stream must not clear the new claim
        assert!(store.is_loading_more());
        drop(replacement);
        assert!(!store.is_loading_more());
    }

    // -------------------------------------------------------------------------
    // search / filter / invalidate
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_search_local_over_full_cache() {
        let aceh = facility("RS UMUM DAERAH DR. ZAINOEL ABIDIN", "Aceh");
        let bali = facility("RSUP SANGLAH", "Bali");
        let source = ScriptedSource::new().succeed(vec![aceh.clone(), bali.clone()]);
        let store = CacheStore::new(source);

        assert!(store.search_local("bali").is_empty());
        collect(store.load()).await;

        assert_eq!(store.search_local("bali"), vec![bali.clone()]);
        assert_eq!(store.search_local("").len(), 2);
        assert_eq!(store.filter_by_province("ACEH"), vec![aceh]);
        assert!(store.filter_by_province("Jawa").is_empty());
        assert_eq!(store.filter_by_region("kota bali"), vec![bali]);
        assert!(store.filter_by_region("Aceh Besar").is_empty());
    }

    #[tokio::test]
    async fn test_search_ignores_pagination() {
        let all = facilities(45);
        let store = CacheStore::new(ScriptedSource::new().succeed(all));
        collect(store.load()).await;

        // RS 44 is far beyond the first page
        assert_eq!(names(&store.search_local("rs 44")), vec!["RS 44".to_string()]);
        assert_eq!(store.current_page(), 0);
    }

    #[tokio::test]
    async fn test_invalidate_resets_everything() {
        let store = CacheStore::new(
            ScriptedSource::new()
                .succeed(facilities(45))
                .succeed(facilities(45)),
        );
        collect(store.load()).await;
        collect(store.load_more()).await;

        store.invalidate();
        assert!(!store.has_more());
        assert_eq!(store.total_count(), 0);
        assert_eq!(store.current_page(), 0);
        assert!(store.cache_age().is_none());
        assert!(store.search_local("").is_empty());

        collect(store.load()).await;
        assert_eq!(store.source().calls(), 2);
    }

    #[tokio::test]
    async fn test_error_after_invalidate_with_failing_source() {
        let store = CacheStore::new(ScriptedSource::new().succeed(facilities(5)));
        collect(store.load()).await;
        store.invalidate();
        store.source().push(Err(ApiError::RateLimited));

        let outcome = collect(store.load()).await;
        assert_eq!(
            outcome[1],
            Resource::Error("Rate limited - please wait before retrying".to_string())
        );
    }
}
