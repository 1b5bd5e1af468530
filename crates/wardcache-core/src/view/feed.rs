//! Observable facility list backed by a `CacheStore`.
//!
//! `FacilityFeed` drives store operations and folds every `Resource` they
//! yield into a `ViewState`, published through a `tokio::sync::watch` channel.

use std::pin::pin;
use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::watch;
use tracing::debug;

use crate::api::DataSource;
use crate::cache::CacheStore;
use crate::models::Facility;
use crate::resource::Resource;

use super::ViewState;

pub struct FacilityFeed<S> {
    store: Arc<CacheStore<S>>,
    state: watch::Sender<ViewState>,
}

impl<S: DataSource> FacilityFeed<S> {
    pub fn new(store: Arc<CacheStore<S>>) -> Self {
        let (state, _) = watch::channel(ViewState::default());
        Self { store, state }
    }

    pub fn store(&self) -> &Arc<CacheStore<S>> {
        &self.store
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> ViewState {
        self.state.borrow().clone()
    }

    /// Load the first page and replace everything loaded so far.
    pub async fn load(&self) {
        let mut updates = pin!(self.store.load());
        while let Some(resource) = updates.next().await {
            self.apply_load(resource);
        }
    }

    fn apply_load(&self, resource: Resource<Vec<Facility>>) {
        match resource {
            Resource::Loading => self.state.send_modify(|s| {
                s.loading = true;
                s.error_message = None;
            }),
            Resource::Success(items) => {
                let has_more = self.store.has_more();
                let current_page = self.store.current_page();
                let total_count = self.store.total_count();
                let fetched_at_millis = self.store.fetched_at_millis();
                self.state.send_modify(|s| {
                    s.items = items;
                    s.refilter();
                    s.loading = false;
                    s.error_message = None;
                    s.has_more = has_more;
                    s.current_page = current_page;
                    s.total_count = total_count;
                    s.fetched_at_millis = fetched_at_millis;
                });
            }
            Resource::Error(message) => self.state.send_modify(|s| {
                s.loading = false;
                s.error_message = Some(message);
            }),
        }
    }

    /// Append the next page. Does nothing while a page is loading or once
    /// everything has been loaded.
    pub async fn load_more(&self) {
        {
            let current = self.state.borrow();
            if current.loading_more || !current.has_more {
                debug!(
                    loading_more = current.loading_more,
                    has_more = current.has_more,
                    "Skipping load more"
                );
                return;
            }
        }

        let mut updates = self.store.load_more();
        while let Some(resource) = updates.next().await {
            self.apply_load_more(resource);
        }

        // A load-more cut short by invalidate ends without a result
        self.state.send_if_modified(|s| std::mem::replace(&mut s.loading_more, false));
    }

    fn apply_load_more(&self, resource: Resource<Vec<Facility>>) {
        match resource {
            Resource::Loading => self.state.send_modify(|s| s.loading_more = true),
            Resource::Success(page) if page.is_empty() => self.state.send_modify(|s| {
                s.loading_more = false;
                s.has_more = false;
            }),
            Resource::Success(page) => {
                let has_more = self.store.has_more();
                let current_page = self.store.current_page();
                self.state.send_modify(|s| {
                    s.items.extend(page);
                    s.refilter();
                    s.loading_more = false;
                    s.has_more = has_more;
                    s.current_page = current_page;
                });
            }
            Resource::Error(message) => self.state.send_modify(|s| {
                s.loading_more = false;
                s.error_message = Some(message);
            }),
        }
    }

    /// Change the search query; the loaded set is filtered again immediately.
    pub fn search(&self, query: &str) {
        self.state.send_modify(|s| {
            s.query = query.to_string();
            s.refilter();
        });
    }

    /// Throw away the cache and everything loaded, then load again.
    pub async fn refresh(&self) {
        self.store.invalidate();
        self.state.send_modify(|s| {
            s.items.clear();
            s.visible_items.clear();
            s.has_more = true;
            s.current_page = 0;
            s.loading_more = false;
        });
        self.load().await;
    }

    pub fn clear_error(&self) {
        self.state.send_if_modified(|s| s.error_message.take().is_some());
    }

    /// Loaded facilities in `province`, compared case-insensitively.
    pub fn facilities_in_province(&self, province: &str) -> Vec<Facility> {
        self.state
            .borrow()
            .items
            .iter()
            .filter(|f| f.in_province(province))
            .cloned()
            .collect()
    }
}
