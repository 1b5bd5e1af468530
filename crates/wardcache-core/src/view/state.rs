use crate::models::Facility;

/// Presentation snapshot derived from the cache store and the search query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    /// Every page loaded so far, in list order.
    pub items: Vec<Facility>,
    /// `items` narrowed by `query`.
    pub visible_items: Vec<Facility>,
    pub query: String,
    pub loading: bool,
    pub loading_more: bool,
    pub error_message: Option<String>,
    pub has_more: bool,
    pub current_page: usize,
    pub total_count: usize,
    /// When the cached list was fetched, in epoch millis.
    pub fetched_at_millis: Option<i64>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            visible_items: Vec::new(),
            query: String::new(),
            loading: false,
            loading_more: false,
            error_message: None,
            // Optimistic until the first load says otherwise
            has_more: true,
            current_page: 0,
            total_count: 0,
            fetched_at_millis: None,
        }
    }
}

impl ViewState {
    pub fn refilter(&mut self) {
        self.visible_items = apply_filter(&self.items, &self.query);
    }

    pub fn loaded_count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible_items.is_empty()
    }
}

/// Filter loaded facilities by a free-text query. A blank query keeps everything.
pub fn apply_filter(items: &[Facility], query: &str) -> Vec<Facility> {
    if query.trim().is_empty() {
        return items.to_vec();
    }
    items.iter().filter(|f| f.matches(query)).cloned().collect()
}
