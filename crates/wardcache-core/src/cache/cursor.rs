use std::ops::Range;

/// Tracks how many pages beyond the initial page have been handed out.
///
/// `loaded_count = initial_page_size + pages_loaded * page_size`, clamped to
/// the number of cached items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationCursor {
    initial_page_size: usize,
    page_size: usize,
    pages_loaded: usize,
}

impl PaginationCursor {
    pub fn new(initial_page_size: usize, page_size: usize) -> Self {
        Self {
            initial_page_size,
            page_size,
            pages_loaded: 0,
        }
    }

    pub fn initial_page_size(&self) -> usize {
        self.initial_page_size
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn pages_loaded(&self) -> usize {
        self.pages_loaded
    }

    fn unclamped_count(&self) -> usize {
        self.initial_page_size + self.pages_loaded * self.page_size
    }

    pub fn loaded_count(&self, total: usize) -> usize {
        self.unclamped_count().min(total)
    }

    pub fn has_more(&self, total: usize) -> bool {
        self.unclamped_count() < total
    }

    pub fn advance(&mut self) {
        self.pages_loaded += 1;
    }

    pub fn rollback(&mut self) {
        self.pages_loaded = self.pages_loaded.saturating_sub(1);
    }

    pub fn reset(&mut self) {
        self.pages_loaded = 0;
    }

    /// Range of the most recently loaded page, clamped to `total`.
    /// With no extra pages loaded this is the initial page.
    pub fn page_range(&self, total: usize) -> Range<usize> {
        if self.pages_loaded == 0 {
            return 0..self.initial_page_size.min(total);
        }
        let start = (self.initial_page_size + (self.pages_loaded - 1) * self.page_size).min(total);
        let end = (start + self.page_size).min(total);
        start..end
    }
}
