//! Pagination over ordered result sets.
//!
//! The page size is an explicit configuration value carried in [`Pagination`]
//! and passed into every listing handler; out-of-range page numbers clamp to
//! the nearest valid page instead of failing.

use serde::Serialize;

/// Page-size configuration shared by all listing handlers.
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    page_size: u64,
}

impl Pagination {
    pub const DEFAULT_PAGE_SIZE: u64 = 10;

    pub fn new(page_size: u64) -> Self {
        Self {
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    fn total_pages(&self, total_items: u64) -> u64 {
        // An empty result set still has exactly one (empty) page.
        total_items.div_ceil(self.page_size).max(1)
    }

    /// Compute the window for a requested page number.
    ///
    /// Requests below 1 clamp to the first page, requests past the end clamp
    /// to the last page.
    pub fn window(&self, total_items: u64, requested: i64) -> PageWindow {
        let total_pages = self.total_pages(total_items);
        let number = requested.max(1) as u64;
        let number = number.min(total_pages);

        PageWindow {
            number,
            offset: (number - 1) * self.page_size,
            limit: self.page_size,
            total_pages,
            total_items,
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PAGE_SIZE)
    }
}

/// A bounded slice of an ordered result set, plus its position.
#[derive(Debug, Clone, Copy)]
pub struct PageWindow {
    pub number: u64,
    pub offset: u64,
    pub limit: u64,
    pub total_pages: u64,
    pub total_items: u64,
}

impl PageWindow {
    pub fn has_next(&self) -> bool {
        self.number < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }
}

/// A materialized page: the items of one window plus its metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub total_pages: u64,
    pub total_items: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, window: PageWindow) -> Self {
        Self {
            has_next: window.has_next(),
            has_previous: window.has_previous(),
            number: window.number,
            total_pages: window.total_pages,
            total_items: window.total_items,
            items,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            total_pages: self.total_pages,
            total_items: self.total_items,
            has_next: self.has_next,
            has_previous: self.has_previous,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thirteen_items_split_ten_and_three() {
        let pagination = Pagination::new(10);

        let first = pagination.window(13, 1);
        assert_eq!(first.offset, 0);
        assert_eq!(first.limit, 10);
        assert_eq!(first.total_pages, 2);
        assert!(first.has_next());
        assert!(!first.has_previous());

        let second = pagination.window(13, 2);
        assert_eq!(second.offset, 10);
        assert!(!second.has_next());
        assert!(second.has_previous());
        // 13 items, 10 on page one, 3 left for page two.
        assert_eq!(second.total_items - second.offset, 3);
    }

    #[test]
    fn page_below_one_clamps_to_first() {
        let pagination = Pagination::new(10);

        let window = pagination.window(25, 0);
        assert_eq!(window.number, 1);
        assert_eq!(window.offset, 0);

        let window = pagination.window(25, -7);
        assert_eq!(window.number, 1);
    }

    #[test]
    fn page_past_the_end_clamps_to_last() {
        let pagination = Pagination::new(10);

        let window = pagination.window(25, 99);
        assert_eq!(window.number, 3);
        assert_eq!(window.offset, 20);
        assert!(!window.has_next());
    }

    #[test]
    fn empty_set_has_one_empty_page() {
        let pagination = Pagination::new(10);

        let window = pagination.window(0, 1);
        assert_eq!(window.number, 1);
        assert_eq!(window.total_pages, 1);
        assert!(!window.has_next());
        assert!(!window.has_previous());
    }

    #[test]
    fn exact_multiple_has_no_trailing_page() {
        let pagination = Pagination::new(10);
        let window = pagination.window(20, 2);
        assert_eq!(window.total_pages, 2);
    }

    #[test]
    fn zero_page_size_is_bumped_to_one() {
        let pagination = Pagination::new(0);
        assert_eq!(pagination.page_size(), 1);
    }

    #[test]
    fn page_metadata_carries_over_to_page() {
        let pagination = Pagination::new(10);
        let window = pagination.window(13, 2);
        let page = Page::new(vec!["a", "b", "c"], window);

        assert_eq!(page.number, 2);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.total_items, 13);
        assert!(!page.has_next);
        assert!(page.has_previous);
    }
}
