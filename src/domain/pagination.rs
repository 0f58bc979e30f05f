//! Page window over the row list

use std::ops::Range;

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const PAGE_SIZE_CHOICES: [usize; 4] = [10, 20, 50, 100];

/// Persisted page state. The page is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub current_page: usize,
    pub page_size: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            current_page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Derived window for one render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView {
    pub current_page: usize,
    pub total_pages: usize,
    /// Global row indices shown on this page
    pub range: Range<usize>,
}

impl PageView {
    pub fn can_first(&self) -> bool {
        self.current_page > 1
    }

    pub fn can_prev(&self) -> bool {
        self.current_page > 1
    }

    pub fn can_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    pub fn can_last(&self) -> bool {
        self.current_page < self.total_pages
    }

    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    /// 1-based number of a global index, as shown in the `#` column
    pub fn row_number(index: usize) -> usize {
        index + 1
    }

    pub fn visible<'a, T>(&self, rows: &'a [T]) -> &'a [T] {
        &rows[self.range.clone()]
    }
}

pub fn total_pages(total_rows: usize, page_size: usize) -> usize {
    let page_size = page_size.max(1);
    total_rows.div_ceil(page_size).max(1)
}

/// Compute the window without correcting an out-of-range page; such a
/// page simply shows nothing.
pub fn view(total_rows: usize, current_page: usize, page_size: usize) -> PageView {
    let page_size = page_size.max(1);
    let start = current_page
        .saturating_sub(1)
        .saturating_mul(page_size)
        .min(total_rows);
    let end = start.saturating_add(page_size).min(total_rows);
    PageView {
        current_page,
        total_pages: total_pages(total_rows, page_size),
        range: start..end,
    }
}

impl Pagination {
    pub fn new(current_page: usize, page_size: usize) -> Self {
        Self {
            current_page: current_page.max(1),
            page_size: page_size.max(1),
        }
    }

    pub fn view(&self, total_rows: usize) -> PageView {
        view(total_rows, self.current_page, self.page_size)
    }

    /// Pull a restored page back into `[1, total_pages]`
    pub fn clamp(&mut self, total_rows: usize) -> bool {
        let clamped = self
            .current_page
            .clamp(1, total_pages(total_rows, self.page_size));
        let changed = clamped != self.current_page;
        self.current_page = clamped;
        changed
    }

    pub fn first(&mut self) -> bool {
        self.go_to(1)
    }

    pub fn prev(&mut self) -> bool {
        if self.current_page <= 1 {
            return false;
        }
        self.go_to(self.current_page - 1)
    }

    pub fn next(&mut self, total_rows: usize) -> bool {
        if self.current_page >= total_pages(total_rows, self.page_size) {
            return false;
        }
        self.go_to(self.current_page + 1)
    }

    pub fn last(&mut self, total_rows: usize) -> bool {
        self.go_to(total_pages(total_rows, self.page_size))
    }

    pub fn go_to(&mut self, page: usize) -> bool {
        let page = page.max(1);
        let changed = page != self.current_page;
        self.current_page = page;
        changed
    }

    /// Page containing a global row index
    pub fn show_index(&mut self, index: usize) -> bool {
        self.go_to(index / self.page_size.max(1) + 1)
    }

    /// Changing the page size always returns to the first page
    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.current_page = 1;
    }

    pub fn next_page_size(&self) -> usize {
        PAGE_SIZE_CHOICES
            .iter()
            .copied()
            .find(|size| *size > self.page_size)
            .unwrap_or(PAGE_SIZE_CHOICES[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_twenty_three_rows_page_three() {
        let page = view(23, 3, 10);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.range, 20..23);
        let numbers: Vec<usize> = page.range.clone().map(PageView::row_number).collect();
        assert_eq!(numbers, vec![21, 22, 23]);
        assert!(!page.can_next());
        assert!(!page.can_last());
        assert!(page.can_prev());
        assert!(page.can_first());
    }

    #[test]
    fn test_empty_table_has_one_page() {
        let page = view(0, 1, 10);
        assert_eq!(page.total_pages, 1);
        assert!(page.is_empty());
        assert!(!page.can_prev());
        assert!(!page.can_next());
    }

    #[test]
    fn test_slices_are_contiguous_and_disjoint() {
        for total in 0..60 {
            for size in 1..12 {
                let pages = total_pages(total, size);
                let mut covered = 0;
                for page in 1..=pages {
                    let window = view(total, page, size);
                    assert_eq!(window.range.start, covered);
                    let expected = size.min(total - (page - 1) * size);
                    assert_eq!(window.len(), expected);
                    covered = window.range.end;
                }
                assert_eq!(covered, total);
            }
        }
    }

    #[test]
    fn test_out_of_range_page_is_not_corrected_by_view() {
        let page = view(5, 4, 10);
        assert_eq!(page.current_page, 4);
        assert!(page.is_empty());

        let mut state = Pagination::new(4, 10);
        assert!(state.clamp(5));
        assert_eq!(state.current_page, 1);
    }

    #[test]
    fn test_navigation_bounds() {
        let mut state = Pagination::new(1, 10);
        assert!(!state.prev());
        assert!(state.next(25));
        assert!(state.next(25));
        assert!(!state.next(25));
        assert_eq!(state.current_page, 3);
        assert!(state.first());
        assert!(state.last(25));
        assert_eq!(state.current_page, 3);
    }

    #[test]
    fn test_page_size_resets_page() {
        let mut state = Pagination::new(3, 10);
        state.set_page_size(state.next_page_size());
        assert_eq!(state, Pagination::new(1, 20));
        state.set_page_size(100);
        assert_eq!(state.next_page_size(), 10);
    }

    #[test]
    fn test_show_index() {
        let mut state = Pagination::new(1, 10);
        state.show_index(22);
        assert_eq!(state.current_page, 3);
    }
}
