//! Pagination state with backend-count clamping.

/// Current page, page size, and the backend's total row count.
///
/// The page is always within `[1, max_page]`; navigation and page-size
/// changes clamp rather than error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    page: u32,
    page_size: u32,
    total: u64,
}

impl Default for Pager {
    fn default() -> Self {
        Self::new(10)
    }
}

impl Pager {
    /// # Panics
    ///
    /// Panics if `page_size` is zero.
    #[must_use]
    pub fn new(page_size: u32) -> Self {
        assert!(page_size > 0, "page size must be positive");
        Self {
            page: 1,
            page_size,
            total: 0,
        }
    }

    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }

    /// Highest reachable page: `max(1, ceil(total / page_size))`.
    #[must_use]
    pub const fn max_page(&self) -> u32 {
        let pages = self.total.div_ceil(self.page_size as u64);
        if pages == 0 {
            1
        } else if pages > u32::MAX as u64 {
            u32::MAX
        } else {
            pages as u32
        }
    }

    /// Record the backend's total count, clamping the current page if it
    /// fell out of range (rows deleted under us).
    pub const fn set_total(&mut self, total: u64) {
        self.total = total;
        self.page = clamp_page(self.page, self.max_page());
    }

    /// Jump to a page; out-of-range requests clamp to `[1, max_page]`.
    pub const fn set_page(&mut self, page: u32) {
        self.page = clamp_page(page, self.max_page());
    }

    /// Change the page size and return to the first page.
    ///
    /// # Panics
    ///
    /// Panics if `page_size` is zero.
    pub fn set_page_size(&mut self, page_size: u32) {
        assert!(page_size > 0, "page size must be positive");
        self.page_size = page_size;
        self.page = 1;
    }

    pub const fn next(&mut self) {
        self.set_page(self.page.saturating_add(1));
    }

    pub const fn prev(&mut self) {
        self.set_page(self.page.saturating_sub(1));
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.max_page()
    }

    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.page > 1
    }
}

const fn clamp_page(page: u32, max_page: u32) -> u32 {
    if page == 0 {
        1
    } else if page > max_page {
        max_page
    } else {
        page
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forty_seven_rows_at_ten_per_page() {
        let mut pager = Pager::new(10);
        pager.set_total(47);
        assert_eq!(pager.max_page(), 5);

        pager.set_page(6);
        assert_eq!(pager.page(), 5);

        pager.set_page(0);
        assert_eq!(pager.page(), 1);
    }

    #[test]
    fn test_empty_result_still_has_one_page() {
        let mut pager = Pager::new(10);
        pager.set_total(0);
        assert_eq!(pager.max_page(), 1);
        assert_eq!(pager.page(), 1);
        assert!(!pager.has_next());
        assert!(!pager.has_prev());
    }

    #[test]
    fn test_navigation_saturates_at_bounds() {
        let mut pager = Pager::new(10);
        pager.set_total(25);
        pager.prev();
        assert_eq!(pager.page(), 1);
        pager.next();
        pager.next();
        pager.next();
        assert_eq!(pager.page(), 3);
        assert!(!pager.has_next());
    }

    #[test]
    fn test_shrinking_total_clamps_current_page() {
        let mut pager = Pager::new(10);
        pager.set_total(50);
        pager.set_page(5);
        pager.set_total(12);
        assert_eq!(pager.page(), 2);
    }

    #[test]
    fn test_page_size_change_resets_to_first_page() {
        let mut pager = Pager::new(10);
        pager.set_total(100);
        pager.set_page(7);
        pager.set_page_size(25);
        assert_eq!(pager.page(), 1);
        assert_eq!(pager.max_page(), 4);
    }
}
