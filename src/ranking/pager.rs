use std::ops::Range;

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Page cursor over a ranked sequence. Moving between pages never rescores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    page: usize,
    page_size: usize,
    total: usize,
}

impl Default for Pager {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Pager {
    #[must_use]
    pub fn new(page_size: usize) -> Self {
        Self {
            page: 0,
            page_size: page_size.max(1),
            total: 0,
        }
    }

    #[must_use]
    pub const fn page(&self) -> usize {
        self.page
    }

    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    /// Length of the ranked sequence being paged.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.total
    }

    /// Number of pages; an empty sequence still has one (empty) page.
    #[must_use]
    pub const fn page_count(&self) -> usize {
        if self.total == 0 {
            1
        } else {
            self.total.div_ceil(self.page_size)
        }
    }

    #[must_use]
    pub const fn last_page(&self) -> usize {
        self.page_count() - 1
    }

    /// Index range of the current page within the ranked sequence.
    #[must_use]
    pub fn range(&self) -> Range<usize> {
        let start = (self.page * self.page_size).min(self.total);
        let end = (start + self.page_size).min(self.total);
        start..end
    }

    /// Adopt a new sequence length. Resetting goes back to page 0; otherwise
    /// the page is kept when it still exists.
    pub fn resize(&mut self, total: usize, reset: bool) {
        self.total = total;
        if reset {
            self.page = 0;
        } else {
            self.page = self.page.min(self.last_page());
        }
    }

    /// Returns whether the page changed.
    pub fn next(&mut self) -> bool {
        if self.page < self.last_page() {
            self.page += 1;
            true
        } else {
            false
        }
    }

    pub fn prev(&mut self) -> bool {
        if self.page > 0 {
            self.page -= 1;
            true
        } else {
            false
        }
    }

    /// Jump to a page, clamped to the last one.
    pub fn go_to(&mut self, page: usize) {
        self.page = page.min(self.last_page());
    }
}
