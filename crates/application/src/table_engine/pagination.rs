use std::ops::Range;

const MAX_PAGE_BUTTONS: usize = 5;

/// One-based page position over a row count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// Current page, starting at 1.
    pub page: usize,
    /// Rows per page. Never zero.
    pub page_size: usize,
    /// Rows after search and filters.
    pub total_rows: usize,
}

impl PageWindow {
    /// Returns the number of pages.
    #[must_use]
    pub fn total_pages(&self) -> usize {
        total_pages(self.total_rows, self.page_size)
    }

    /// Returns the row index range of the current page.
    #[must_use]
    pub fn range(&self) -> Range<usize> {
        page_range(self.page, self.page_size, self.total_rows)
    }

    /// Returns whether a previous page exists.
    #[must_use]
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    /// Returns whether a next page exists.
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    /// Returns "Showing X to Y of Z entries".
    #[must_use]
    pub fn summary(&self) -> String {
        let first = self
            .page
            .saturating_sub(1)
            .saturating_mul(self.page_size)
            .saturating_add(1);
        let last = self.page.saturating_mul(self.page_size).min(self.total_rows);
        format!("Showing {first} to {last} of {} entries", self.total_rows)
    }
}

/// Returns `ceil(total_rows / page_size)`; zero page size yields zero pages.
#[must_use]
pub fn total_pages(total_rows: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total_rows.div_ceil(page_size)
}

/// Returns the slice range of a one-based page, empty past the last page.
#[must_use]
pub fn page_range(page: usize, page_size: usize, total_rows: usize) -> Range<usize> {
    let start = page
        .saturating_sub(1)
        .saturating_mul(page_size)
        .min(total_rows);
    let end = start.saturating_add(page_size).min(total_rows);
    start..end
}

/// Returns at most five page numbers around the current page, clamped at both ends.
#[must_use]
pub fn page_buttons(page: usize, total_pages: usize) -> Vec<usize> {
    let count = total_pages.min(MAX_PAGE_BUTTONS);
    let first = if total_pages <= MAX_PAGE_BUTTONS || page <= 3 {
        1
    } else if page >= total_pages - 2 {
        total_pages - 4
    } else {
        page - 2
    };

    (first..first + count).collect()
}
