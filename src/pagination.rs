//! Page position tracking for paged catalog searches.

use serde::{Deserialize, Serialize};

/// Direction of a page transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Next,
    Previous,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Next => write!(f, "next"),
            Direction::Previous => write!(f, "previous"),
        }
    }
}

/// Pagination errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageError {
    /// The requested transition would leave the valid page range
    #[error("No {direction} page (page {page_index} of {page_count})")]
    Boundary {
        direction: Direction,
        page_index: usize,
        page_count: usize,
    },
}

/// Number of pages needed for `total_results` items, 0 when there are none
pub fn page_count(total_results: usize, page_size: usize) -> usize {
    if total_results == 0 || page_size == 0 {
        return 0;
    }
    total_results.div_ceil(page_size)
}

/// Tracks the current page, page size and total results of a search
///
/// `page_index` is always at least 1 and [`next`](Self::next) never moves it past
/// [`page_count`](Self::page_count). A total that later shrinks below the current
/// page is stored as reported; `page_index` keeps naming the page that was fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationController {
    page_index: usize,
    page_size: usize,
    total_results: usize,
}

impl PaginationController {
    /// Create a controller positioned on the first page
    pub fn new(page_size: usize) -> Self {
        Self {
            page_index: 1,
            page_size: page_size.max(1),
            total_results: 0,
        }
    }

    /// Return to the first page with no known results
    pub fn reset(&mut self, page_size: usize) {
        self.page_index = 1;
        self.page_size = page_size.max(1);
        self.total_results = 0;
    }

    /// Record the total reported by the latest fetch, as reported
    pub fn set_totals(&mut self, total_results: usize) {
        self.total_results = total_results;
    }

    pub fn has_next(&self) -> bool {
        self.page_index * self.page_size < self.total_results
    }

    pub fn has_previous(&self) -> bool {
        self.page_index > 1
    }

    /// Advance one page
    pub fn next(&mut self) -> Result<usize, PageError> {
        if !self.has_next() {
            return Err(self.boundary(Direction::Next));
        }
        self.page_index += 1;
        Ok(self.page_index)
    }

    /// Go back one page
    pub fn previous(&mut self) -> Result<usize, PageError> {
        if !self.has_previous() {
            return Err(self.boundary(Direction::Previous));
        }
        self.page_index -= 1;
        Ok(self.page_index)
    }

    /// Move one page in `direction`
    pub fn step(&mut self, direction: Direction) -> Result<usize, PageError> {
        match direction {
            Direction::Next => self.next(),
            Direction::Previous => self.previous(),
        }
    }

    pub fn page_count(&self) -> usize {
        page_count(self.total_results, self.page_size)
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn total_results(&self) -> usize {
        self.total_results
    }

    /// Zero-based catalog offset of the current page
    pub fn start_index(&self) -> usize {
        (self.page_index - 1) * self.page_size
    }

    fn boundary(&self, direction: Direction) -> PageError {
        PageError::Boundary {
            direction,
            page_index: self.page_index,
            page_count: self.page_count(),
        }
    }
}

impl Default for PaginationController {
    fn default() -> Self {
        Self::new(10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_state() {
        let mut pager = PaginationController::new(10);
        pager.set_totals(100);
        pager.next().unwrap();
        pager.reset(20);

        assert_eq!(pager.page_index(), 1);
        assert_eq!(pager.page_size(), 20);
        assert_eq!(pager.total_results(), 0);
        assert_eq!(pager.page_count(), 0);
    }

    #[test]
    fn test_next_boundary_at_last_page() {
        let mut pager = PaginationController::new(10);
        pager.set_totals(25);

        assert_eq!(pager.next(), Ok(2));
        assert_eq!(pager.next(), Ok(3));
        assert_eq!(
            pager.next(),
            Err(PageError::Boundary {
                direction: Direction::Next,
                page_index: 3,
                page_count: 3,
            })
        );
        assert_eq!(pager.page_index(), 3);
    }

    #[test]
    fn test_next_boundary_exact_multiple() {
        let mut pager = PaginationController::new(10);
        pager.set_totals(20);
        assert_eq!(pager.next(), Ok(2));
        assert!(pager.next().is_err());
    }

    #[test]
    fn test_previous_boundary_on_first_page() {
        let mut pager = PaginationController::new(10);
        pager.set_totals(50);
        assert!(matches!(
            pager.previous(),
            Err(PageError::Boundary {
                direction: Direction::Previous,
                ..
            })
        ));

        pager.next().unwrap();
        assert_eq!(pager.previous(), Ok(1));
        assert_eq!(pager.page_index(), 1);
    }

    #[test]
    fn test_no_results_has_no_pages() {
        let mut pager = PaginationController::new(10);
        pager.set_totals(0);
        assert_eq!(pager.page_count(), 0);
        assert!(pager.next().is_err());
        assert_eq!(pager.page_index(), 1);
    }

    #[test]
    fn test_shrinking_total_keeps_fetched_page() {
        let mut pager = PaginationController::new(10);
        pager.set_totals(50);
        pager.next().unwrap();
        pager.next().unwrap();
        pager.next().unwrap();
        assert_eq!(pager.page_index(), 4);

        pager.set_totals(15);
        assert_eq!(pager.total_results(), 15);
        assert_eq!(pager.page_index(), 4);
        assert_eq!(pager.start_index(), 30);

        assert!(pager.next().is_err());
        assert_eq!(pager.previous(), Ok(3));
        assert_eq!(pager.start_index(), 20);
    }

    #[test]
    fn test_start_index() {
        let mut pager = PaginationController::new(40);
        pager.set_totals(200);
        assert_eq!(pager.start_index(), 0);
        pager.step(Direction::Next).unwrap();
        assert_eq!(pager.start_index(), 40);
    }

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0, 10), 0);
        assert_eq!(page_count(1, 10), 1);
        assert_eq!(page_count(10, 10), 1);
        assert_eq!(page_count(11, 10), 2);
    }
}
