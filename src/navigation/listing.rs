//! Clamped pagination over flat listings

/// One page of a listing. `start..end` is the slice to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Zero-based page number after clamping
    pub number: usize,
    /// Always at least 1, even for an empty listing
    pub total_pages: usize,
    pub start: usize,
    pub end: usize,
}

impl Page {
    pub fn has_prev(&self) -> bool {
        self.number > 0
    }

    pub fn has_next(&self) -> bool {
        self.number + 1 < self.total_pages
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }
}

/// Page `requested` of a listing of `total` items. Out-of-range page
/// numbers are clamped to the last page; never fails.
pub fn paginate(total: usize, requested: usize, page_size: usize) -> Page {
    let page_size = page_size.max(1);
    let total_pages = total.div_ceil(page_size).max(1);
    let number = requested.min(total_pages - 1);
    let start = (number * page_size).min(total);
    let end = (start + page_size).min(total);
    Page {
        number,
        total_pages,
        start,
        end,
    }
}

/// Page holding `index`, clamped to the listing. Used to re-render the
/// page a deleted item was on.
pub fn page_of(index: usize, total: usize, page_size: usize) -> usize {
    let page_size = page_size.max(1);
    let last = total.saturating_sub(1);
    index.min(last) / page_size
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_listing_has_one_page() {
        assert_eq!(
            paginate(0, 3, 20),
            Page {
                number: 0,
                total_pages: 1,
                start: 0,
                end: 0
            }
        );
    }

    #[test]
    fn test_pages_and_clamping() {
        let page = paginate(45, 1, 20);
        assert_eq!((page.number, page.total_pages, page.start, page.end), (1, 3, 20, 40));
        assert!(page.has_prev() && page.has_next());

        let last = paginate(45, 99, 20);
        assert_eq!((last.number, last.start, last.end), (2, 40, 45));
        assert!(!last.has_next());
    }

    #[test]
    fn test_exact_multiple() {
        let page = paginate(40, 5, 20);
        assert_eq!((page.number, page.total_pages, page.range()), (1, 2, 20..40));
    }

    #[test]
    fn test_page_of_clamps() {
        assert_eq!(page_of(0, 45, 20), 0);
        assert_eq!(page_of(20, 45, 20), 1);
        // deleting the only item on the last page falls back one page
        assert_eq!(page_of(40, 40, 20), 1);
        assert_eq!(page_of(7, 0, 20), 0);
    }
}
