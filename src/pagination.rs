use serde::Serialize;
use std::num::IntErrorKind;

/// Page size of the contact list.
pub const CONTACTS_PER_PAGE: i64 = 5;

/// Computes page windows over `total` items. Requests never fail: anything
/// that is not an in-range page number lands on the nearest valid page.
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    total: i64,
    per_page: i64,
}

/// One resolved page: its 1-based number plus enough context to render
/// navigation and to fetch its rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageWindow {
    pub number: i64,
    pub num_pages: i64,
    pub per_page: i64,
    pub total: i64,
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub window: PageWindow,
}

impl Paginator {
    pub fn new(total: i64, per_page: i64) -> Self {
        Self {
            total: total.max(0),
            per_page: per_page.max(1),
        }
    }

    /// An empty list still has one (empty) page.
    pub fn num_pages(&self) -> i64 {
        if self.total == 0 {
            1
        } else {
            (self.total + self.per_page - 1) / self.per_page
        }
    }

    /// Resolve a raw `page` query value.
    ///
    /// Absent or non-numeric values give page 1, values below 1 clamp to 1
    /// and values past the end clamp to the last page.
    pub fn page(&self, raw: Option<&str>) -> PageWindow {
        let last = self.num_pages();
        let requested = match raw.map(str::trim) {
            None | Some("") => 1,
            Some(s) => match s.parse::<i64>() {
                Ok(n) => n,
                Err(e) if *e.kind() == IntErrorKind::PosOverflow => last,
                Err(_) => 1,
            },
        };
        self.window(requested.clamp(1, last))
    }

    fn window(&self, number: i64) -> PageWindow {
        PageWindow {
            number,
            num_pages: self.num_pages(),
            per_page: self.per_page,
            total: self.total,
        }
    }
}

impl PageWindow {
    pub fn offset(&self) -> i64 {
        (self.number - 1) * self.per_page
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    /// 1-based index of the first item on this page, 0 for an empty list
    pub fn start_index(&self) -> i64 {
        if self.total == 0 {
            0
        } else {
            self.offset() + 1
        }
    }

    pub fn end_index(&self) -> i64 {
        (self.offset() + self.per_page).min(self.total)
    }
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, window: PageWindow) -> Self {
        Self { items, window }
    }

    /// The page shown when the data could not be loaded
    pub fn empty(per_page: i64) -> Self {
        Self::new(vec![], Paginator::new(0, per_page).page(None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count() {
        assert_eq!(Paginator::new(0, 5).num_pages(), 1);
        assert_eq!(Paginator::new(5, 5).num_pages(), 1);
        assert_eq!(Paginator::new(6, 5).num_pages(), 2);
        assert_eq!(Paginator::new(11, 5).num_pages(), 3);
    }

    #[test]
    fn windows_cover_expected_positions() {
        let paginator = Paginator::new(12, 5);
        let second = paginator.page(Some("2"));
        assert_eq!((second.offset(), second.limit()), (5, 5));
        assert_eq!((second.start_index(), second.end_index()), (6, 10));

        let last = paginator.page(Some("3"));
        assert_eq!((last.start_index(), last.end_index()), (11, 12));
        assert!(last.has_previous());
        assert!(!last.has_next());
    }

    #[test]
    fn out_of_range_requests_clamp() {
        let paginator = Paginator::new(12, 5);
        assert_eq!(paginator.page(Some("0")).number, 1);
        assert_eq!(paginator.page(Some("-4")).number, 1);
        assert_eq!(paginator.page(Some("99")).number, 3);
        assert_eq!(paginator.page(Some("99999999999999999999999")).number, 3);
        assert_eq!(paginator.page(Some("abc")).number, 1);
        assert_eq!(paginator.page(Some("")).number, 1);
        assert_eq!(paginator.page(None).number, 1);
    }

    #[test]
    fn empty_list_has_one_empty_page() {
        let window = Paginator::new(0, 5).page(Some("4"));
        assert_eq!(window.number, 1);
        assert_eq!(window.offset(), 0);
        assert_eq!((window.start_index(), window.end_index()), (0, 0));
        assert!(!window.has_next());
        assert!(!window.has_previous());
    }
}
