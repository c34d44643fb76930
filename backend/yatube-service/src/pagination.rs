//! Page-number pagination for post listings.
//!
//! The `page` query parameter is forgiving: a missing or non-numeric value
//! selects the first page, and a number past the end selects the last one.
//! An empty listing still has one (empty) page.

use serde::ser::{Serialize, SerializeStruct, Serializer};

#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    per_page: usize,
}

impl Paginator {
    pub fn new(per_page: usize) -> Self {
        Self {
            per_page: per_page.max(1),
        }
    }

    /// Resolve the requested page against `count` items.
    pub fn locate(&self, count: i64, page_param: Option<&str>) -> PageWindow {
        let count = count.max(0) as usize;
        let num_pages = count.div_ceil(self.per_page).max(1);

        let number = match page_param.map(str::trim) {
            Some(raw) => match raw.parse::<i64>() {
                Ok(n) => n.clamp(1, num_pages as i64) as usize,
                // too many digits for i64, still a page past the end
                Err(_) if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) => num_pages,
                Err(_) => 1,
            },
            None => 1,
        };

        PageWindow {
            number,
            num_pages,
            count,
            per_page: self.per_page,
        }
    }
}

/// Position of one page within a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: usize,
    pub num_pages: usize,
    pub count: usize,
    pub per_page: usize,
}

impl PageWindow {
    pub fn offset(&self) -> i64 {
        ((self.number - 1) * self.per_page) as i64
    }

    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }
}

/// Items of one page plus its window
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub object_list: Vec<T>,
    pub window: PageWindow,
}

impl<T> Page<T> {
    pub fn new(object_list: Vec<T>, window: PageWindow) -> Self {
        Self {
            object_list,
            window,
        }
    }
}

impl<T: Serialize> Serialize for Page<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let w = &self.window;
        let page_range: Vec<usize> = (1..=w.num_pages).collect();

        let mut state = serializer.serialize_struct("Page", 9)?;
        state.serialize_field("object_list", &self.object_list)?;
        state.serialize_field("number", &w.number)?;
        state.serialize_field("num_pages", &w.num_pages)?;
        state.serialize_field("count", &w.count)?;
        state.serialize_field("has_next", &w.has_next())?;
        state.serialize_field("has_previous", &w.has_previous())?;
        state.serialize_field("next_page_number", &w.has_next().then(|| w.number + 1))?;
        state.serialize_field(
            "previous_page_number",
            &w.has_previous().then(|| w.number - 1),
        )?;
        state.serialize_field("page_range", &page_range)?;
        state.end()
    }
}
