//! Client-side search and pagination over an in-memory record set.

use crate::error::DisplayError;
use serde_json::Value;
use std::fmt;

pub const PAGE_SIZE_PRESETS: [usize; 4] = [10, 25, 50, 100];
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Pages shown without compaction
const MAX_UNCOMPACTED_PAGES: usize = 6;

fn value_contains(value: &Value, needle: &str) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => s.to_lowercase().contains(needle),
        Value::Number(n) => n.to_string().contains(needle),
        Value::Bool(b) => b.to_string().contains(needle),
        Value::Array(items) => items.iter().any(|item| value_contains(item, needle)),
        Value::Object(obj) => obj.values().any(|field| value_contains(field, needle)),
    }
}

/// Case-insensitive substring match against any stringified field.
///
/// The query is used as typed; only the empty query matches everything.
pub fn matches_query(record: &Value, query: &str) -> bool {
    query.is_empty() || value_contains(record, &query.to_lowercase())
}

pub fn filter_records<'a>(records: &'a [Value], query: &str) -> Vec<&'a Value> {
    records
        .iter()
        .filter(|record| matches_query(record, query))
        .collect()
}

pub fn total_pages(total_records: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total_records.div_ceil(page_size)
}

/// Items of 1-based `page`; out-of-range pages yield an empty slice
pub fn page_slice<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    let start = page.saturating_sub(1).saturating_mul(page_size).min(items.len());
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Page(usize),
    Ellipsis,
}

impl fmt::Display for PageItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageItem::Page(page) => write!(f, "{}", page),
            PageItem::Ellipsis => write!(f, "..."),
        }
    }
}

/// Page-number sequence with ellipsis compaction.
///
/// Up to six pages are listed in full. Beyond that the first and last page
/// are always present, with a window of `current - 1 ..= current + 1` in
/// between and an ellipsis wherever the window does not touch an edge.
pub fn page_numbers(total_pages: usize, current: usize) -> Vec<PageItem> {
    if total_pages == 0 {
        return Vec::new();
    }
    if total_pages <= MAX_UNCOMPACTED_PAGES {
        return (1..=total_pages).map(PageItem::Page).collect();
    }

    let current = current.clamp(1, total_pages);
    let window_start = current.saturating_sub(1).max(2);
    let window_end = (current + 1).min(total_pages - 1);

    let mut items = vec![PageItem::Page(1)];
    if window_start > 2 {
        items.push(PageItem::Ellipsis);
    }
    items.extend((window_start..=window_end).map(PageItem::Page));
    if window_end < total_pages - 1 {
        items.push(PageItem::Ellipsis);
    }
    items.push(PageItem::Page(total_pages));
    items
}

/// Page-local list state: free-text query plus page/page-size pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListState {
    query: String,
    page: usize,
    page_size: usize,
}

impl Default for ListState {
    fn default() -> Self {
        Self {
            query: String::new(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ListState {
    pub fn new(page_size: usize) -> Result<Self, DisplayError> {
        let mut state = Self::default();
        state.set_page_size(page_size)?;
        Ok(state)
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// A new query always starts again from page 1
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.page = 1;
    }

    /// Page size must be one of the presets; resets to page 1
    pub fn set_page_size(&mut self, page_size: usize) -> Result<(), DisplayError> {
        if !PAGE_SIZE_PRESETS.contains(&page_size) {
            return Err(DisplayError::Pagination(format!(
                "Page size {} is not one of {:?}",
                page_size, PAGE_SIZE_PRESETS
            )));
        }
        self.page_size = page_size;
        self.page = 1;
        Ok(())
    }

    /// Clamped into `1..=max(total_pages, 1)`
    pub fn set_page(&mut self, page: usize, total_pages: usize) {
        self.page = page.clamp(1, total_pages.max(1));
    }

    pub fn filtered<'a>(&self, records: &'a [Value]) -> Vec<&'a Value> {
        filter_records(records, &self.query)
    }

    pub fn apply<'a>(&self, records: &'a [Value]) -> PageView<'a> {
        let filtered = self.filtered(records);
        let total_records = filtered.len();
        let total_pages = total_pages(total_records, self.page_size);
        let page = self.page.clamp(1, total_pages.max(1));
        let rows = page_slice(&filtered, page, self.page_size).to_vec();

        PageView {
            rows,
            total_records,
            total_pages,
            page,
            page_size: self.page_size,
        }
    }
}

/// The visible slice plus page-count metadata
#[derive(Debug, Clone, PartialEq)]
pub struct PageView<'a> {
    pub rows: Vec<&'a Value>,
    pub total_records: usize,
    pub total_pages: usize,
    pub page: usize,
    pub page_size: usize,
}

impl PageView<'_> {
    pub fn owned_rows(&self) -> Vec<Value> {
        self.rows.iter().map(|row| (*row).clone()).collect()
    }

    pub fn page_numbers(&self) -> Vec<PageItem> {
        page_numbers(self.total_pages, self.page)
    }

    pub fn summary(&self) -> String {
        if self.total_records == 0 {
            return "No records found".to_string();
        }
        let start = (self.page - 1) * self.page_size + 1;
        let end = start + self.rows.len() - 1;
        format!(
            "Showing {}-{} of {} records (Page {} of {})",
            start, end, self.total_records, self.page, self.total_pages
        )
    }

    /// `‹ 1 ... 3 [4] 5 ... 7 ›`
    pub fn render_pager(&self) -> String {
        let items: Vec<String> = self
            .page_numbers()
            .iter()
            .map(|item| match item {
                PageItem::Page(page) if *page == self.page => format!("[{}]", page),
                other => other.to_string(),
            })
            .collect();
        format!("‹ {} ›", items.join(" "))
    }
}
