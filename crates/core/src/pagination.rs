//! Offset pagination arithmetic shared by the gallery.

use serde::Serialize;

/// Page size used by the gallery unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: u32 = 12;

/// `limit`/`offset` query parameters for one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageWindow {
    pub limit: u32,
    pub offset: u64,
}

impl PageWindow {
    /// Window for a zero-based page index: `offset = page_index * page_size`.
    pub fn for_page(page_index: u32, page_size: u32) -> Self {
        Self {
            limit: page_size,
            offset: u64::from(page_index) * u64::from(page_size),
        }
    }
}

/// A page is full (more may follow) only when it returned exactly `page_size` items.
pub fn has_more(returned: usize, page_size: u32) -> bool {
    returned == page_size as usize
}

/// Page index reached by "next", if allowed.
pub fn next_index(current: u32, has_more: bool) -> Option<u32> {
    has_more.then(|| current.saturating_add(1))
}

/// Page index reached by "previous", floored at 0.
pub fn previous_index(current: u32) -> u32 {
    current.saturating_sub(1)
}
