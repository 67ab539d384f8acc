//! Fixed-size pagination over an ordered result list.

use crate::models::{CatalogEntry, PageInfo, PageSize};

/// Slices an ordered list into the requested page.
///
/// The index is clamped into `[0, page_count - 1]`, so out-of-range
/// requests (including negative ones) land on the nearest valid page.
/// An empty list yields one empty page with both navigation flags off.
pub fn paginate(
    entries: &[CatalogEntry],
    page_size: PageSize,
    requested_index: i64,
) -> (Vec<CatalogEntry>, PageInfo) {
    let per_page = page_size.as_usize();
    let page_count = if entries.is_empty() {
        1
    } else {
        entries.len().div_ceil(per_page)
    };

    let page_index = requested_index.clamp(0, page_count as i64 - 1) as usize;
    let start = page_index * per_page;
    let end = (start + per_page).min(entries.len());
    let page = if start < end {
        entries[start..end].to_vec()
    } else {
        Vec::new()
    };

    let info = PageInfo {
        page_index,
        page_count,
        has_prev: page_index > 0,
        has_next: page_index + 1 < page_count,
    };
    (page, info)
}
