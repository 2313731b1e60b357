//! Offset pagination helpers for catalog listings.

use crate::domain::error::DomainError;

/// Pages are 1-based; anything below 1 is treated as the first page.
pub fn normalize_page(page: Option<i64>) -> i64 {
    match page {
        Some(page) if page > 0 => page,
        _ => 1,
    }
}

pub fn page_offset(page: i64, page_size: i64) -> i64 {
    page.saturating_sub(1).saturating_mul(page_size)
}

/// Number of pages needed for `total` rows, i.e. `ceil(total / page_size)`.
pub fn total_pages(total: u64, page_size: u64) -> u64 {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size)
}

/// Highest page that may be requested. An empty catalog still has a first
/// (empty) page.
pub fn last_page(total: u64, page_size: u64) -> i64 {
    let pages = total_pages(total, page_size).max(1);
    i64::try_from(pages).unwrap_or(i64::MAX)
}

pub fn ensure_page_in_range(page: i64, total: u64, page_size: u64) -> Result<(), DomainError> {
    let last = last_page(total, page_size);
    if page > last {
        return Err(DomainError::PageOutOfRange {
            requested: page,
            last,
        });
    }
    Ok(())
}
