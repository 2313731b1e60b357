//! Listing filter descriptor.

use std::num::NonZeroU32;

use serde::Deserialize;

use crate::application::pagination::{normalize_page, page_offset};

/// Raw listing parameters as supplied by a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ListingQuery {
    pub category: Option<i32>,
    pub university: Option<i32>,
    pub province: Option<i32>,
    pub name: Option<String>,
    pub page: Option<i64>,
}

/// Normalized, immutable listing filter.
///
/// Zero (or negative) ids mean "no filter" for that dimension, blank searches
/// are dropped, and the page is clamped to at least 1 with its offset derived
/// from the page size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingFilter {
    category_id: Option<i32>,
    university_id: Option<i32>,
    province_id: Option<i32>,
    search: Option<String>,
    page: i64,
    page_size: i64,
    offset: i64,
}

impl ListingFilter {
    pub fn new(query: ListingQuery, page_size: NonZeroU32) -> Self {
        let page_size = i64::from(page_size.get());
        let page = normalize_page(query.page);
        Self {
            category_id: positive_id(query.category),
            university_id: positive_id(query.university),
            province_id: positive_id(query.province),
            search: query.name.and_then(|value| {
                let trimmed = value.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }),
            page,
            page_size,
            offset: page_offset(page, page_size),
        }
    }

    pub fn category_id(&self) -> Option<i32> {
        self.category_id
    }

    pub fn university_id(&self) -> Option<i32> {
        self.university_id
    }

    pub fn province_id(&self) -> Option<i32> {
        self.province_id
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }
}

fn positive_id(value: Option<i32>) -> Option<i32> {
    value.filter(|id| *id > 0)
}
