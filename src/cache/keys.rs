//! Cache key encoding.
//!
//! Listing keys are `products:<version>:<json>`, where the JSON object has a
//! fixed field order. Changing the payload shape requires a new version so
//! entries written under the old encoding are never read back.

use std::fmt;

use serde::Serialize;

use crate::application::listing::ListingFilter;

pub const LISTING_KEY_VERSION: &str = "v1";
const LISTING_KEY_PREFIX: &str = "products";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn listing(filter: &ListingFilter) -> Result<Self, serde_json::Error> {
        let payload = ListingKeyPayload {
            category_id: filter.category_id(),
            university_id: filter.university_id(),
            province_id: filter.province_id(),
            search: filter.search(),
            page: filter.page(),
            page_size: filter.page_size(),
            offset: filter.offset(),
        };
        let encoded = serde_json::to_string(&payload)?;
        Ok(Self(format!(
            "{LISTING_KEY_PREFIX}:{LISTING_KEY_VERSION}:{encoded}"
        )))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Field order here is the key's wire order.
#[derive(Serialize)]
struct ListingKeyPayload<'a> {
    category_id: Option<i32>,
    university_id: Option<i32>,
    province_id: Option<i32>,
    search: Option<&'a str>,
    page: i64,
    page_size: i64,
    offset: i64,
}
