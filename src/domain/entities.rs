//! Domain entities mirrored from persistent storage.

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRecord {
    pub id: Uuid,
    pub merchant_id: Uuid,
    pub category_id: i32,
    pub name: String,
    pub price: u64,
    pub description: String,
    /// Empty until a photo has been uploaded.
    pub photo_url: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl ProductRecord {
    pub fn has_photo(&self) -> bool {
        !self.photo_url.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MerchantRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub university_id: i32,
    pub faculty: String,
    pub province_id: i32,
    pub city: String,
    pub phone_number: String,
    pub instagram: String,
    pub is_active: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryRecord {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UniversityRecord {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvinceRecord {
    pub id: i32,
    pub name: String,
}

/// A product with its merchant (and the merchant's university and province)
/// plus its category resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductAggregate {
    pub product: ProductRecord,
    pub category: CategoryRecord,
    pub merchant: MerchantRecord,
    pub university: UniversityRecord,
    pub province: ProvinceRecord,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub user_id: Uuid,
    pub token_hash: Vec<u8>,
    pub expires_at: OffsetDateTime,
}
