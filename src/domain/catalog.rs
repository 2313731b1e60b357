//! Catalog policy rules shared by the query and command services.

use time::OffsetDateTime;

use crate::domain::entities::{MerchantRecord, ProductRecord};
use crate::domain::error::DomainError;

/// Highest category id that may be attached to a product. Ids above it belong
/// to information posts.
pub const DEFAULT_PRODUCT_CATEGORY_LIMIT: i32 = 6;

/// Largest price the store can hold (a signed 64-bit column).
pub const MAX_PRICE: u64 = i64::MAX as u64;

const WHATSAPP_BASE: &str = "https://wa.me/";

pub fn ensure_product_category(category_id: i32, limit: i32) -> Result<(), DomainError> {
    if category_id > limit {
        return Err(DomainError::ReservedCategory { category_id, limit });
    }
    Ok(())
}

pub fn ensure_merchant_active(merchant: &MerchantRecord) -> Result<(), DomainError> {
    if !merchant.is_active {
        return Err(DomainError::MerchantNotVerified);
    }
    Ok(())
}

pub fn ensure_owner(product: &ProductRecord, merchant: &MerchantRecord) -> Result<(), DomainError> {
    if product.merchant_id != merchant.id {
        return Err(DomainError::NotOwner);
    }
    Ok(())
}

pub fn ensure_price(price: u64) -> Result<(), DomainError> {
    if price > MAX_PRICE {
        return Err(DomainError::validation(format!(
            "price must not exceed {MAX_PRICE}"
        )));
    }
    Ok(())
}

/// How local phone numbers are rewritten into international form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneFormat {
    pub trunk_prefix: String,
    pub country_code: String,
}

impl Default for PhoneFormat {
    fn default() -> Self {
        Self {
            trunk_prefix: "0".to_string(),
            country_code: "+62".to_string(),
        }
    }
}

impl PhoneFormat {
    /// Replace a leading trunk prefix with the country code. Numbers without
    /// the prefix are kept as they are.
    pub fn international(&self, phone: &str) -> String {
        let phone = phone.trim();
        match phone.strip_prefix(self.trunk_prefix.as_str()) {
            Some(rest) if !self.trunk_prefix.is_empty() => format!("{}{rest}", self.country_code),
            _ => phone.to_string(),
        }
    }

    pub fn whatsapp_link(&self, phone: &str) -> String {
        format!("{WHATSAPP_BASE}{}", self.international(phone))
    }
}

/// Name under which an uploaded photo is stored: a timestamp prefix keeps
/// names unique, and spaces (like any other character that is not URL-safe)
/// become hyphens.
pub fn photo_object_name(original: &str, at: OffsetDateTime) -> String {
    let original = original.trim();
    let original = if original.is_empty() { "photo" } else { original };
    let safe: String = original
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '_') {
                ch
            } else {
                '-'
            }
        })
        .collect();
    format!("{}-{safe}", at.unix_timestamp_nanos())
}
