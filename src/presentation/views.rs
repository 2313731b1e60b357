//! JSON view models returned by the catalog services.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::catalog::PhoneFormat;
use crate::domain::entities::ProductAggregate;

/// One row of a product listing page. This is the shape stored in the
/// listing cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingItemView {
    pub id: Uuid,
    pub name: String,
    pub merchant_name: String,
    pub university: String,
    pub price: u64,
    #[serde(rename = "product_photo")]
    pub photo: String,
}

impl From<&ProductAggregate> for ListingItemView {
    fn from(agg: &ProductAggregate) -> Self {
        Self {
            id: agg.product.id,
            name: agg.product.name.clone(),
            merchant_name: agg.merchant.name.clone(),
            university: agg.university.name.clone(),
            price: agg.product.price,
            photo: agg.product.photo_url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingView {
    pub page: i64,
    pub total_pages: u64,
    pub products: Vec<ListingItemView>,
}

/// Public product page, including how to reach the merchant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailView {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub merchant_name: String,
    pub university: String,
    pub faculty: String,
    pub province: String,
    pub city: String,
    pub price: u64,
    #[serde(rename = "product_photo")]
    pub photo: String,
    pub whatsapp: String,
    pub instagram: String,
}

impl DetailView {
    pub fn from_aggregate(agg: &ProductAggregate, phone: &PhoneFormat) -> Self {
        Self {
            id: agg.product.id,
            name: agg.product.name.clone(),
            description: agg.product.description.clone(),
            merchant_name: agg.merchant.name.clone(),
            university: agg.university.name.clone(),
            faculty: agg.merchant.faculty.clone(),
            province: agg.province.name.clone(),
            city: agg.merchant.city.clone(),
            price: agg.product.price,
            photo: agg.product.photo_url.clone(),
            whatsapp: phone.whatsapp_link(&agg.merchant.phone_number),
            instagram: agg.merchant.instagram.clone(),
        }
    }
}

/// What the owning merchant sees: no contact or location details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerView {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: u64,
    #[serde(rename = "product_photo")]
    pub photo: String,
}

impl From<&ProductAggregate> for OwnerView {
    fn from(agg: &ProductAggregate) -> Self {
        Self {
            id: agg.product.id,
            name: agg.product.name.clone(),
            description: agg.product.description.clone(),
            category: agg.category.name.clone(),
            price: agg.product.price,
            photo: agg.product.photo_url.clone(),
        }
    }
}
