//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::application::listing::ListingFilter;
use crate::domain::entities::{
    CategoryRecord, MerchantRecord, ProductAggregate, ProductRecord, SessionRecord,
};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Equality lookup for a single product. Unset fields are not constrained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProductLookup {
    pub id: Option<Uuid>,
    pub merchant_id: Option<Uuid>,
    pub category_id: Option<i32>,
}

impl ProductLookup {
    pub fn by_id(id: Uuid) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateProductParams {
    pub id: Uuid,
    pub merchant_id: Uuid,
    pub category_id: i32,
    pub name: String,
    pub price: u64,
    pub description: String,
}

/// Partial product update. Only set, non-empty and non-zero fields are
/// written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub category_id: Option<i32>,
    pub price: Option<u64>,
    pub description: Option<String>,
    pub photo_url: Option<String>,
}

impl ProductPatch {
    pub fn photo(url: impl Into<String>) -> Self {
        Self {
            photo_url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Drop fields that carry their zero value.
    pub fn normalized(self) -> Self {
        fn text(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.trim().is_empty())
        }

        Self {
            name: text(self.name),
            category_id: self.category_id.filter(|id| *id != 0),
            price: self.price.filter(|price| *price != 0),
            description: text(self.description),
            photo_url: text(self.photo_url),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.category_id.is_none()
            && self.price.is_none()
            && self.description.is_none()
            && self.photo_url.is_none()
    }
}

#[async_trait]
pub trait ProductsRepo: Send + Sync {
    async fn fetch_one(&self, lookup: &ProductLookup)
    -> Result<Option<ProductAggregate>, RepoError>;

    async fn fetch_many(&self, filter: &ListingFilter) -> Result<Vec<ProductAggregate>, RepoError>;

    /// Total number of products, ignoring any listing filter.
    async fn count(&self) -> Result<u64, RepoError>;
}

#[async_trait]
pub trait ProductsWriteRepo: Send + Sync {
    async fn create_product(&self, params: CreateProductParams)
    -> Result<ProductRecord, RepoError>;

    /// Apply `patch` to the product and bump its `updated_at`. An empty patch
    /// is a no-op.
    async fn update_product(&self, id: Uuid, patch: &ProductPatch) -> Result<(), RepoError>;
}

#[async_trait]
pub trait MerchantsRepo: Send + Sync {
    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<MerchantRecord>, RepoError>;
}

#[async_trait]
pub trait CategoriesRepo: Send + Sync {
    async fn find_by_id(&self, id: i32) -> Result<Option<CategoryRecord>, RepoError>;
}

#[async_trait]
pub trait SessionsRepo: Send + Sync {
    async fn find_by_token_hash(&self, hash: &[u8]) -> Result<Option<SessionRecord>, RepoError>;
}
