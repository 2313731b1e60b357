use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("domain entity `{entity}` not found")]
    NotFound { entity: &'static str },
    #[error("merchant is not verified")]
    MerchantNotVerified,
    #[error("category {category_id} is reserved for information posts (product categories end at {limit})")]
    ReservedCategory { category_id: i32, limit: i32 },
    #[error("product belongs to another merchant")]
    NotOwner,
    #[error("requested page {requested} is beyond the last page {last}")]
    PageOutOfRange { requested: i64, last: i64 },
    #[error("domain validation failed: {message}")]
    Validation { message: String },
}

impl DomainError {
    pub fn not_found(entity: &'static str) -> Self {
        Self::NotFound { entity }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}
