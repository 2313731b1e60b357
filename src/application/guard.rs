//! Ownership checks gating product mutations.
//!
//! The guard only reads merchant, category and product state. Each check
//! resolves the records it needs and hands them back so the caller does not
//! look them up twice.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::application::actor::Actor;
use crate::application::error::CatalogError;
use crate::application::repos::{CategoriesRepo, MerchantsRepo, ProductLookup, ProductsRepo};
use crate::domain::catalog::{ensure_merchant_active, ensure_owner, ensure_product_category};
use crate::domain::entities::{CategoryRecord, MerchantRecord, ProductAggregate};
use crate::domain::error::DomainError;

const TARGET: &str = "pasar::application::guard";

#[derive(Clone)]
pub struct OwnershipGuard {
    products: Arc<dyn ProductsRepo>,
    merchants: Arc<dyn MerchantsRepo>,
    categories: Arc<dyn CategoriesRepo>,
    category_limit: i32,
}

impl OwnershipGuard {
    pub fn new(
        products: Arc<dyn ProductsRepo>,
        merchants: Arc<dyn MerchantsRepo>,
        categories: Arc<dyn CategoriesRepo>,
        category_limit: i32,
    ) -> Self {
        Self {
            products,
            merchants,
            categories,
            category_limit,
        }
    }

    /// Merchant and category for a new product owned by `actor`.
    pub async fn authorize_create(
        &self,
        actor: &Actor,
        category_id: i32,
    ) -> Result<(MerchantRecord, CategoryRecord), CatalogError> {
        let merchant = self.merchant_for(actor).await?;
        ensure_merchant_active(&merchant).map_err(|err| {
            rejected(actor, &err);
            CatalogError::policy("please verify your merchant", err)
        })?;
        let category = self.authorize_category(category_id).await?;
        Ok((merchant, category))
    }

    /// The product and the actor's merchant, once the merchant is shown to own
    /// the product and to be active.
    pub async fn authorize_mutate(
        &self,
        actor: &Actor,
        product_id: Uuid,
    ) -> Result<(ProductAggregate, MerchantRecord), CatalogError> {
        let product = self
            .products
            .fetch_one(&ProductLookup::by_id(product_id))
            .await
            .map_err(|err| CatalogError::internal("failed to get product", err))?
            .ok_or_else(|| {
                CatalogError::policy("product not found", DomainError::not_found("product"))
            })?;

        let merchant = self.merchant_for(actor).await?;
        ensure_owner(&product.product, &merchant).map_err(|err| {
            rejected(actor, &err);
            CatalogError::policy("can not edit other people merchant", err)
        })?;
        ensure_merchant_active(&merchant).map_err(|err| {
            rejected(actor, &err);
            CatalogError::policy("please verify your merchant", err)
        })?;

        Ok((product, merchant))
    }

    pub async fn authorize_category(&self, category_id: i32) -> Result<CategoryRecord, CatalogError> {
        let category = self
            .categories
            .find_by_id(category_id)
            .await
            .map_err(|err| CatalogError::internal("failed to get category", err))?
            .ok_or_else(|| {
                CatalogError::policy("category not found", DomainError::not_found("category"))
            })?;

        ensure_product_category(category.id, self.category_limit).map_err(|err| {
            info!(target = TARGET, category_id, "category rejected for product");
            CatalogError::policy("can not use this category for product", err)
        })?;

        Ok(category)
    }

    async fn merchant_for(&self, actor: &Actor) -> Result<MerchantRecord, CatalogError> {
        self.merchants
            .find_by_user(actor.user_id)
            .await
            .map_err(|err| CatalogError::internal("failed to get merchant", err))?
            .ok_or_else(|| {
                CatalogError::policy("merchant not found", DomainError::not_found("merchant"))
            })
    }
}

fn rejected(actor: &Actor, err: &DomainError) {
    info!(
        target = TARGET,
        user_id = %actor.user_id,
        reason = %err,
        "mutation rejected"
    );
}
