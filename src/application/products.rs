//! Product mutations on behalf of a merchant.

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use serde::Deserialize;
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::actor::Actor;
use crate::application::error::CatalogError;
use crate::application::guard::OwnershipGuard;
use crate::application::repos::{
    CreateProductParams, ProductLookup, ProductPatch, ProductsRepo, ProductsWriteRepo,
};
use crate::application::storage::{ObjectStorage, PhotoObject};
use crate::domain::catalog::{ensure_price, photo_object_name};
use crate::domain::error::DomainError;
use crate::presentation::views::OwnerView;

const TARGET: &str = "pasar::application::products";

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProductCommand {
    pub name: String,
    pub price: u64,
    pub description: String,
    pub category: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProductCommand {
    pub name: Option<String>,
    pub price: Option<u64>,
    pub description: Option<String>,
    pub category: Option<i32>,
}

impl From<UpdateProductCommand> for ProductPatch {
    fn from(cmd: UpdateProductCommand) -> Self {
        ProductPatch {
            name: cmd.name,
            category_id: cmd.category,
            price: cmd.price,
            description: cmd.description,
            photo_url: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

#[derive(Clone)]
pub struct ProductCommandService {
    reader: Arc<dyn ProductsRepo>,
    writer: Arc<dyn ProductsWriteRepo>,
    storage: Arc<dyn ObjectStorage>,
    guard: OwnershipGuard,
}

impl ProductCommandService {
    pub fn new(
        reader: Arc<dyn ProductsRepo>,
        writer: Arc<dyn ProductsWriteRepo>,
        storage: Arc<dyn ObjectStorage>,
        guard: OwnershipGuard,
    ) -> Self {
        Self {
            reader,
            writer,
            storage,
            guard,
        }
    }

    pub async fn create_product(
        &self,
        actor: &Actor,
        cmd: CreateProductCommand,
    ) -> Result<OwnerView, CatalogError> {
        let name = required(&cmd.name, "name")?;
        let description = required(&cmd.description, "description")?;
        valid_price(cmd.price)?;

        let (merchant, category) = self.guard.authorize_create(actor, cmd.category).await?;

        let record = self
            .writer
            .create_product(CreateProductParams {
                id: Uuid::new_v4(),
                merchant_id: merchant.id,
                category_id: category.id,
                name,
                price: cmd.price,
                description,
            })
            .await
            .map_err(|err| CatalogError::internal("failed to create product", err))?;

        info!(
            target = TARGET,
            product_id = %record.id,
            merchant_id = %merchant.id,
            "product created"
        );

        self.owner_view(record.id).await
    }

    pub async fn update_product(
        &self,
        actor: &Actor,
        product_id: Uuid,
        cmd: UpdateProductCommand,
    ) -> Result<OwnerView, CatalogError> {
        let patch = ProductPatch::from(cmd).normalized();
        if let Some(price) = patch.price {
            valid_price(price)?;
        }

        self.guard.authorize_mutate(actor, product_id).await?;
        if let Some(category_id) = patch.category_id {
            self.guard.authorize_category(category_id).await?;
        }

        self.writer
            .update_product(product_id, &patch)
            .await
            .map_err(|err| CatalogError::internal("failed to update product", err))?;

        info!(target = TARGET, product_id = %product_id, "product updated");

        self.owner_view(product_id).await
    }

    pub async fn upload_photo(
        &self,
        actor: &Actor,
        product_id: Uuid,
        upload: PhotoUpload,
    ) -> Result<OwnerView, CatalogError> {
        if upload.data.is_empty() {
            return Err(CatalogError::policy(
                "product photo is empty",
                DomainError::validation("photo payload must not be empty"),
            ));
        }

        let object = PhotoObject {
            name: photo_object_name(base_name(&upload.file_name), OffsetDateTime::now_utc()),
            content_type: upload.content_type,
            data: upload.data,
        };
        object.ensure_content_type().map_err(|err| {
            CatalogError::bad_request("product photo type does not match its file name", err)
        })?;

        let (product, _) = self.guard.authorize_mutate(actor, product_id).await?;

        if product.product.has_photo() {
            self.storage
                .delete(&product.product.photo_url)
                .await
                .map_err(|err| {
                    warn!(
                        target = TARGET,
                        product_id = %product_id,
                        error = %err,
                        "failed to delete previous photo"
                    );
                    CatalogError::internal("failed to delete old photo", err)
                })?;
        }

        let url = self
            .storage
            .upload(object)
            .await
            .map_err(|err| CatalogError::internal("failed to upload photo", err))?;

        self.writer
            .update_product(product_id, &ProductPatch::photo(url))
            .await
            .map_err(|err| CatalogError::internal("failed to update product photo", err))?;

        info!(target = TARGET, product_id = %product_id, "product photo replaced");

        self.owner_view(product_id).await
    }

    async fn owner_view(&self, id: Uuid) -> Result<OwnerView, CatalogError> {
        let product = self
            .reader
            .fetch_one(&ProductLookup::by_id(id))
            .await
            .map_err(|err| CatalogError::internal("failed to get product", err))?
            .ok_or_else(|| {
                CatalogError::policy("product not found", DomainError::not_found("product"))
            })?;
        Ok(OwnerView::from(&product))
    }
}

fn required(value: &str, field: &'static str) -> Result<String, CatalogError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CatalogError::policy(
            format!("{field} is required"),
            DomainError::validation(format!("{field} must not be empty")),
        ));
    }
    Ok(trimmed.to_string())
}

fn valid_price(price: u64) -> Result<(), CatalogError> {
    ensure_price(price).map_err(|err| CatalogError::policy("price is out of range", err))
}

// Clients may send a full path as the file name; only the last segment is kept.
fn base_name(file_name: &str) -> &str {
    Path::new(file_name)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::application::error::ErrorKind;
    use crate::application::listing::ListingFilter;
    use crate::application::repos::{CategoriesRepo, MerchantsRepo, RepoError};
    use crate::application::storage::StorageError;
    use crate::domain::entities::{
        CategoryRecord, MerchantRecord, ProductAggregate, ProductRecord, ProvinceRecord,
        UniversityRecord,
    };

    #[derive(Default)]
    struct Store {
        merchants: Vec<MerchantRecord>,
        products: Mutex<Vec<ProductRecord>>,
    }

    impl Store {
        fn aggregate(&self, product: ProductRecord) -> Option<ProductAggregate> {
            let merchant = self
                .merchants
                .iter()
                .find(|m| m.id == product.merchant_id)?
                .clone();
            Some(ProductAggregate {
                category: CategoryRecord {
                    id: product.category_id,
                    name: format!("Kategori {}", product.category_id),
                },
                university: UniversityRecord {
                    id: merchant.university_id,
                    name: "ITB".into(),
                },
                province: ProvinceRecord {
                    id: merchant.province_id,
                    name: "Jawa Barat".into(),
                },
                merchant,
                product,
            })
        }
    }

    #[async_trait]
    impl ProductsRepo for Store {
        async fn fetch_one(
            &self,
            lookup: &ProductLookup,
        ) -> Result<Option<ProductAggregate>, RepoError> {
            let found = self
                .products
                .lock()
                .unwrap()
                .iter()
                .find(|p| Some(p.id) == lookup.id)
                .cloned();
            Ok(found.and_then(|p| self.aggregate(p)))
        }

        async fn fetch_many(
            &self,
            _filter: &ListingFilter,
        ) -> Result<Vec<ProductAggregate>, RepoError> {
            unreachable!("not used in these tests")
        }

        async fn count(&self) -> Result<u64, RepoError> {
            Ok(self.products.lock().unwrap().len() as u64)
        }
    }

    #[async_trait]
    impl ProductsWriteRepo for Store {
        async fn create_product(
            &self,
            params: CreateProductParams,
        ) -> Result<ProductRecord, RepoError> {
            let now = OffsetDateTime::now_utc();
            let record = ProductRecord {
                id: params.id,
                merchant_id: params.merchant_id,
                category_id: params.category_id,
                name: params.name,
                price: params.price,
                description: params.description,
                photo_url: String::new(),
                created_at: now,
                updated_at: now,
            };
            self.products.lock().unwrap().push(record.clone());
            Ok(record)
        }

        async fn update_product(&self, id: Uuid, patch: &ProductPatch) -> Result<(), RepoError> {
            let mut products = self.products.lock().unwrap();
            let product = products
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or(RepoError::NotFound)?;
            if let Some(name) = &patch.name {
                product.name = name.clone();
            }
            if let Some(category_id) = patch.category_id {
                product.category_id = category_id;
            }
            if let Some(price) = patch.price {
                product.price = price;
            }
            if let Some(description) = &patch.description {
                product.description = description.clone();
            }
            if let Some(photo_url) = &patch.photo_url {
                product.photo_url = photo_url.clone();
            }
            Ok(())
        }
    }

    #[async_trait]
    impl MerchantsRepo for Store {
        async fn find_by_user(&self, user_id: Uuid) -> Result<Option<MerchantRecord>, RepoError> {
            Ok(self.merchants.iter().find(|m| m.user_id == user_id).cloned())
        }
    }

    struct Categories;

    #[async_trait]
    impl CategoriesRepo for Categories {
        async fn find_by_id(&self, id: i32) -> Result<Option<CategoryRecord>, RepoError> {
            Ok((1..=8).contains(&id).then(|| CategoryRecord {
                id,
                name: format!("Kategori {id}"),
            }))
        }
    }

    #[derive(Default)]
    struct RecordingStorage {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ObjectStorage for RecordingStorage {
        async fn upload(&self, object: PhotoObject) -> Result<String, StorageError> {
            let url = format!("http://cdn.test/{}", object.name);
            self.calls.lock().unwrap().push(format!("upload {}", object.name));
            Ok(url)
        }

        async fn delete(&self, reference: &str) -> Result<(), StorageError> {
            self.calls.lock().unwrap().push(format!("delete {reference}"));
            Ok(())
        }
    }

    fn merchant(active: bool) -> MerchantRecord {
        let now = OffsetDateTime::now_utc();
        MerchantRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Warung".into(),
            university_id: 1,
            faculty: "SBM".into(),
            province_id: 1,
            city: "Bandung".into(),
            phone_number: "0813".into(),
            instagram: "warung".into(),
            is_active: active,
            created_at: now,
            updated_at: now,
        }
    }

    fn setup(merchants: Vec<MerchantRecord>) -> (ProductCommandService, Arc<RecordingStorage>) {
        let store = Arc::new(Store {
            merchants,
            ..Store::default()
        });
        let storage = Arc::new(RecordingStorage::default());
        let guard = OwnershipGuard::new(store.clone(), store.clone(), Arc::new(Categories), 6);
        let service = ProductCommandService::new(store.clone(), store, storage.clone(), guard);
        (service, storage)
    }

    fn create_cmd(category: i32) -> CreateProductCommand {
        CreateProductCommand {
            name: "Jaket himpunan".into(),
            price: 150_000,
            description: "Ukuran L".into(),
            category,
        }
    }

    fn photo(name: &str) -> PhotoUpload {
        PhotoUpload {
            file_name: name.into(),
            content_type: "image/png".into(),
            data: Bytes::from_static(b"\x89PNG"),
        }
    }

    #[tokio::test]
    async fn create_returns_owner_view_of_stored_product() {
        let owner = merchant(true);
        let actor = Actor::new(owner.user_id);
        let (service, _) = setup(vec![owner]);

        let view = service
            .create_product(&actor, create_cmd(3))
            .await
            .expect("created");
        assert_eq!(view.category, "Kategori 3");
        assert_eq!(view.price, 150_000);
        assert!(view.photo.is_empty());
    }

    #[tokio::test]
    async fn create_rejects_blank_name() {
        let owner = merchant(true);
        let actor = Actor::new(owner.user_id);
        let (service, _) = setup(vec![owner]);

        let mut cmd = create_cmd(3);
        cmd.name = "  ".into();
        let err = service.create_product(&actor, cmd).await.expect_err("blank");
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }

    #[tokio::test]
    async fn prices_beyond_store_range_are_bad_requests() {
        let owner = merchant(true);
        let actor = Actor::new(owner.user_id);
        let (service, _) = setup(vec![owner]);

        let mut cmd = create_cmd(3);
        cmd.price = u64::MAX;
        let err = service
            .create_product(&actor, cmd)
            .await
            .expect_err("create with huge price");
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert_eq!(err.message(), "price is out of range");

        let created = service
            .create_product(&actor, create_cmd(3))
            .await
            .expect("created");
        let err = service
            .update_product(
                &actor,
                created.id,
                UpdateProductCommand {
                    price: Some(i64::MAX as u64 + 1),
                    ..UpdateProductCommand::default()
                },
            )
            .await
            .expect_err("update with huge price");
        assert_eq!(err.kind(), ErrorKind::BadRequest);

        let stored = service.owner_view(created.id).await.expect("stored");
        assert_eq!(stored.price, 150_000);
    }

    #[tokio::test]
    async fn update_applies_only_supplied_fields() {
        let owner = merchant(true);
        let actor = Actor::new(owner.user_id);
        let (service, _) = setup(vec![owner]);
        let created = service
            .create_product(&actor, create_cmd(3))
            .await
            .expect("created");

        let view = service
            .update_product(
                &actor,
                created.id,
                UpdateProductCommand {
                    price: Some(120_000),
                    name: Some(String::new()),
                    ..UpdateProductCommand::default()
                },
            )
            .await
            .expect("updated");
        assert_eq!(view.price, 120_000);
        assert_eq!(view.name, "Jaket himpunan");
    }

    #[tokio::test]
    async fn update_rejects_reserved_category() {
        let owner = merchant(true);
        let actor = Actor::new(owner.user_id);
        let (service, _) = setup(vec![owner]);
        let created = service
            .create_product(&actor, create_cmd(3))
            .await
            .expect("created");

        let err = service
            .update_product(
                &actor,
                created.id,
                UpdateProductCommand {
                    category: Some(8),
                    ..UpdateProductCommand::default()
                },
            )
            .await
            .expect_err("reserved");
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }

    #[tokio::test]
    async fn replacing_photo_deletes_old_reference_first() {
        let owner = merchant(true);
        let actor = Actor::new(owner.user_id);
        let (service, storage) = setup(vec![owner]);
        let created = service
            .create_product(&actor, create_cmd(3))
            .await
            .expect("created");

        let first = service
            .upload_photo(&actor, created.id, photo("a.png"))
            .await
            .expect("first upload");
        service
            .upload_photo(&actor, created.id, photo("dir/b c.png"))
            .await
            .expect("second upload");

        let calls = storage.calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 3);
        assert!(calls[0].starts_with("upload ") && calls[0].ends_with("-a.png"));
        assert_eq!(calls[1], format!("delete {}", first.photo));
        assert!(calls[2].ends_with("-b-c.png"));
    }

    #[tokio::test]
    async fn mislabelled_photo_keeps_the_current_one() {
        let owner = merchant(true);
        let actor = Actor::new(owner.user_id);
        let (service, storage) = setup(vec![owner]);
        let created = service
            .create_product(&actor, create_cmd(3))
            .await
            .expect("created");
        service
            .upload_photo(&actor, created.id, photo("a.png"))
            .await
            .expect("first upload");

        let mut upload = photo("b.jpg");
        upload.content_type = "image/png".into();
        let err = service
            .upload_photo(&actor, created.id, upload)
            .await
            .expect_err("mismatched type");

        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert_eq!(storage.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_photo_is_rejected() {
        let owner = merchant(true);
        let actor = Actor::new(owner.user_id);
        let (service, _) = setup(vec![owner]);

        let mut upload = photo("a.png");
        upload.data = Bytes::new();
        let err = service
            .upload_photo(&actor, Uuid::new_v4(), upload)
            .await
            .expect_err("empty");
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }
}
