//! In-memory catalog store and service wiring shared by the integration suites.

#![allow(dead_code)]

use std::num::NonZeroU32;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use time::OffsetDateTime;
use url::Url;
use uuid::Uuid;

use pasar::application::actor::{Actor, ActorResolver, SessionActorResolver};
use pasar::application::catalog::{CatalogOptions, CatalogQueryService};
use pasar::application::guard::OwnershipGuard;
use pasar::application::listing::ListingFilter;
use pasar::application::products::ProductCommandService;
use pasar::application::repos::{
    CategoriesRepo, CreateProductParams, MerchantsRepo, ProductLookup, ProductPatch, ProductsRepo,
    ProductsWriteRepo, RepoError, SessionsRepo,
};
use pasar::cache::{CacheConfig, MemoryCacheStore};
use pasar::domain::catalog::{DEFAULT_PRODUCT_CATEGORY_LIMIT, PhoneFormat};
use pasar::domain::entities::{
    CategoryRecord, MerchantRecord, ProductAggregate, ProductRecord, ProvinceRecord,
    SessionRecord, UniversityRecord,
};
use pasar::infra::http::{ApiState, StoreHealth};
use pasar::infra::uploads::FilesystemStorage;

pub const LISTING_TTL: Duration = Duration::from_secs(300);
pub const PUBLIC_BASE: &str = "http://127.0.0.1:3000/uploads/";
/// Seeded category above the product category limit.
pub const SERVICE_CATEGORY: i32 = 7;

#[derive(Default)]
struct Tables {
    products: Vec<ProductRecord>,
    merchants: Vec<MerchantRecord>,
    categories: Vec<CategoryRecord>,
    universities: Vec<UniversityRecord>,
    provinces: Vec<ProvinceRecord>,
    sessions: Vec<SessionRecord>,
}

/// Catalog tables kept in memory behind the repository traits.
pub struct MemoryStore {
    tables: Mutex<Tables>,
    clock: Mutex<OffsetDateTime>,
}

impl MemoryStore {
    pub fn seeded() -> Self {
        let tables = Tables {
            categories: [
                "Buku",
                "Elektronik",
                "Fashion",
                "Makanan",
                "Perabot",
                "Olahraga",
                "Jasa",
            ]
            .iter()
            .enumerate()
            .map(|(idx, name)| CategoryRecord {
                id: idx as i32 + 1,
                name: (*name).to_string(),
            })
            .collect(),
            universities: vec![
                UniversityRecord {
                    id: 1,
                    name: "UGM".into(),
                },
                UniversityRecord {
                    id: 2,
                    name: "ITB".into(),
                },
            ],
            provinces: vec![
                ProvinceRecord {
                    id: 1,
                    name: "DI Yogyakarta".into(),
                },
                ProvinceRecord {
                    id: 2,
                    name: "Jawa Barat".into(),
                },
            ],
            ..Tables::default()
        };

        Self {
            tables: Mutex::new(tables),
            clock: Mutex::new(OffsetDateTime::now_utc()),
        }
    }

    /// Monotonic timestamps so newest-first ordering is deterministic.
    fn tick(&self) -> OffsetDateTime {
        let mut clock = self.clock.lock().unwrap();
        *clock += time::Duration::seconds(1);
        *clock
    }

    pub fn add_merchant(&self, name: &str, university_id: i32, active: bool) -> MerchantRecord {
        self.add_merchant_in(name, university_id, university_id, active)
    }

    pub fn add_merchant_in(
        &self,
        name: &str,
        university_id: i32,
        province_id: i32,
        active: bool,
    ) -> MerchantRecord {
        let now = self.tick();
        let merchant = MerchantRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: name.to_string(),
            university_id,
            faculty: "Teknik".into(),
            province_id,
            city: "Yogyakarta".into(),
            phone_number: "081234567890".into(),
            instagram: format!("{}_ig", name.to_lowercase().replace(' ', "_")),
            is_active: active,
            created_at: now,
            updated_at: now,
        };
        self.tables.lock().unwrap().merchants.push(merchant.clone());
        merchant
    }

    pub fn add_product(&self, merchant: &MerchantRecord, category_id: i32, name: &str) -> Uuid {
        let now = self.tick();
        let product = ProductRecord {
            id: Uuid::new_v4(),
            merchant_id: merchant.id,
            category_id,
            name: name.to_string(),
            price: 25_000,
            description: format!("{name} bekas pakai"),
            photo_url: String::new(),
            created_at: now,
            updated_at: now,
        };
        let id = product.id;
        self.tables.lock().unwrap().products.push(product);
        id
    }

    /// Issue a bearer token for the merchant's user.
    pub fn add_session(&self, merchant: &MerchantRecord, ttl: time::Duration) -> String {
        let token = format!("token-{}", Uuid::new_v4());
        self.tables.lock().unwrap().sessions.push(SessionRecord {
            user_id: merchant.user_id,
            token_hash: SessionActorResolver::hash_token(&token),
            expires_at: OffsetDateTime::now_utc() + ttl,
        });
        token
    }

    pub fn product(&self, id: Uuid) -> Option<ProductRecord> {
        self.tables
            .lock()
            .unwrap()
            .products
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    pub fn product_count(&self) -> usize {
        self.tables.lock().unwrap().products.len()
    }

    fn aggregate(tables: &Tables, product: &ProductRecord) -> Option<ProductAggregate> {
        let merchant = tables
            .merchants
            .iter()
            .find(|m| m.id == product.merchant_id)?;
        Some(ProductAggregate {
            category: tables
                .categories
                .iter()
                .find(|c| c.id == product.category_id)?
                .clone(),
            university: tables
                .universities
                .iter()
                .find(|u| u.id == merchant.university_id)?
                .clone(),
            province: tables
                .provinces
                .iter()
                .find(|p| p.id == merchant.province_id)?
                .clone(),
            merchant: merchant.clone(),
            product: product.clone(),
        })
    }
}

#[async_trait]
impl ProductsRepo for MemoryStore {
    async fn fetch_one(
        &self,
        lookup: &ProductLookup,
    ) -> Result<Option<ProductAggregate>, RepoError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .products
            .iter()
            .filter(|p| lookup.id.is_none_or(|id| p.id == id))
            .filter(|p| lookup.merchant_id.is_none_or(|id| p.merchant_id == id))
            .filter(|p| lookup.category_id.is_none_or(|id| p.category_id == id))
            .find_map(|p| Self::aggregate(&tables, p)))
    }

    async fn fetch_many(&self, filter: &ListingFilter) -> Result<Vec<ProductAggregate>, RepoError> {
        let tables = self.tables.lock().unwrap();
        let search = filter.search().map(str::to_lowercase);
        let mut rows: Vec<ProductAggregate> = tables
            .products
            .iter()
            .filter_map(|p| Self::aggregate(&tables, p))
            .filter(|agg| {
                filter
                    .category_id()
                    .is_none_or(|id| agg.product.category_id == id)
            })
            .filter(|agg| {
                filter
                    .university_id()
                    .is_none_or(|id| agg.merchant.university_id == id)
            })
            .filter(|agg| {
                filter
                    .province_id()
                    .is_none_or(|id| agg.merchant.province_id == id)
            })
            .filter(|agg| {
                search
                    .as_deref()
                    .is_none_or(|needle| agg.product.name.to_lowercase().contains(needle))
            })
            .collect();
        rows.sort_by(|a, b| {
            b.product
                .created_at
                .cmp(&a.product.created_at)
                .then(a.product.id.cmp(&b.product.id))
        });

        let offset = usize::try_from(filter.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(filter.page_size()).unwrap_or(0);
        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }

    async fn count(&self) -> Result<u64, RepoError> {
        Ok(self.tables.lock().unwrap().products.len() as u64)
    }
}

#[async_trait]
impl ProductsWriteRepo for MemoryStore {
    async fn create_product(&self, params: CreateProductParams) -> Result<ProductRecord, RepoError> {
        let now = self.tick();
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
        self.tables.lock().unwrap().products.push(record.clone());
        Ok(record)
    }

    async fn update_product(&self, id: Uuid, patch: &ProductPatch) -> Result<(), RepoError> {
        let now = self.tick();
        let mut tables = self.tables.lock().unwrap();
        let product = tables
            .products
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
        product.updated_at = now;
        Ok(())
    }
}

#[async_trait]
impl MerchantsRepo for MemoryStore {
    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<MerchantRecord>, RepoError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .merchants
            .iter()
            .find(|m| m.user_id == user_id)
            .cloned())
    }
}

#[async_trait]
impl CategoriesRepo for MemoryStore {
    async fn find_by_id(&self, id: i32) -> Result<Option<CategoryRecord>, RepoError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .categories
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }
}

#[async_trait]
impl SessionsRepo for MemoryStore {
    async fn find_by_token_hash(&self, hash: &[u8]) -> Result<Option<SessionRecord>, RepoError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .sessions
            .iter()
            .find(|s| s.token_hash == hash)
            .cloned())
    }
}

pub struct FixedHealth(pub bool);

#[async_trait]
impl StoreHealth for FixedHealth {
    async fn check(&self) -> Result<(), sqlx::Error> {
        if self.0 {
            Ok(())
        } else {
            Err(sqlx::Error::PoolTimedOut)
        }
    }
}

/// Services wired over one `MemoryStore`, with photos kept in a temp dir.
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub catalog: Arc<CatalogQueryService>,
    pub products: Arc<ProductCommandService>,
    pub photos: Arc<FilesystemStorage>,
    pub actors: Arc<dyn ActorResolver>,
    _uploads: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::seeded());
        let uploads = TempDir::new().expect("temp dir");
        let photos = Arc::new(
            FilesystemStorage::new(
                uploads.path().to_path_buf(),
                Url::parse(PUBLIC_BASE).expect("base url"),
            )
            .expect("photo storage"),
        );

        let cache = Arc::new(MemoryCacheStore::new(&CacheConfig::default()));
        let catalog = Arc::new(CatalogQueryService::new(
            store.clone(),
            cache,
            CatalogOptions {
                page_size: NonZeroU32::new(6).expect("non-zero"),
                listing_ttl: LISTING_TTL,
                phone: PhoneFormat::default(),
            },
        ));
        let guard = OwnershipGuard::new(
            store.clone(),
            store.clone(),
            store.clone(),
            DEFAULT_PRODUCT_CATEGORY_LIMIT,
        );
        let products = Arc::new(ProductCommandService::new(
            store.clone(),
            store.clone(),
            photos.clone(),
            guard,
        ));
        let actors: Arc<dyn ActorResolver> = Arc::new(SessionActorResolver::new(store.clone()));

        Self {
            store,
            catalog,
            products,
            photos,
            actors,
            _uploads: uploads,
        }
    }

    pub fn actor(merchant: &MerchantRecord) -> Actor {
        Actor::new(merchant.user_id)
    }

    pub fn api_state(&self, healthy: bool) -> ApiState {
        ApiState {
            catalog: self.catalog.clone(),
            products: self.products.clone(),
            actors: self.actors.clone(),
            photos: self.photos.clone(),
            health: Arc::new(FixedHealth(healthy)),
        }
    }
}
