//! Catalog read path.
//!
//! Listing pages are served cache-aside: the page bound is checked against
//! the store's product count, then the serialized page is read from the
//! cache or, on a miss, queried, shaped and written back with the listing
//! TTL. Writes never touch the cache, so a cached page may trail the store
//! until it expires.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use metrics::counter;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::application::error::CatalogError;
use crate::application::listing::{ListingFilter, ListingQuery};
use crate::application::pagination::{ensure_page_in_range, total_pages};
use crate::application::repos::{ProductLookup, ProductsRepo};
use crate::cache::{
    CacheKey, CacheStore, METRIC_LISTING_CACHE_HIT, METRIC_LISTING_CACHE_MISS,
    METRIC_LISTING_CACHE_WRITE_FAILED,
};
use crate::domain::catalog::PhoneFormat;
use crate::domain::entities::ProductAggregate;
use crate::domain::error::DomainError;
use crate::presentation::views::{DetailView, ListingItemView, ListingView, OwnerView};

const TARGET: &str = "pasar::application::catalog";

#[derive(Debug, Clone)]
pub struct CatalogOptions {
    pub page_size: NonZeroU32,
    pub listing_ttl: Duration,
    pub phone: PhoneFormat,
}

#[derive(Clone)]
pub struct CatalogQueryService {
    products: Arc<dyn ProductsRepo>,
    cache: Arc<dyn CacheStore>,
    options: CatalogOptions,
}

impl CatalogQueryService {
    pub fn new(
        products: Arc<dyn ProductsRepo>,
        cache: Arc<dyn CacheStore>,
        options: CatalogOptions,
    ) -> Self {
        Self {
            products,
            cache,
            options,
        }
    }

    pub fn listing_filter(&self, query: ListingQuery) -> ListingFilter {
        ListingFilter::new(query, self.options.page_size)
    }

    pub async fn get_listing(&self, query: ListingQuery) -> Result<ListingView, CatalogError> {
        let filter = self.listing_filter(query);
        let page_size = u64::from(self.options.page_size.get());

        let total = self
            .products
            .count()
            .await
            .map_err(|err| CatalogError::internal("failed to count products", err))?;
        ensure_page_in_range(filter.page(), total, page_size)
            .map_err(|err| CatalogError::policy("page not found", err))?;
        let total_pages = total_pages(total, page_size);

        let key = CacheKey::listing(&filter)
            .map_err(|err| CatalogError::internal("failed to build cache key", err))?;

        let cached = self
            .cache
            .get(key.as_str())
            .await
            .map_err(|err| CatalogError::internal("failed to get cached products", err))?;

        if let Some(bytes) = cached {
            counter!(METRIC_LISTING_CACHE_HIT).increment(1);
            debug!(target = TARGET, key = %key, "listing cache hit");
            let products: Vec<ListingItemView> = serde_json::from_slice(&bytes)
                .map_err(|err| CatalogError::internal("failed to decode cached products", err))?;
            return Ok(ListingView {
                page: filter.page(),
                total_pages,
                products,
            });
        }

        counter!(METRIC_LISTING_CACHE_MISS).increment(1);
        debug!(target = TARGET, key = %key, "listing cache miss");

        let rows = self
            .products
            .fetch_many(&filter)
            .await
            .map_err(|err| CatalogError::internal("failed to get products", err))?;
        let products: Vec<ListingItemView> = rows.iter().map(ListingItemView::from).collect();

        let encoded = serde_json::to_vec(&products)
            .map_err(|err| CatalogError::internal("failed to encode products", err))?;
        if let Err(err) = self
            .cache
            .set(key.as_str(), Bytes::from(encoded), self.options.listing_ttl)
            .await
        {
            counter!(METRIC_LISTING_CACHE_WRITE_FAILED).increment(1);
            warn!(target = TARGET, key = %key, error = %err, "listing cache write failed");
            return Err(CatalogError::internal("failed to cache products", err));
        }

        Ok(ListingView {
            page: filter.page(),
            total_pages,
            products,
        })
    }

    pub async fn get_product_detail(&self, id: Uuid) -> Result<DetailView, CatalogError> {
        let product = self.fetch(id).await?;
        Ok(DetailView::from_aggregate(&product, &self.options.phone))
    }

    pub async fn get_own_product_detail(&self, id: Uuid) -> Result<OwnerView, CatalogError> {
        let product = self.fetch(id).await?;
        Ok(OwnerView::from(&product))
    }

    async fn fetch(&self, id: Uuid) -> Result<ProductAggregate, CatalogError> {
        self.products
            .fetch_one(&ProductLookup::by_id(id))
            .await
            .map_err(|err| CatalogError::internal("failed to get product", err))?
            .ok_or_else(|| {
                CatalogError::policy("product not found", DomainError::not_found("product"))
            })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use time::OffsetDateTime;

    use super::*;
    use crate::application::error::ErrorKind;
    use crate::application::repos::RepoError;
    use crate::cache::{CacheConfig, CacheError, MemoryCacheStore};
    use crate::domain::entities::{
        CategoryRecord, MerchantRecord, ProductRecord, ProvinceRecord, UniversityRecord,
    };

    #[derive(Default)]
    struct StubProducts {
        rows: Vec<ProductAggregate>,
        offsets: Mutex<Vec<i64>>,
    }

    #[async_trait]
    impl ProductsRepo for StubProducts {
        async fn fetch_one(
            &self,
            lookup: &ProductLookup,
        ) -> Result<Option<ProductAggregate>, RepoError> {
            Ok(self
                .rows
                .iter()
                .find(|row| Some(row.product.id) == lookup.id)
                .cloned())
        }

        async fn fetch_many(
            &self,
            filter: &ListingFilter,
        ) -> Result<Vec<ProductAggregate>, RepoError> {
            self.offsets.lock().unwrap().push(filter.offset());
            let start = usize::try_from(filter.offset()).unwrap_or(usize::MAX);
            let size = usize::try_from(filter.page_size()).unwrap_or(0);
            Ok(self.rows.iter().skip(start).take(size).cloned().collect())
        }

        async fn count(&self) -> Result<u64, RepoError> {
            Ok(self.rows.len() as u64)
        }
    }

    struct BrokenCache;

    #[async_trait]
    impl CacheStore for BrokenCache {
        async fn get(&self, _key: &str) -> Result<Option<Bytes>, CacheError> {
            Ok(None)
        }

        async fn set(&self, _key: &str, _value: Bytes, _ttl: Duration) -> Result<(), CacheError> {
            Err(CacheError::Unavailable("connection refused".into()))
        }
    }

    fn row(n: usize, phone: &str) -> ProductAggregate {
        let now = OffsetDateTime::now_utc();
        let merchant_id = Uuid::new_v4();
        ProductAggregate {
            product: ProductRecord {
                id: Uuid::new_v4(),
                merchant_id,
                category_id: 2,
                name: format!("Produk {n}"),
                price: 10_000 + n as u64,
                description: "Barang bekas".into(),
                photo_url: String::new(),
                created_at: now,
                updated_at: now,
            },
            category: CategoryRecord {
                id: 2,
                name: "Buku".into(),
            },
            merchant: MerchantRecord {
                id: merchant_id,
                user_id: Uuid::new_v4(),
                name: "Lapak Buku".into(),
                university_id: 1,
                faculty: "FIB".into(),
                province_id: 1,
                city: "Yogyakarta".into(),
                phone_number: phone.into(),
                instagram: "lapakbuku".into(),
                is_active: true,
                created_at: now,
                updated_at: now,
            },
            university: UniversityRecord {
                id: 1,
                name: "UGM".into(),
            },
            province: ProvinceRecord {
                id: 1,
                name: "DI Yogyakarta".into(),
            },
        }
    }

    fn options() -> CatalogOptions {
        CatalogOptions {
            page_size: NonZeroU32::new(6).expect("non-zero"),
            listing_ttl: Duration::from_secs(300),
            phone: PhoneFormat::default(),
        }
    }

    fn service(rows: Vec<ProductAggregate>) -> (CatalogQueryService, Arc<StubProducts>) {
        let products = Arc::new(StubProducts {
            rows,
            ..StubProducts::default()
        });
        let cache = Arc::new(MemoryCacheStore::new(&CacheConfig::default()));
        (
            CatalogQueryService::new(products.clone(), cache, options()),
            products,
        )
    }

    fn page(page: i64) -> ListingQuery {
        ListingQuery {
            page: Some(page),
            ..ListingQuery::default()
        }
    }

    #[tokio::test]
    async fn second_page_reads_from_offset_six() {
        let rows = (0..8).map(|n| row(n, "0811")).collect();
        let (service, products) = service(rows);

        let first = service.get_listing(page(1)).await.expect("page 1");
        let second = service.get_listing(page(2)).await.expect("page 2");

        assert_eq!(first.products.len(), 6);
        assert_eq!(second.products.len(), 2);
        assert_eq!(second.total_pages, 2);
        assert_eq!(products.offsets.lock().unwrap().as_slice(), &[0, 6]);
    }

    #[tokio::test]
    async fn repeated_page_is_served_from_cache() {
        let rows = (0..3).map(|n| row(n, "0811")).collect();
        let (service, products) = service(rows);

        let fresh = service.get_listing(page(1)).await.expect("miss");
        let cached = service.get_listing(page(0)).await.expect("hit");

        assert_eq!(fresh, cached);
        assert_eq!(products.offsets.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_catalog_has_only_an_empty_first_page() {
        let (service, _) = service(Vec::new());

        let first = service.get_listing(page(1)).await.expect("page 1");
        assert!(first.products.is_empty());
        assert_eq!(first.total_pages, 0);

        let err = service.get_listing(page(2)).await.expect_err("page 2");
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert!(matches!(
            err.domain(),
            Some(DomainError::PageOutOfRange {
                requested: 2,
                last: 1
            })
        ));
    }

    #[tokio::test]
    async fn cache_write_failure_is_reported() {
        let products = Arc::new(StubProducts {
            rows: vec![row(1, "0811")],
            ..StubProducts::default()
        });
        let service = CatalogQueryService::new(products, Arc::new(BrokenCache), options());

        let err = service.get_listing(page(1)).await.expect_err("write fails");
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.message(), "failed to cache products");
    }

    #[tokio::test]
    async fn detail_carries_whatsapp_link() {
        let product = row(1, "081234567");
        let id = product.product.id;
        let (service, _) = service(vec![product]);

        let detail = service.get_product_detail(id).await.expect("detail");
        assert_eq!(detail.whatsapp, "https://wa.me/+6281234567");
        assert_eq!(detail.university, "UGM");

        let own = service.get_own_product_detail(id).await.expect("own");
        assert_eq!(own.category, "Buku");
        assert_eq!(own.price, 10_001);
    }

    #[tokio::test]
    async fn missing_product_is_not_found() {
        let (service, _) = service(Vec::new());
        let err = service
            .get_product_detail(Uuid::new_v4())
            .await
            .expect_err("missing");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
