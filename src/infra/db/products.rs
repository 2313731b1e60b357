use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::listing::ListingFilter,
    application::repos::{
        CreateProductParams, ProductLookup, ProductPatch, ProductsRepo, ProductsWriteRepo,
        RepoError,
    },
    domain::entities::{
        CategoryRecord, MerchantRecord, ProductAggregate, ProductRecord, ProvinceRecord,
        UniversityRecord,
    },
};

use super::{PostgresRepositories, map_sqlx_error};

const PRODUCT_AGGREGATE_SELECT: &str = r#"
    SELECT
        p.id, p.merchant_id, p.category_id, p.name, p.price, p.description,
        p.photo_url, p.created_at, p.updated_at,
        c.name AS category_name,
        m.user_id AS merchant_user_id, m.name AS merchant_name,
        m.university_id, m.faculty, m.province_id, m.city, m.phone_number,
        m.instagram, m.is_active,
        m.created_at AS merchant_created_at, m.updated_at AS merchant_updated_at,
        u.name AS university_name,
        pr.name AS province_name
    FROM products p
    INNER JOIN categories c ON c.id = p.category_id
    INNER JOIN merchants m ON m.id = p.merchant_id
    INNER JOIN universities u ON u.id = m.university_id
    INNER JOIN provinces pr ON pr.id = m.province_id
    WHERE TRUE
"#;

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    merchant_id: Uuid,
    category_id: i32,
    name: String,
    price: i64,
    description: String,
    photo_url: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl TryFrom<ProductRow> for ProductRecord {
    type Error = RepoError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            merchant_id: row.merchant_id,
            category_id: row.category_id,
            name: row.name,
            price: price_from_db(row.price)?,
            description: row.description,
            photo_url: row.photo_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ProductAggregateRow {
    #[sqlx(flatten)]
    product: ProductRow,
    category_name: String,
    merchant_user_id: Uuid,
    merchant_name: String,
    university_id: i32,
    faculty: String,
    province_id: i32,
    city: String,
    phone_number: String,
    instagram: String,
    is_active: bool,
    merchant_created_at: OffsetDateTime,
    merchant_updated_at: OffsetDateTime,
    university_name: String,
    province_name: String,
}

impl TryFrom<ProductAggregateRow> for ProductAggregate {
    type Error = RepoError;

    fn try_from(row: ProductAggregateRow) -> Result<Self, Self::Error> {
        let product = ProductRecord::try_from(row.product)?;
        Ok(Self {
            category: CategoryRecord {
                id: product.category_id,
                name: row.category_name,
            },
            merchant: MerchantRecord {
                id: product.merchant_id,
                user_id: row.merchant_user_id,
                name: row.merchant_name,
                university_id: row.university_id,
                faculty: row.faculty,
                province_id: row.province_id,
                city: row.city,
                phone_number: row.phone_number,
                instagram: row.instagram,
                is_active: row.is_active,
                created_at: row.merchant_created_at,
                updated_at: row.merchant_updated_at,
            },
            university: UniversityRecord {
                id: row.university_id,
                name: row.university_name,
            },
            province: ProvinceRecord {
                id: row.province_id,
                name: row.province_name,
            },
            product,
        })
    }
}

#[async_trait]
impl ProductsRepo for PostgresRepositories {
    async fn fetch_one(
        &self,
        lookup: &ProductLookup,
    ) -> Result<Option<ProductAggregate>, RepoError> {
        let mut qb = QueryBuilder::<Postgres>::new(PRODUCT_AGGREGATE_SELECT);
        Self::apply_lookup(&mut qb, lookup);
        qb.push(" LIMIT 1");

        let row = qb
            .build_query_as::<ProductAggregateRow>()
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        row.map(ProductAggregate::try_from).transpose()
    }

    async fn fetch_many(&self, filter: &ListingFilter) -> Result<Vec<ProductAggregate>, RepoError> {
        let mut qb = QueryBuilder::<Postgres>::new(PRODUCT_AGGREGATE_SELECT);
        Self::apply_listing_filter(&mut qb, filter);
        qb.push(" ORDER BY p.created_at DESC, p.id ASC LIMIT ");
        qb.push_bind(filter.page_size());
        qb.push(" OFFSET ");
        qb.push_bind(filter.offset());

        let rows = qb
            .build_query_as::<ProductAggregateRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        rows.into_iter().map(ProductAggregate::try_from).collect()
    }

    async fn count(&self) -> Result<u64, RepoError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Self::convert_count(total)
    }
}

#[async_trait]
impl ProductsWriteRepo for PostgresRepositories {
    async fn create_product(&self, params: CreateProductParams) -> Result<ProductRecord, RepoError> {
        let now = OffsetDateTime::now_utc();
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            INSERT INTO products (id, merchant_id, category_id, name, price, description, photo_url, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, '', $7, $7)
            RETURNING id, merchant_id, category_id, name, price, description, photo_url, created_at, updated_at
            "#,
        )
        .bind(params.id)
        .bind(params.merchant_id)
        .bind(params.category_id)
        .bind(params.name)
        .bind(price_to_db(params.price)?)
        .bind(params.description)
        .bind(now)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        ProductRecord::try_from(row)
    }

    async fn update_product(&self, id: Uuid, patch: &ProductPatch) -> Result<(), RepoError> {
        if patch.is_empty() {
            return Ok(());
        }

        let mut qb = QueryBuilder::<Postgres>::new("UPDATE products SET updated_at = ");
        qb.push_bind(OffsetDateTime::now_utc());
        if let Some(name) = patch.name.as_ref() {
            qb.push(", name = ");
            qb.push_bind(name.clone());
        }
        if let Some(category_id) = patch.category_id {
            qb.push(", category_id = ");
            qb.push_bind(category_id);
        }
        if let Some(price) = patch.price {
            qb.push(", price = ");
            qb.push_bind(price_to_db(price)?);
        }
        if let Some(description) = patch.description.as_ref() {
            qb.push(", description = ");
            qb.push_bind(description.clone());
        }
        if let Some(photo_url) = patch.photo_url.as_ref() {
            qb.push(", photo_url = ");
            qb.push_bind(photo_url.clone());
        }
        qb.push(" WHERE id = ");
        qb.push_bind(id);

        let result = qb
            .build()
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

fn price_to_db(price: u64) -> Result<i64, RepoError> {
    i64::try_from(price).map_err(|_| RepoError::InvalidInput {
        message: format!("price {price} exceeds supported range"),
    })
}

fn price_from_db(price: i64) -> Result<u64, RepoError> {
    u64::try_from(price).map_err(|_| RepoError::Integrity {
        message: format!("stored price {price} is negative"),
    })
}
