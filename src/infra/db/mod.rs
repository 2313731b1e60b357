//! Postgres-backed repository implementations.

mod categories;
mod merchants;
mod products;
mod sessions;
mod util;

pub use util::map_sqlx_error;

use std::sync::Arc;

use sqlx::{
    Postgres, QueryBuilder,
    postgres::{PgPool, PgPoolOptions},
    query,
};

use crate::application::listing::ListingFilter;
use crate::application::repos::{ProductLookup, RepoError};

#[derive(Clone)]
pub struct PostgresRepositories {
    pool: Arc<PgPool>,
}

impl PostgresRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
    }

    pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        query("SELECT 1").execute(self.pool()).await.map(|_| ())
    }

    fn apply_lookup(qb: &mut QueryBuilder<'_, Postgres>, lookup: &ProductLookup) {
        if let Some(id) = lookup.id {
            qb.push(" AND p.id = ");
            qb.push_bind(id);
        }
        if let Some(merchant_id) = lookup.merchant_id {
            qb.push(" AND p.merchant_id = ");
            qb.push_bind(merchant_id);
        }
        if let Some(category_id) = lookup.category_id {
            qb.push(" AND p.category_id = ");
            qb.push_bind(category_id);
        }
    }

    fn apply_listing_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &ListingFilter) {
        if let Some(category_id) = filter.category_id() {
            qb.push(" AND p.category_id = ");
            qb.push_bind(category_id);
        }
        if let Some(university_id) = filter.university_id() {
            qb.push(" AND m.university_id = ");
            qb.push_bind(university_id);
        }
        if let Some(province_id) = filter.province_id() {
            qb.push(" AND m.province_id = ");
            qb.push_bind(province_id);
        }
        if let Some(search) = filter.search() {
            qb.push(" AND p.name ILIKE ");
            qb.push_bind(format!("%{}%", escape_like(search)));
        }
    }

    fn convert_count(value: i64) -> Result<u64, RepoError> {
        value
            .try_into()
            .map_err(|_| RepoError::from_persistence("count exceeds supported range"))
    }
}

fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
