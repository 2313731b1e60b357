use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::repos::{MerchantsRepo, RepoError},
    domain::entities::MerchantRecord,
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct MerchantRow {
    id: Uuid,
    user_id: Uuid,
    name: String,
    university_id: i32,
    faculty: String,
    province_id: i32,
    city: String,
    phone_number: String,
    instagram: String,
    is_active: bool,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<MerchantRow> for MerchantRecord {
    fn from(row: MerchantRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            university_id: row.university_id,
            faculty: row.faculty,
            province_id: row.province_id,
            city: row.city,
            phone_number: row.phone_number,
            instagram: row.instagram,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl MerchantsRepo for PostgresRepositories {
    async fn find_by_user(&self, user_id: Uuid) -> Result<Option<MerchantRecord>, RepoError> {
        let row = sqlx::query_as::<_, MerchantRow>(
            r#"
            SELECT id, user_id, name, university_id, faculty, province_id, city,
                   phone_number, instagram, is_active, created_at, updated_at
            FROM merchants
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(MerchantRecord::from))
    }
}
