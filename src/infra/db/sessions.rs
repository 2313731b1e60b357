use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::repos::{RepoError, SessionsRepo},
    domain::entities::SessionRecord,
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(Debug, sqlx::FromRow)]
struct SessionRow {
    user_id: Uuid,
    token_hash: Vec<u8>,
    expires_at: OffsetDateTime,
}

#[async_trait]
impl SessionsRepo for PostgresRepositories {
    async fn find_by_token_hash(&self, hash: &[u8]) -> Result<Option<SessionRecord>, RepoError> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT user_id, token_hash, expires_at
            FROM user_sessions
            WHERE token_hash = $1
            "#,
        )
        .bind(hash)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(|row| SessionRecord {
            user_id: row.user_id,
            token_hash: row.token_hash,
            expires_at: row.expires_at,
        }))
    }
}
