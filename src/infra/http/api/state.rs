use std::sync::Arc;

use async_trait::async_trait;

use crate::application::actor::ActorResolver;
use crate::application::catalog::CatalogQueryService;
use crate::application::products::ProductCommandService;
use crate::infra::db::PostgresRepositories;
use crate::infra::uploads::FilesystemStorage;

/// Reachability check for the catalog store, used by `/health`.
#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn check(&self) -> Result<(), sqlx::Error>;
}

#[async_trait]
impl StoreHealth for PostgresRepositories {
    async fn check(&self) -> Result<(), sqlx::Error> {
        self.health_check().await
    }
}

#[derive(Clone)]
pub struct ApiState {
    pub catalog: Arc<CatalogQueryService>,
    pub products: Arc<ProductCommandService>,
    pub actors: Arc<dyn ActorResolver>,
    pub photos: Arc<FilesystemStorage>,
    pub health: Arc<dyn StoreHealth>,
}
