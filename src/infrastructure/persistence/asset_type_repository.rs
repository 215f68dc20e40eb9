use crate::domain::entities::AssetType;
use crate::domain::error::LedgerError;
use crate::domain::repository::AssetTypeRepository;
use crate::infrastructure::persistence::{map_db_error, models::AssetTypeModel};
use async_trait::async_trait;
use sqlx::PgPool;

/// Repositorio de Tipos de Activo basado en PostgreSQL.
pub struct PostgresAssetTypeRepository {
    pool: PgPool,
}

impl PostgresAssetTypeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AssetTypeRepository for PostgresAssetTypeRepository {
    async fn list(&self) -> Result<Vec<AssetType>, LedgerError> {
        let models = sqlx::query_as::<_, AssetTypeModel>(
            r#"
            SELECT * FROM asset_types
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(models.into_iter().map(|m| m.into()).collect())
    }
}
