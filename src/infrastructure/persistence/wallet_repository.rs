use crate::domain::entities::{OwnerKind, Wallet};
use crate::domain::error::LedgerError;
use crate::domain::repository::WalletRepository;
use crate::domain::types::WalletId;
use crate::infrastructure::persistence::{map_db_error, models::WalletModel};
use async_trait::async_trait;
use sqlx::PgPool;

/// Repositorio de Billeteras basado en PostgreSQL (solo lecturas).
pub struct PostgresWalletRepository {
    pool: PgPool,
}

impl PostgresWalletRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WalletRepository for PostgresWalletRepository {
    /// Busca una billetera por su ID. Lectura sin locks.
    async fn find_by_id(&self, id: WalletId) -> Result<Option<Wallet>, LedgerError> {
        let model_opt = sqlx::query_as::<_, WalletModel>(
            r#"
            SELECT * FROM wallets
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(model_opt.map(|m| m.into()))
    }

    /// Lista billeteras paginadas, opcionalmente filtradas por tipo de dueño.
    async fn list(
        &self,
        owner_kind: Option<OwnerKind>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Wallet>, LedgerError> {
        let models = sqlx::query_as::<_, WalletModel>(
            r#"
            SELECT * FROM wallets
            WHERE ($1::owner_kind IS NULL OR owner_kind = $1)
            ORDER BY created_at ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(owner_kind)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(models.into_iter().map(|m| m.into()).collect())
    }

    async fn count(&self, owner_kind: Option<OwnerKind>) -> Result<i64, LedgerError> {
        let total: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM wallets
            WHERE ($1::owner_kind IS NULL OR owner_kind = $1)
            "#,
        )
        .bind(owner_kind)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(total.0)
    }
}
