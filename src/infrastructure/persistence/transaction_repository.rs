use crate::domain::entities::{LedgerEntry, Transaction};
use crate::domain::error::LedgerError;
use crate::domain::repository::TransactionRepository;
use crate::domain::types::{TransactionId, WalletId};
use crate::infrastructure::persistence::map_db_error;
use crate::infrastructure::persistence::models::{LedgerEntryModel, TransactionModel};
use async_trait::async_trait;
use sqlx::PgPool;

/// Repositorio de lecturas de transacciones implementado para PostgreSQL.
///
/// Utiliza consultas SQL parametrizadas directas con `sqlx` (Runtime-checked).
/// Las vistas de lectura corren en el nivel de aislamiento por defecto: los
/// lectores solo ven transacciones commiteadas, así que un historial nunca
/// incluye una transacción a medio completar.
pub struct PostgresTransactionRepository {
    /// Pool de conexiones a la base de datos PostgreSQL.
    pool: PgPool,
}

impl PostgresTransactionRepository {
    /// Crea una nueva instancia del repositorio.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionRepository for PostgresTransactionRepository {
    /// Busca una transacción por su ID único (UUID).
    async fn find_by_id(&self, id: TransactionId) -> Result<Option<Transaction>, LedgerError> {
        let model_opt =
            sqlx::query_as::<_, TransactionModel>(r#"SELECT * FROM transactions WHERE id = $1"#)
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_db_error)?;

        Ok(model_opt.map(|m| m.into()))
    }

    /// Busca por clave de idempotencia.
    ///
    /// Permite verificar si una solicitud ya fue procesada anteriormente para
    /// evitar duplicados, y releer a la ganadora tras una carrera de inserción.
    async fn find_by_idempotency_key(
        &self,
        key: &str,
    ) -> Result<Option<Transaction>, LedgerError> {
        let model_opt = sqlx::query_as::<_, TransactionModel>(
            r#"SELECT * FROM transactions WHERE idempotency_key = $1"#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(model_opt.map(|m| m.into()))
    }

    /// Recupera historial de transacciones para una Wallet específica.
    ///
    /// Retorna una página ordenada por fecha de creación descendente (lo más
    /// reciente primero). Incluye transacciones donde la billetera actúa como
    /// lado usuario O lado sistema.
    async fn find_by_wallet_id(
        &self,
        wallet_id: WalletId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Transaction>, LedgerError> {
        let models = sqlx::query_as::<_, TransactionModel>(
            r#"
            SELECT * FROM transactions
            WHERE user_wallet_id = $1 OR system_wallet_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(wallet_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(models.into_iter().map(|m| m.into()).collect())
    }

    async fn count_by_wallet_id(&self, wallet_id: WalletId) -> Result<i64, LedgerError> {
        let total: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM transactions
            WHERE user_wallet_id = $1 OR system_wallet_id = $1
            "#,
        )
        .bind(wallet_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(total.0)
    }

    /// Asientos de una transacción en orden de creación (débito y crédito).
    async fn entries_for(&self, id: TransactionId) -> Result<Vec<LedgerEntry>, LedgerError> {
        let models = sqlx::query_as::<_, LedgerEntryModel>(
            r#"
            SELECT * FROM ledger_entries
            WHERE transaction_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(models.into_iter().map(|m| m.into()).collect())
    }
}
