use crate::domain::entities::IdempotencyRecord;
use crate::domain::error::LedgerError;
use crate::domain::repository::IdempotencyRepository;
use crate::infrastructure::persistence::{map_db_error, models::IdempotencyModel};
use async_trait::async_trait;
use sqlx::PgPool;

/// Almacén de respuestas idempotentes basado en PostgreSQL.
///
/// Cachea el sobre de respuesta serializado por `(key, request_path)`. La
/// fuente de verdad durable sigue siendo la clave única sobre
/// `transactions.idempotency_key`: si este almacén se vacía, el motor de
/// flujos reconstruye el replay releyendo la transacción commiteada.
pub struct PostgresIdempotencyRepository {
    pool: PgPool,
}

impl PostgresIdempotencyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdempotencyRepository for PostgresIdempotencyRepository {
    /// Devuelve la respuesta cacheada si `(key, path)` existe y no expiró.
    async fn find(
        &self,
        key: &str,
        request_path: &str,
    ) -> Result<Option<IdempotencyRecord>, LedgerError> {
        let model_opt = sqlx::query_as::<_, IdempotencyModel>(
            r#"
            SELECT * FROM idempotency_keys
            WHERE key = $1 AND request_path = $2 AND expires_at > NOW()
            "#,
        )
        .bind(key)
        .bind(request_path)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(model_opt.map(|m| m.into()))
    }

    /// Inserción best-effort: si otra petición concurrente ya guardó una
    /// respuesta para `(key, path)`, la fila existente se conserva intacta.
    async fn save(&self, record: IdempotencyRecord) -> Result<(), LedgerError> {
        sqlx::query(
            r#"
            INSERT INTO idempotency_keys (
                id, key, request_path, response_status, response_body, created_at, expires_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (key, request_path) DO NOTHING
            "#,
        )
        .bind(record.id)
        .bind(record.key)
        .bind(record.request_path)
        .bind(record.response_status)
        .bind(record.response_body)
        .bind(record.created_at)
        .bind(record.expires_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    /// Elimina las filas expiradas. Lo invoca el job de poda periódica.
    async fn delete_expired(&self) -> Result<u64, LedgerError> {
        let result = sqlx::query(r#"DELETE FROM idempotency_keys WHERE expires_at <= NOW()"#)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(result.rows_affected())
    }
}
