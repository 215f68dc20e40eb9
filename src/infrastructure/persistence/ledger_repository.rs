use crate::domain::entities::{
    validate_transfer, EntrySide, LedgerEntry, Transaction, TransactionStatus,
    TransactionWithEntries, Wallet,
};
use crate::domain::error::LedgerError;
use crate::domain::repository::LedgerRepository;
use crate::domain::types::{LedgerEntryId, TransactionId, WalletId};
use crate::infrastructure::persistence::map_db_error;
use crate::infrastructure::persistence::models::{LedgerEntryModel, TransactionModel, WalletModel};
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

/// Motor de mutación del ledger implementado para PostgreSQL.
///
/// Ejecuta la transferencia completa dentro de una única transacción de BD:
/// lock de filas en orden canónico, validación de precondiciones sobre las
/// filas bloqueadas, fila de transacción `pending`, débito + crédito con sus
/// asientos y promoción a `completed`. Cualquier falla entre `begin` y
/// `commit` revierte todo (rollback al soltar la transacción de sqlx).
pub struct PostgresLedgerRepository {
    /// Pool de conexiones a la base de datos PostgreSQL.
    pool: PgPool,
}

impl PostgresLedgerRepository {
    /// Crea una nueva instancia del repositorio.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Adquiere lock exclusivo sobre las dos billeteras en UNA sola sentencia.
    ///
    /// El `ORDER BY id` dentro de la adquisición es el que hace imposible el
    /// deadlock: dos transacciones concurrentes que toquen filas en común las
    /// adquieren siempre en la misma secuencia, así que no puede formarse una
    /// espera circular. No hay un segundo paso de lock en todo el flujo.
    async fn lock_wallet_pair(
        conn: &mut PgConnection,
        source_id: WalletId,
        target_id: WalletId,
    ) -> Result<(Wallet, Wallet), LedgerError> {
        let models = sqlx::query_as::<_, WalletModel>(
            r#"
            SELECT * FROM wallets
            WHERE id IN ($1, $2)
            ORDER BY id
            FOR UPDATE
            "#,
        )
        .bind(source_id)
        .bind(target_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(map_db_error)?;

        let mut wallets: Vec<Wallet> = models.into_iter().map(Into::into).collect();

        let source_pos = wallets
            .iter()
            .position(|w| w.id == source_id)
            .ok_or(LedgerError::WalletNotFound(source_id))?;
        let source = wallets.swap_remove(source_pos);

        let target_pos = wallets
            .iter()
            .position(|w| w.id == target_id)
            .ok_or(LedgerError::WalletNotFound(target_id))?;
        let target = wallets.swap_remove(target_pos);

        Ok((source, target))
    }

    /// Inserta la fila de transacción en estado `pending`.
    ///
    /// Una violación de unicidad sobre `idempotency_key` significa que otra
    /// petición con la misma clave commiteó primero: se traduce a
    /// `DuplicateIdempotencyKey` para que el caso de uso relea a la ganadora.
    async fn insert_transaction(
        conn: &mut PgConnection,
        transaction: Transaction,
    ) -> Result<Transaction, LedgerError> {
        let key = transaction.idempotency_key.clone();
        let model = TransactionModel::from(transaction);

        let saved_model = sqlx::query_as::<_, TransactionModel>(
            r#"
            INSERT INTO transactions (
                id, kind, status, user_wallet_id, system_wallet_id, amount,
                reference_id, idempotency_key, description, metadata, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(model.id)
        .bind(model.kind)
        .bind(model.status)
        .bind(model.user_wallet_id)
        .bind(model.system_wallet_id)
        .bind(model.amount)
        .bind(model.reference_id)
        .bind(model.idempotency_key)
        .bind(model.description)
        .bind(model.metadata)
        .bind(model.created_at)
        .bind(model.updated_at)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.constraint() == Some("transactions_idempotency_key_unique") {
                    return LedgerError::DuplicateIdempotencyKey(key.unwrap_or_default());
                }
            }
            map_db_error(e)
        })?;

        Ok(saved_model.into())
    }

    /// Aplica una partida (débito o crédito) sobre una billetera YA bloqueada.
    ///
    /// `balance_before` sale de la foto en memoria de la fila bloqueada: el
    /// lock exclusivo garantiza que coincide con la BD sin releer. El UPDATE
    /// delega en el CHECK de saldo no negativo como última línea de defensa.
    async fn apply_entry(
        conn: &mut PgConnection,
        wallet: &Wallet,
        side: EntrySide,
        amount: Decimal,
        transaction_id: TransactionId,
    ) -> Result<LedgerEntry, LedgerError> {
        let delta = match side {
            EntrySide::Debit => -amount,
            EntrySide::Credit => amount,
        };
        let balance_before = wallet.balance;
        let balance_after = balance_before + delta;

        sqlx::query(
            r#"
            UPDATE wallets
            SET balance = balance + $1,
                updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(delta)
        .bind(wallet.id)
        .execute(&mut *conn)
        .await
        .map_err(map_db_error)?;

        let entry_model = sqlx::query_as::<_, LedgerEntryModel>(
            r#"
            INSERT INTO ledger_entries (
                id, transaction_id, wallet_id, side, amount, balance_before, balance_after
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(LedgerEntryId::new())
        .bind(transaction_id)
        .bind(wallet.id)
        .bind(side)
        .bind(amount)
        .bind(balance_before)
        .bind(balance_after)
        .fetch_one(&mut *conn)
        .await
        .map_err(map_db_error)?;

        Ok(entry_model.into())
    }

    /// Promueve la transacción a `completed` una vez que ambos asientos existen.
    async fn mark_completed(
        conn: &mut PgConnection,
        id: TransactionId,
    ) -> Result<Transaction, LedgerError> {
        let model = sqlx::query_as::<_, TransactionModel>(
            r#"
            UPDATE transactions
            SET status = $1, updated_at = $2
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(TransactionStatus::Completed)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(map_db_error)?;

        match model {
            Some(m) => Ok(m.into()),
            None => Err(LedgerError::TransactionNotFound(id)),
        }
    }
}

#[async_trait]
impl LedgerRepository for PostgresLedgerRepository {
    async fn execute_transfer(
        &self,
        transaction: Transaction,
    ) -> Result<TransactionWithEntries, LedgerError> {
        let amount = transaction.amount;
        let (source_id, target_id) = transaction.source_and_target();

        // Una conexión exclusiva del pool + BEGIN. Todo retorno temprano con
        // `?` suelta `tx` sin commit y sqlx emite el ROLLBACK.
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let (source, target) = Self::lock_wallet_pair(&mut tx, source_id, target_id).await?;

        // Precondiciones sobre las filas bloqueadas: el chequeo de saldo es
        // firme hasta el commit.
        validate_transfer(&source, &target, amount)?;

        let pending = Self::insert_transaction(&mut tx, transaction).await?;

        // Débito primero por convención (facilita leer los logs); para la
        // corrección el orden es irrelevante, ambas filas ya están bloqueadas.
        let debit =
            Self::apply_entry(&mut tx, &source, EntrySide::Debit, amount, pending.id).await?;
        let credit =
            Self::apply_entry(&mut tx, &target, EntrySide::Credit, amount, pending.id).await?;

        let completed = Self::mark_completed(&mut tx, pending.id).await?;

        tx.commit().await.map_err(map_db_error)?;

        Ok(TransactionWithEntries {
            transaction: completed,
            entries: vec![debit, credit],
        })
    }
}
