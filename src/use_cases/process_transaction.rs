use crate::domain::{
    entities::{Transaction, TransactionKind, TransactionWithEntries},
    error::LedgerError,
    repository::{LedgerRepository, TransactionRepository},
};
use crate::domain::types::WalletId;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Orden de transferencia ya resuelta por el handler del flujo.
///
/// Los tres flujos (topup / bonus / spend) comparten esta forma; la política
/// por flujo (qué billetera se debita y cuál se acredita) vive en
/// `TransactionKind::source_and_target`.
#[derive(Debug, Clone)]
pub struct TransferCommand {
    pub kind: TransactionKind,
    pub user_wallet_id: WalletId,
    pub system_wallet_id: WalletId,
    pub amount: Decimal,
    pub idempotency_key: Option<String>,
    pub reference_id: Option<String>,
    pub description: Option<String>,
    pub metadata: serde_json::Value,
}

/// Caso de uso central: el motor de flujos del ledger.
///
/// Orquesta la plantilla común de los tres flujos: guardia de duplicados por
/// clave de idempotencia, construcción de la entidad, ejecución transaccional
/// en el `LedgerRepository` (locks, validaciones, doble partida, promoción a
/// `completed`) y resolución de carreras de inserción sobre la clave única.
///
/// # Examples
/// ```ignore
/// use ledger_service::use_cases::process_transaction::ProcessTransactionUseCase;
/// use std::sync::Arc;
///
/// let use_case = ProcessTransactionUseCase::new(transaction_repo, ledger_repo);
/// let receipt = use_case.execute(command).await?;
/// ```
#[derive(Clone)]
pub struct ProcessTransactionUseCase {
    transaction_repo: Arc<dyn TransactionRepository>,
    ledger_repo: Arc<dyn LedgerRepository>,
}

impl ProcessTransactionUseCase {
    pub fn new(
        transaction_repo: Arc<dyn TransactionRepository>,
        ledger_repo: Arc<dyn LedgerRepository>,
    ) -> Self {
        Self {
            transaction_repo,
            ledger_repo,
        }
    }

    /// Ejecuta la plantilla de transferencia para cualquier flujo.
    ///
    /// # Retornos
    ///
    /// La transacción completada con sus dos asientos. Si la clave de
    /// idempotencia ya tiene una transacción commiteada, devuelve esa
    /// transacción sin realizar escritura alguna (replay).
    #[tracing::instrument(name = "ProcessTransactionUseCase::execute", skip(self, command))]
    pub async fn execute(
        &self,
        command: TransferCommand,
    ) -> Result<TransactionWithEntries, LedgerError> {
        // 1. Guardia de duplicados contra la tabla de transacciones.
        // La clave única sobre `transactions.idempotency_key` es la fuente de
        // verdad durable: aunque el cache de respuestas se haya vaciado, una
        // clave ya commiteada se responde con la transacción existente.
        if let Some(key) = &command.idempotency_key {
            if let Some(existing) = self.transaction_repo.find_by_idempotency_key(key).await? {
                let entries = self.transaction_repo.entries_for(existing.id).await?;
                return Ok(TransactionWithEntries {
                    transaction: existing,
                    entries,
                });
            }
        }

        // 2. Entidad validada (monto positivo, billeteras distintas, clave bien formada).
        let transaction = Transaction::new(
            command.kind,
            command.user_wallet_id,
            command.system_wallet_id,
            command.amount,
            command.idempotency_key,
            command.reference_id,
            command.description,
            command.metadata,
        )?;

        // 3. Transferencia atómica: lock -> validar -> insertar -> doble
        // partida -> completar, todo dentro de una transacción de BD.
        match self.ledger_repo.execute_transfer(transaction).await {
            Err(LedgerError::DuplicateIdempotencyKey(key)) => {
                // Otra petición con la misma clave commiteó primero. Nuestra
                // transacción ya fue revertida; releemos a la ganadora y la
                // devolvemos como si hubiera sido un replay.
                let winner = self
                    .transaction_repo
                    .find_by_idempotency_key(&key)
                    .await?
                    .ok_or(LedgerError::DuplicateIdempotencyKey(key))?;
                let entries = self.transaction_repo.entries_for(winner.id).await?;
                Ok(TransactionWithEntries {
                    transaction: winner,
                    entries,
                })
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{EntrySide, LedgerEntry, TransactionStatus};
    use crate::domain::repository::{MockLedgerRepository, MockTransactionRepository};
    use crate::domain::types::{LedgerEntryId, TransactionId};
    use chrono::Utc;
    use mockall::predicate::*;
    use rust_decimal_macros::dec;

    fn completed_transaction(key: &str, amount: Decimal) -> Transaction {
        let mut tx = Transaction::new(
            TransactionKind::Topup,
            WalletId::new(),
            WalletId::new(),
            amount,
            Some(key.to_string()),
            None,
            None,
            serde_json::json!({}),
        )
        .unwrap();
        tx.status = TransactionStatus::Completed;
        tx
    }

    fn entries_of(tx: &Transaction) -> Vec<LedgerEntry> {
        let (source, target) = tx.source_and_target();
        vec![
            LedgerEntry {
                id: LedgerEntryId::new(),
                transaction_id: tx.id,
                wallet_id: source,
                side: EntrySide::Debit,
                amount: tx.amount,
                balance_before: dec!(1000),
                balance_after: dec!(1000) - tx.amount,
                created_at: Utc::now(),
            },
            LedgerEntry {
                id: LedgerEntryId::new(),
                transaction_id: tx.id,
                wallet_id: target,
                side: EntrySide::Credit,
                amount: tx.amount,
                balance_before: dec!(500),
                balance_after: dec!(500) + tx.amount,
                created_at: Utc::now(),
            },
        ]
    }

    fn command(kind: TransactionKind, amount: Decimal, key: &str) -> TransferCommand {
        TransferCommand {
            kind,
            user_wallet_id: WalletId::new(),
            system_wallet_id: WalletId::new(),
            amount,
            idempotency_key: Some(key.to_string()),
            reference_id: None,
            description: None,
            metadata: serde_json::json!({}),
        }
    }

    #[tokio::test]
    async fn test_replay_returns_existing_transaction_without_writes() {
        let mut mock_repo = MockTransactionRepository::new();
        let mock_ledger = MockLedgerRepository::new();

        let existing = completed_transaction("k1", dec!(100));
        let existing_id = existing.id;
        let entries = entries_of(&existing);

        mock_repo
            .expect_find_by_idempotency_key()
            .with(eq("k1"))
            .times(1)
            .returning(move |_| Ok(Some(existing.clone())));
        mock_repo
            .expect_entries_for()
            .with(eq(existing_id))
            .times(1)
            .returning(move |_| Ok(entries.clone()));

        // El ledger repo no debe ser invocado: replay = cero escrituras.
        let use_case =
            ProcessTransactionUseCase::new(Arc::new(mock_repo), Arc::new(mock_ledger));

        let result = use_case
            .execute(command(TransactionKind::Topup, dec!(100), "k1"))
            .await
            .unwrap();

        assert_eq!(result.transaction.id, existing_id);
        assert_eq!(result.transaction.status, TransactionStatus::Completed);
        assert_eq!(result.entries.len(), 2);
    }

    #[tokio::test]
    async fn test_success_path_executes_transfer() {
        let mut mock_repo = MockTransactionRepository::new();
        let mut mock_ledger = MockLedgerRepository::new();

        mock_repo
            .expect_find_by_idempotency_key()
            .with(eq("k2"))
            .times(1)
            .returning(|_| Ok(None));

        mock_ledger
            .expect_execute_transfer()
            .withf(|tx: &Transaction| {
                tx.status == TransactionStatus::Pending && tx.amount == dec!(50)
            })
            .times(1)
            .returning(|tx| {
                let entries = entries_of(&tx);
                let mut completed = tx;
                completed.status = TransactionStatus::Completed;
                Ok(TransactionWithEntries {
                    transaction: completed,
                    entries,
                })
            });

        let use_case =
            ProcessTransactionUseCase::new(Arc::new(mock_repo), Arc::new(mock_ledger));

        let result = use_case
            .execute(command(TransactionKind::Spend, dec!(50), "k2"))
            .await
            .unwrap();

        assert_eq!(result.transaction.status, TransactionStatus::Completed);
        assert_eq!(result.entries.len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_amount_rejected_before_any_write() {
        let mut mock_repo = MockTransactionRepository::new();
        let mock_ledger = MockLedgerRepository::new();

        mock_repo
            .expect_find_by_idempotency_key()
            .returning(|_| Ok(None));

        let use_case =
            ProcessTransactionUseCase::new(Arc::new(mock_repo), Arc::new(mock_ledger));

        let result = use_case
            .execute(command(TransactionKind::Topup, dec!(0), "k3"))
            .await;

        assert!(matches!(result, Err(LedgerError::Validation(_))));
    }

    #[tokio::test]
    async fn test_insufficient_funds_propagates() {
        let mut mock_repo = MockTransactionRepository::new();
        let mut mock_ledger = MockLedgerRepository::new();

        mock_repo
            .expect_find_by_idempotency_key()
            .returning(|_| Ok(None));

        let wallet = WalletId::new();
        mock_ledger.expect_execute_transfer().returning(move |_| {
            Err(LedgerError::InsufficientFunds {
                wallet,
                available: dec!(600),
                required: dec!(9999),
            })
        });

        let use_case =
            ProcessTransactionUseCase::new(Arc::new(mock_repo), Arc::new(mock_ledger));

        let result = use_case
            .execute(command(TransactionKind::Spend, dec!(9999), "k4"))
            .await;

        assert_eq!(
            result.unwrap_err(),
            LedgerError::InsufficientFunds {
                wallet,
                available: dec!(600),
                required: dec!(9999),
            }
        );
    }

    #[tokio::test]
    async fn test_losing_insert_race_rereads_winner() {
        let mut mock_repo = MockTransactionRepository::new();
        let mut mock_ledger = MockLedgerRepository::new();

        let winner = completed_transaction("k5", dec!(25));
        let winner_id = winner.id;
        let entries = entries_of(&winner);

        // La guardia inicial no ve nada; tras perder la carrera de inserción,
        // la segunda lectura ve a la ganadora ya commiteada.
        mock_repo
            .expect_find_by_idempotency_key()
            .with(eq("k5"))
            .times(1)
            .returning(|_| Ok(None));
        mock_repo
            .expect_find_by_idempotency_key()
            .with(eq("k5"))
            .times(1)
            .returning(move |_| Ok(Some(winner.clone())));
        mock_repo
            .expect_entries_for()
            .with(eq(winner_id))
            .times(1)
            .returning(move |_| Ok(entries.clone()));

        mock_ledger
            .expect_execute_transfer()
            .times(1)
            .returning(|_| Err(LedgerError::DuplicateIdempotencyKey("k5".to_string())));

        let use_case =
            ProcessTransactionUseCase::new(Arc::new(mock_repo), Arc::new(mock_ledger));

        let result = use_case
            .execute(command(TransactionKind::Bonus, dec!(25), "k5"))
            .await
            .unwrap();

        assert_eq!(result.transaction.id, winner_id);
        assert_eq!(result.entries.len(), 2);
    }
}
