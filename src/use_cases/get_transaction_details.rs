use crate::domain::{
    entities::TransactionWithEntries, error::LedgerError, repository::TransactionRepository,
    types::TransactionId,
};
use std::sync::Arc;

/// Caso de uso para obtener los detalles de una única transacción.
///
/// Devuelve la transacción junto con sus dos asientos contables en orden de
/// creación, delegando el acceso a datos al `TransactionRepository`.
#[derive(Clone)]
pub struct GetTransactionDetailsUseCase {
    transaction_repo: Arc<dyn TransactionRepository>,
}

impl GetTransactionDetailsUseCase {
    /// Construye una nueva instancia de `GetTransactionDetailsUseCase`.
    pub fn new(transaction_repo: Arc<dyn TransactionRepository>) -> Self {
        Self { transaction_repo }
    }

    /// Ejecuta el caso de uso para buscar una transacción por su ID.
    ///
    /// # Argumentos
    ///
    /// * `transaction_id` - El identificador único (`Uuid`) de la transacción.
    ///
    /// # Retornos
    ///
    /// La transacción con sus asientos, o `LedgerError::TransactionNotFound`
    /// si no existe.
    #[tracing::instrument(name = "GetTransactionDetailsUseCase::execute", skip(self))]
    pub async fn execute(
        &self,
        transaction_id: TransactionId,
    ) -> Result<TransactionWithEntries, LedgerError> {
        let transaction = self
            .transaction_repo
            .find_by_id(transaction_id)
            .await?
            .ok_or(LedgerError::TransactionNotFound(transaction_id))?;

        let entries = self.transaction_repo.entries_for(transaction_id).await?;

        Ok(TransactionWithEntries {
            transaction,
            entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Transaction, TransactionKind};
    use crate::domain::repository::MockTransactionRepository;
    use crate::domain::types::WalletId;
    use mockall::predicate::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_get_transaction_details_not_found() {
        let mut mock_repo = MockTransactionRepository::new();
        let transaction_id = TransactionId::new();

        mock_repo
            .expect_find_by_id()
            .with(eq(transaction_id))
            .times(1)
            .returning(|_| Ok(None));

        let use_case = GetTransactionDetailsUseCase::new(Arc::new(mock_repo));
        let result = use_case.execute(transaction_id).await;

        assert_eq!(
            result.unwrap_err(),
            LedgerError::TransactionNotFound(transaction_id)
        );
    }

    #[tokio::test]
    async fn test_get_transaction_details_includes_entries() {
        let mut mock_repo = MockTransactionRepository::new();

        let transaction = Transaction::new(
            TransactionKind::Bonus,
            WalletId::new(),
            WalletId::new(),
            dec!(50),
            Some("k6".to_string()),
            None,
            None,
            serde_json::json!({ "reason": "referral" }),
        )
        .unwrap();
        let transaction_id = transaction.id;

        mock_repo
            .expect_find_by_id()
            .with(eq(transaction_id))
            .times(1)
            .returning(move |_| Ok(Some(transaction.clone())));
        mock_repo
            .expect_entries_for()
            .with(eq(transaction_id))
            .times(1)
            .returning(|_| Ok(vec![]));

        let use_case = GetTransactionDetailsUseCase::new(Arc::new(mock_repo));
        let result = use_case.execute(transaction_id).await.unwrap();

        assert_eq!(result.transaction.id, transaction_id);
        assert_eq!(result.transaction.metadata["reason"], "referral");
    }
}
