use crate::domain::{
    entities::Transaction,
    error::LedgerError,
    repository::{TransactionRepository, WalletRepository},
    types::WalletId,
};
use crate::use_cases::list_wallets::Page;
use std::sync::Arc;

/// Caso de uso para obtener el historial de transacciones de una billetera.
///
/// Verifica primero que la billetera exista (una billetera desconocida debe
/// producir `WalletNotFound`, no una página vacía) y luego delega la lectura
/// paginada al `TransactionRepository`.
#[derive(Clone)]
pub struct GetWalletHistoryUseCase {
    wallet_repo: Arc<dyn WalletRepository>,
    transaction_repo: Arc<dyn TransactionRepository>,
}

impl GetWalletHistoryUseCase {
    /// Construye una nueva instancia de `GetWalletHistoryUseCase`.
    pub fn new(
        wallet_repo: Arc<dyn WalletRepository>,
        transaction_repo: Arc<dyn TransactionRepository>,
    ) -> Self {
        Self {
            wallet_repo,
            transaction_repo,
        }
    }

    /// Ejecuta la lectura paginada del historial.
    ///
    /// # Argumentos
    ///
    /// * `wallet_id` - El identificador único (`Uuid`) de la billetera.
    /// * `page`      - Número de página, base 1.
    /// * `limit`     - Tamaño de página.
    ///
    /// # Retornos
    ///
    /// Una página de `Transaction`s (posiblemente vacía) ordenada de la más
    /// reciente a la más antigua, o `WalletNotFound` si la billetera no existe.
    #[tracing::instrument(name = "GetWalletHistoryUseCase::execute", skip(self))]
    pub async fn execute(
        &self,
        wallet_id: WalletId,
        page: i64,
        limit: i64,
    ) -> Result<Page<Transaction>, LedgerError> {
        self.wallet_repo
            .find_by_id(wallet_id)
            .await?
            .ok_or(LedgerError::WalletNotFound(wallet_id))?;

        let offset = (page - 1) * limit;
        let items = self
            .transaction_repo
            .find_by_wallet_id(wallet_id, limit, offset)
            .await?;
        let total = self.transaction_repo.count_by_wallet_id(wallet_id).await?;

        Ok(Page { items, total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{OwnerKind, Wallet};
    use crate::domain::repository::{MockTransactionRepository, MockWalletRepository};
    use crate::domain::types::AssetTypeId;
    use chrono::Utc;
    use mockall::predicate::*;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn sample_wallet(id: WalletId) -> Wallet {
        let now = Utc::now();
        Wallet {
            id,
            owner_id: Uuid::new_v4(),
            owner_kind: OwnerKind::User,
            asset_type_id: AssetTypeId::new(),
            balance: dec!(100),
            is_active: true,
            name: "bob TC wallet".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_history_unknown_wallet_is_not_found() {
        let mut mock_wallets = MockWalletRepository::new();
        let mock_transactions = MockTransactionRepository::new();
        let wallet_id = WalletId::new();

        mock_wallets
            .expect_find_by_id()
            .with(eq(wallet_id))
            .times(1)
            .returning(|_| Ok(None));

        let use_case =
            GetWalletHistoryUseCase::new(Arc::new(mock_wallets), Arc::new(mock_transactions));
        let result = use_case.execute(wallet_id, 1, 20).await;

        assert_eq!(result.unwrap_err(), LedgerError::WalletNotFound(wallet_id));
    }

    #[tokio::test]
    async fn test_history_returns_page_and_total() {
        let mut mock_wallets = MockWalletRepository::new();
        let mut mock_transactions = MockTransactionRepository::new();
        let wallet_id = WalletId::new();

        mock_wallets
            .expect_find_by_id()
            .with(eq(wallet_id))
            .times(1)
            .returning(move |id| Ok(Some(sample_wallet(id))));
        mock_transactions
            .expect_find_by_wallet_id()
            .with(eq(wallet_id), eq(10i64), eq(10i64))
            .times(1)
            .returning(|_, _, _| Ok(vec![]));
        mock_transactions
            .expect_count_by_wallet_id()
            .with(eq(wallet_id))
            .times(1)
            .returning(|_| Ok(42));

        let use_case =
            GetWalletHistoryUseCase::new(Arc::new(mock_wallets), Arc::new(mock_transactions));
        let page = use_case.execute(wallet_id, 2, 10).await.unwrap();

        assert_eq!(page.total, 42);
    }
}
