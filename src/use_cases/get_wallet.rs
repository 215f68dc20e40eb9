use crate::domain::{
    entities::Wallet, error::LedgerError, repository::WalletRepository, types::WalletId,
};
use std::sync::Arc;

/// Caso de uso para obtener los detalles de una billetera en particular.
///
/// Encapsula la lógica necesaria para consultar una única billetera y
/// devolver un error `LedgerError::WalletNotFound` estándar si la base de
/// datos no arroja resultados. Sirve tanto la vista de detalle como la de
/// saldo (la capa API decide qué campos proyectar).
#[derive(Clone)]
pub struct GetWalletUseCase {
    wallet_repo: Arc<dyn WalletRepository>,
}

impl GetWalletUseCase {
    /// Construye una nueva instancia de `GetWalletUseCase`.
    ///
    /// Se le inyecta una implementación de `WalletRepository` utilizando
    /// `Arc<dyn ...>` para permitir su uso seguro en entornos multihilo.
    pub fn new(wallet_repo: Arc<dyn WalletRepository>) -> Self {
        Self { wallet_repo }
    }

    /// Ejecuta el caso de uso para obtener una billetera específica.
    ///
    /// # Argumentos
    ///
    /// * `wallet_id` - El identificador único (`Uuid`) de la billetera.
    ///
    /// # Retornos
    ///
    /// Devuelve un `Result<Wallet, LedgerError>`. Si la billetera existe,
    /// se retorna satisfactoriamente; si no, `LedgerError::WalletNotFound`.
    #[tracing::instrument(name = "GetWalletUseCase::execute", skip(self))]
    pub async fn execute(&self, wallet_id: WalletId) -> Result<Wallet, LedgerError> {
        self.wallet_repo
            .find_by_id(wallet_id)
            .await?
            .ok_or(LedgerError::WalletNotFound(wallet_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::OwnerKind;
    use crate::domain::repository::MockWalletRepository;
    use crate::domain::types::AssetTypeId;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn sample_wallet(id: WalletId) -> Wallet {
        let now = Utc::now();
        Wallet {
            id,
            owner_id: Uuid::new_v4(),
            owner_kind: OwnerKind::User,
            asset_type_id: AssetTypeId::new(),
            balance: dec!(500),
            is_active: true,
            name: "alice TC wallet".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_get_wallet_success() {
        let mut mock_repo = MockWalletRepository::new();
        let wallet_id = WalletId::new();

        mock_repo
            .expect_find_by_id()
            .with(mockall::predicate::eq(wallet_id))
            .times(1)
            .returning(move |id| Ok(Some(sample_wallet(id))));

        let use_case = GetWalletUseCase::new(Arc::new(mock_repo));
        let result = use_case.execute(wallet_id).await;

        assert!(result.is_ok());
        let wallet = result.unwrap();
        assert_eq!(wallet.id, wallet_id);
        assert_eq!(wallet.balance, dec!(500));
    }

    #[tokio::test]
    async fn test_get_wallet_not_found() {
        let mut mock_repo = MockWalletRepository::new();
        let wallet_id = WalletId::new();

        mock_repo
            .expect_find_by_id()
            .with(mockall::predicate::eq(wallet_id))
            .times(1)
            .returning(|_| Ok(None));

        let use_case = GetWalletUseCase::new(Arc::new(mock_repo));
        let result = use_case.execute(wallet_id).await;

        assert_eq!(result.unwrap_err(), LedgerError::WalletNotFound(wallet_id));
    }

    #[tokio::test]
    async fn test_get_wallet_repository_error() {
        let mut mock_repo = MockWalletRepository::new();
        let wallet_id = WalletId::new();

        mock_repo
            .expect_find_by_id()
            .times(1)
            .returning(|_| Err(LedgerError::Repository("DB disconnected".to_string())));

        let use_case = GetWalletUseCase::new(Arc::new(mock_repo));
        let result = use_case.execute(wallet_id).await;

        assert!(matches!(result, Err(LedgerError::Repository(_))));
    }
}
