use crate::domain::{
    entities::{OwnerKind, Wallet},
    error::LedgerError,
    repository::WalletRepository,
};
use std::sync::Arc;

/// Una página de resultados junto con el total de filas para armar la
/// respuesta paginada en la capa API.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}

/// Caso de uso para listar billeteras con paginación.
///
/// Permite filtrar opcionalmente por tipo de dueño (usuario / sistema).
#[derive(Clone)]
pub struct ListWalletsUseCase {
    wallet_repo: Arc<dyn WalletRepository>,
}

impl ListWalletsUseCase {
    pub fn new(wallet_repo: Arc<dyn WalletRepository>) -> Self {
        Self { wallet_repo }
    }

    /// Ejecuta el listado paginado.
    ///
    /// # Argumentos
    ///
    /// * `owner_kind` - Filtro opcional por tipo de dueño.
    /// * `page`       - Número de página, base 1.
    /// * `limit`      - Tamaño de página (la capa API lo acota a 100).
    #[tracing::instrument(name = "ListWalletsUseCase::execute", skip(self))]
    pub async fn execute(
        &self,
        owner_kind: Option<OwnerKind>,
        page: i64,
        limit: i64,
    ) -> Result<Page<Wallet>, LedgerError> {
        let offset = (page - 1) * limit;
        let items = self.wallet_repo.list(owner_kind, limit, offset).await?;
        let total = self.wallet_repo.count(owner_kind).await?;
        Ok(Page { items, total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repository::MockWalletRepository;
    use mockall::predicate::*;

    #[tokio::test]
    async fn test_list_wallets_computes_offset_from_page() {
        let mut mock_repo = MockWalletRepository::new();

        mock_repo
            .expect_list()
            .with(eq(Some(OwnerKind::User)), eq(20i64), eq(40i64))
            .times(1)
            .returning(|_, _, _| Ok(vec![]));
        mock_repo
            .expect_count()
            .with(eq(Some(OwnerKind::User)))
            .times(1)
            .returning(|_| Ok(55));

        let use_case = ListWalletsUseCase::new(Arc::new(mock_repo));
        let page = use_case
            .execute(Some(OwnerKind::User), 3, 20)
            .await
            .unwrap();

        assert!(page.items.is_empty());
        assert_eq!(page.total, 55);
    }
}
