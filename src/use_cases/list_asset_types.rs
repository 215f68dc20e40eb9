use crate::domain::{entities::AssetType, error::LedgerError, repository::AssetTypeRepository};
use std::sync::Arc;

/// Caso de uso para listar los tipos de activo registrados.
#[derive(Clone)]
pub struct ListAssetTypesUseCase {
    asset_type_repo: Arc<dyn AssetTypeRepository>,
}

impl ListAssetTypesUseCase {
    pub fn new(asset_type_repo: Arc<dyn AssetTypeRepository>) -> Self {
        Self { asset_type_repo }
    }

    #[tracing::instrument(name = "ListAssetTypesUseCase::execute", skip(self))]
    pub async fn execute(&self) -> Result<Vec<AssetType>, LedgerError> {
        self.asset_type_repo.list().await
    }
}
