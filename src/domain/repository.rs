use crate::domain::entities::{
    AssetType, IdempotencyRecord, LedgerEntry, OwnerKind, Transaction, TransactionWithEntries,
    Wallet,
};
use crate::domain::error::LedgerError;
use crate::domain::types::{TransactionId, WalletId};
use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

// Interface (Port) for AssetType persistence
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AssetTypeRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<AssetType>, LedgerError>;
}

// Interface (Port) for Wallet persistence (solo lecturas: el saldo lo muta
// exclusivamente el LedgerRepository bajo lock de fila)
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WalletRepository: Send + Sync {
    async fn find_by_id(&self, id: WalletId) -> Result<Option<Wallet>, LedgerError>;
    async fn list(
        &self,
        owner_kind: Option<OwnerKind>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Wallet>, LedgerError>;
    async fn count(&self, owner_kind: Option<OwnerKind>) -> Result<i64, LedgerError>;
}

// Interface (Port) for Transaction reads
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn find_by_id(&self, id: TransactionId) -> Result<Option<Transaction>, LedgerError>;
    async fn find_by_idempotency_key(&self, key: &str)
        -> Result<Option<Transaction>, LedgerError>;
    async fn find_by_wallet_id(
        &self,
        wallet_id: WalletId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Transaction>, LedgerError>;
    async fn count_by_wallet_id(&self, wallet_id: WalletId) -> Result<i64, LedgerError>;
    /// Asientos de una transacción, ordenados por `created_at` ascendente.
    async fn entries_for(&self, id: TransactionId) -> Result<Vec<LedgerEntry>, LedgerError>;
}

// Interface (Port) for the transactional mutation engine.
//
// Una sola operación: ejecuta la transferencia completa (lock de ambas
// billeteras en orden canónico, validaciones de precondición, fila de
// transacción, débito + crédito con asientos, promoción a `completed`)
// dentro de UNA transacción de base de datos que commitea o revierte entera.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    async fn execute_transfer(
        &self,
        transaction: Transaction,
    ) -> Result<TransactionWithEntries, LedgerError>;
}

// Interface (Port) for the idempotency response cache
#[cfg_attr(test, automock)]
#[async_trait]
pub trait IdempotencyRepository: Send + Sync {
    /// Devuelve el registro para `(key, path)` si existe y no expiró.
    async fn find(
        &self,
        key: &str,
        request_path: &str,
    ) -> Result<Option<IdempotencyRecord>, LedgerError>;
    /// Inserción best-effort: ante conflicto en `(key, path)` conserva la fila existente.
    async fn save(&self, record: IdempotencyRecord) -> Result<(), LedgerError>;
    /// Poda registros expirados; devuelve cuántos eliminó.
    async fn delete_expired(&self) -> Result<u64, LedgerError>;
}
