use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::entities::{
    AssetType, EntrySide, LedgerEntry, OwnerKind, Transaction, TransactionKind, TransactionStatus,
    TransactionWithEntries, Wallet,
};
use crate::domain::types::{AssetTypeId, LedgerEntryId, TransactionId, WalletId};

// DTOs de salida del API. Proyecciones planas de las entidades de dominio,
// en camelCase como exige el contrato del wire.

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetTypeView {
    pub id: AssetTypeId,
    pub name: String,
    pub symbol: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<AssetType> for AssetTypeView {
    fn from(a: AssetType) -> Self {
        Self {
            id: a.id,
            name: a.name,
            symbol: a.symbol,
            description: a.description,
            is_active: a.is_active,
            created_at: a.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WalletView {
    pub id: WalletId,
    pub owner_id: Uuid,
    pub owner_kind: OwnerKind,
    pub asset_type_id: AssetTypeId,
    pub balance: Decimal,
    pub is_active: bool,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Wallet> for WalletView {
    fn from(w: Wallet) -> Self {
        Self {
            id: w.id,
            owner_id: w.owner_id,
            owner_kind: w.owner_kind,
            asset_type_id: w.asset_type_id,
            balance: w.balance,
            is_active: w.is_active,
            name: w.name,
            created_at: w.created_at,
            updated_at: w.updated_at,
        }
    }
}

/// Vista reducida para `GET /wallets/{id}/balance`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BalanceView {
    pub wallet_id: WalletId,
    pub asset_type_id: AssetTypeId,
    pub balance: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl From<Wallet> for BalanceView {
    fn from(w: Wallet) -> Self {
        Self {
            wallet_id: w.id,
            asset_type_id: w.asset_type_id,
            balance: w.balance,
            updated_at: w.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntryView {
    pub id: LedgerEntryId,
    pub transaction_id: TransactionId,
    pub wallet_id: WalletId,
    pub side: EntrySide,
    pub amount: Decimal,
    pub balance_before: Decimal,
    pub balance_after: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<LedgerEntry> for LedgerEntryView {
    fn from(e: LedgerEntry) -> Self {
        Self {
            id: e.id,
            transaction_id: e.transaction_id,
            wallet_id: e.wallet_id,
            side: e.side,
            amount: e.amount,
            balance_before: e.balance_before,
            balance_after: e.balance_after,
            created_at: e.created_at,
        }
    }
}

/// Vista de transacción. `entries` solo se incluye en el detalle y en las
/// respuestas de mutación; el historial paginado la omite.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionView {
    pub id: TransactionId,
    pub kind: TransactionKind,
    pub status: TransactionStatus,
    pub user_wallet_id: WalletId,
    pub system_wallet_id: WalletId,
    pub amount: Decimal,
    pub reference_id: Option<String>,
    pub idempotency_key: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Object)]
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entries: Option<Vec<LedgerEntryView>>,
}

impl From<Transaction> for TransactionView {
    fn from(t: Transaction) -> Self {
        Self {
            id: t.id,
            kind: t.kind,
            status: t.status,
            user_wallet_id: t.user_wallet_id,
            system_wallet_id: t.system_wallet_id,
            amount: t.amount,
            reference_id: t.reference_id,
            idempotency_key: t.idempotency_key,
            description: t.description,
            metadata: t.metadata,
            created_at: t.created_at,
            updated_at: t.updated_at,
            entries: None,
        }
    }
}

impl From<TransactionWithEntries> for TransactionView {
    fn from(t: TransactionWithEntries) -> Self {
        let entries = t.entries.into_iter().map(LedgerEntryView::from).collect();
        let mut view = TransactionView::from(t.transaction);
        view.entries = Some(entries);
        view
    }
}
