use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::entities::{
    AssetType, EntrySide, IdempotencyRecord, LedgerEntry, OwnerKind, Transaction, TransactionKind,
    TransactionStatus, Wallet,
};
use crate::domain::types::{AssetTypeId, LedgerEntryId, TransactionId, WalletId};

// Modelo de Base de Datos para AssetType (especifico de SQLx)
// Representa la tabla 'asset_types' en PostgreSQL.
#[derive(Debug, FromRow)]
pub struct AssetTypeModel {
    pub id: AssetTypeId,
    pub name: String,
    pub symbol: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AssetTypeModel> for AssetType {
    fn from(m: AssetTypeModel) -> Self {
        Self {
            id: m.id,
            name: m.name,
            symbol: m.symbol,
            description: m.description,
            is_active: m.is_active,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

// Modelo de Base de Datos para Wallet. Representa la tabla 'wallets'.
#[derive(Debug, FromRow)]
pub struct WalletModel {
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

// Conversión Modelo -> Dominio
// Permite reconstruir la entidad de dominio al leer de la base de datos.
impl From<WalletModel> for Wallet {
    fn from(m: WalletModel) -> Self {
        Self {
            id: m.id,
            owner_id: m.owner_id,
            owner_kind: m.owner_kind,
            asset_type_id: m.asset_type_id,
            balance: m.balance,
            is_active: m.is_active,
            name: m.name,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

// Modelo de Base de Datos para Transaction. Representa la tabla 'transactions'.
#[derive(Debug, FromRow)]
pub struct TransactionModel {
    pub id: TransactionId,
    pub kind: TransactionKind,
    pub status: TransactionStatus,
    pub user_wallet_id: WalletId,
    pub system_wallet_id: WalletId,
    pub amount: Decimal,
    pub reference_id: Option<String>,
    pub idempotency_key: Option<String>,
    pub description: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Conversión Dominio -> Modelo (Eficiente: Move Semantics)
// Consumimos la entidad para mover los Strings y el metadata sin clones.
impl From<Transaction> for TransactionModel {
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
        }
    }
}

impl From<TransactionModel> for Transaction {
    fn from(m: TransactionModel) -> Self {
        Self {
            id: m.id,
            kind: m.kind,
            status: m.status,
            user_wallet_id: m.user_wallet_id,
            system_wallet_id: m.system_wallet_id,
            amount: m.amount,
            reference_id: m.reference_id,
            idempotency_key: m.idempotency_key,
            description: m.description,
            metadata: m.metadata,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

// Modelo de Base de Datos para LedgerEntry. Representa la tabla 'ledger_entries'.
#[derive(Debug, FromRow)]
pub struct LedgerEntryModel {
    pub id: LedgerEntryId,
    pub transaction_id: TransactionId,
    pub wallet_id: WalletId,
    pub side: EntrySide,
    pub amount: Decimal,
    pub balance_before: Decimal,
    pub balance_after: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<LedgerEntryModel> for LedgerEntry {
    fn from(m: LedgerEntryModel) -> Self {
        Self {
            id: m.id,
            transaction_id: m.transaction_id,
            wallet_id: m.wallet_id,
            side: m.side,
            amount: m.amount,
            balance_before: m.balance_before,
            balance_after: m.balance_after,
            created_at: m.created_at,
        }
    }
}

// Modelo de Base de Datos para IdempotencyRecord. Tabla 'idempotency_keys'.
#[derive(Debug, FromRow)]
pub struct IdempotencyModel {
    pub id: Uuid,
    pub key: String,
    pub request_path: String,
    pub response_status: i32,
    pub response_body: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl From<IdempotencyModel> for IdempotencyRecord {
    fn from(m: IdempotencyModel) -> Self {
        Self {
            id: m.id,
            key: m.key,
            request_path: m.request_path,
            response_status: m.response_status,
            response_body: m.response_body,
            created_at: m.created_at,
            expires_at: m.expires_at,
        }
    }
}
