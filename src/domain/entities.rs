use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::error::LedgerError;
use crate::domain::types::{AssetTypeId, LedgerEntryId, TransactionId, WalletId};

/// Dueño de una billetera: un usuario final o un rol del sistema
/// (tesorería, pozo de bonos, cuenta de ingresos).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "owner_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OwnerKind {
    User,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "transaction_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Topup,
    Bonus,
    Spend,
}

impl TransactionKind {
    /// Política por flujo: decide qué billetera se debita (origen) y cuál se
    /// acredita (destino).
    ///
    /// * `topup` y `bonus` emiten créditos desde una billetera del sistema
    ///   (tesorería / pozo de bonos) hacia el usuario.
    /// * `spend` quema créditos del usuario hacia la cuenta de ingresos.
    ///
    /// # Examples
    /// ```
    /// use ledger_service::domain::entities::TransactionKind;
    /// use ledger_service::domain::types::WalletId;
    ///
    /// let user = WalletId::new();
    /// let system = WalletId::new();
    ///
    /// assert_eq!(TransactionKind::Topup.source_and_target(user, system), (system, user));
    /// assert_eq!(TransactionKind::Spend.source_and_target(user, system), (user, system));
    /// ```
    pub fn source_and_target(&self, user_wallet: WalletId, system_wallet: WalletId) -> (WalletId, WalletId) {
        match self {
            TransactionKind::Topup | TransactionKind::Bonus => (system_wallet, user_wallet),
            TransactionKind::Spend => (user_wallet, system_wallet),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "transaction_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "entry_side", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EntrySide {
    Debit,
    Credit,
}

/// Modelo de Entidad: AssetType.
/// Una clase de moneda virtual (créditos de juego, puntos de lealtad).
/// Se siembra una vez y es referencialmente inmutable cuando existen
/// billeteras que la apuntan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetType {
    pub id: AssetTypeId,
    pub name: String,
    pub symbol: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Modelo de Entidad: Wallet.
/// Titular de saldo de exactamente un tipo de activo. El saldo solo lo muta
/// el motor de flujos bajo un lock exclusivo de fila; nunca es negativo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
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

impl Wallet {
    /// Indica si el saldo actual cubre el monto a debitar.
    pub fn can_cover(&self, amount: Decimal) -> bool {
        self.balance >= amount
    }
}

/// Modelo de Entidad: Transaction.
/// Un evento de negocio (topup / bonus / spend). Nace `pending` y se promueve
/// a `completed` únicamente cuando sus dos asientos contables existen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
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

impl Transaction {
    /// Construye una transacción `pending` válida.
    ///
    /// Delegamos aquí la validación de "forma" (monto positivo, billeteras
    /// distintas) para que la capa de aplicación nunca trabaje con una
    /// estructura `Transaction` inválida.
    ///
    /// # Examples
    /// ```
    /// use ledger_service::domain::entities::{Transaction, TransactionKind};
    /// use ledger_service::domain::types::WalletId;
    /// use rust_decimal::Decimal;
    ///
    /// let tx = Transaction::new(
    ///     TransactionKind::Topup,
    ///     WalletId::new(),
    ///     WalletId::new(),
    ///     Decimal::from(100),
    ///     Some("k1".to_string()),
    ///     Some("stripe-111".to_string()),
    ///     None,
    ///     serde_json::json!({}),
    /// );
    /// assert!(tx.is_ok());
    /// ```
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        kind: TransactionKind,
        user_wallet_id: WalletId,
        system_wallet_id: WalletId,
        amount: Decimal,
        idempotency_key: Option<String>,
        reference_id: Option<String>,
        description: Option<String>,
        metadata: serde_json::Value,
    ) -> Result<Self, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::Validation(
                "amount must be greater than zero".to_string(),
            ));
        }

        if user_wallet_id == system_wallet_id {
            return Err(LedgerError::Validation(
                "user wallet and system wallet must differ".to_string(),
            ));
        }

        if let Some(key) = &idempotency_key {
            if key.trim().is_empty() || key.len() > 255 {
                return Err(LedgerError::Validation(
                    "idempotency key must be a non-empty string of at most 255 characters"
                        .to_string(),
                ));
            }
        }

        let now = Utc::now();
        Ok(Self {
            id: TransactionId::new(),
            kind,
            status: TransactionStatus::Pending,
            user_wallet_id,
            system_wallet_id,
            amount,
            reference_id,
            idempotency_key,
            description,
            metadata,
            created_at: now,
            updated_at: now,
        })
    }

    /// Billetera origen (débito) y destino (crédito) según la política del flujo.
    pub fn source_and_target(&self) -> (WalletId, WalletId) {
        self.kind
            .source_and_target(self.user_wallet_id, self.system_wallet_id)
    }
}

/// Modelo de Entidad: LedgerEntry.
/// Asiento inmutable de una partida (débito o crédito) contra una billetera,
/// con la foto del saldo antes y después.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: LedgerEntryId,
    pub transaction_id: TransactionId,
    pub wallet_id: WalletId,
    pub side: EntrySide,
    pub amount: Decimal,
    pub balance_before: Decimal,
    pub balance_after: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Una transacción completada junto con sus dos asientos, tal como se
/// devuelve al cliente (y tal como se re-sirve en un replay idempotente).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionWithEntries {
    pub transaction: Transaction,
    pub entries: Vec<LedgerEntry>,
}

/// Registro de respuesta cacheada para replays idempotentes.
#[derive(Debug, Clone)]
pub struct IdempotencyRecord {
    pub id: Uuid,
    pub key: String,
    pub request_path: String,
    pub response_status: i32,
    pub response_body: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl IdempotencyRecord {
    pub fn new(
        key: String,
        request_path: String,
        response_status: i32,
        response_body: serde_json::Value,
        ttl: chrono::Duration,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            key,
            request_path,
            response_status,
            response_body,
            created_at: now,
            expires_at: now + ttl,
        }
    }
}

/// Precondiciones de una transferencia sobre las dos filas ya bloqueadas.
///
/// Debe ejecutarse DENTRO de la transacción de BD, después de adquirir los
/// locks de fila: solo así el chequeo de saldo es firme hasta el commit.
/// El orden de los chequeos determina qué falla se reporta cuando hay varias.
pub fn validate_transfer(
    source: &Wallet,
    target: &Wallet,
    amount: Decimal,
) -> Result<(), LedgerError> {
    if !source.is_active {
        return Err(LedgerError::InactiveWallet(source.id));
    }
    if !target.is_active {
        return Err(LedgerError::InactiveWallet(target.id));
    }

    if source.asset_type_id != target.asset_type_id {
        return Err(LedgerError::AssetMismatch);
    }

    if amount <= Decimal::ZERO {
        return Err(LedgerError::Validation(
            "amount must be greater than zero".to_string(),
        ));
    }

    if source.id == target.id {
        return Err(LedgerError::Validation(
            "source and target wallets must differ".to_string(),
        ));
    }

    if !source.can_cover(amount) {
        return Err(LedgerError::InsufficientFunds {
            wallet: source.id,
            available: source.balance,
            required: amount,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn wallet(kind: OwnerKind, asset: AssetTypeId, balance: Decimal, active: bool) -> Wallet {
        let now = Utc::now();
        Wallet {
            id: WalletId::new(),
            owner_id: Uuid::new_v4(),
            owner_kind: kind,
            asset_type_id: asset,
            balance,
            is_active: active,
            name: "test wallet".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[rstest]
    #[case(dec!(0))]
    #[case(dec!(-1))]
    #[case(dec!(-0.000001))]
    fn test_transaction_rejects_non_positive_amount(#[case] amount: Decimal) {
        let result = Transaction::new(
            TransactionKind::Topup,
            WalletId::new(),
            WalletId::new(),
            amount,
            Some("k1".to_string()),
            None,
            None,
            serde_json::json!({}),
        );

        assert!(matches!(result, Err(LedgerError::Validation(_))));
    }

    #[test]
    fn test_transaction_rejects_same_wallet() {
        let wallet_id = WalletId::new();
        let result = Transaction::new(
            TransactionKind::Spend,
            wallet_id,
            wallet_id,
            dec!(10),
            Some("k1".to_string()),
            None,
            None,
            serde_json::json!({}),
        );

        assert!(matches!(result, Err(LedgerError::Validation(_))));
    }

    #[test]
    fn test_transaction_rejects_oversized_idempotency_key() {
        let result = Transaction::new(
            TransactionKind::Topup,
            WalletId::new(),
            WalletId::new(),
            dec!(10),
            Some("k".repeat(256)),
            None,
            None,
            serde_json::json!({}),
        );

        assert!(matches!(result, Err(LedgerError::Validation(_))));
    }

    #[test]
    fn test_kind_policy_directions() {
        let user = WalletId::new();
        let system = WalletId::new();

        assert_eq!(
            TransactionKind::Topup.source_and_target(user, system),
            (system, user)
        );
        assert_eq!(
            TransactionKind::Bonus.source_and_target(user, system),
            (system, user)
        );
        assert_eq!(
            TransactionKind::Spend.source_and_target(user, system),
            (user, system)
        );
    }

    #[test]
    fn test_validate_transfer_happy_path_exact_balance() {
        let asset = AssetTypeId::new();
        let source = wallet(OwnerKind::User, asset, dec!(60), true);
        let target = wallet(OwnerKind::System, asset, dec!(0), true);

        // Saldo exactamente igual al monto: debe pasar.
        assert!(validate_transfer(&source, &target, dec!(60)).is_ok());
    }

    #[test]
    fn test_validate_transfer_insufficient_funds_carries_amounts() {
        let asset = AssetTypeId::new();
        let source = wallet(OwnerKind::User, asset, dec!(600), true);
        let target = wallet(OwnerKind::System, asset, dec!(0), true);

        let err = validate_transfer(&source, &target, dec!(9999)).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientFunds {
                wallet: source.id,
                available: dec!(600),
                required: dec!(9999),
            }
        );
    }

    #[test]
    fn test_validate_transfer_asset_mismatch() {
        let source = wallet(OwnerKind::User, AssetTypeId::new(), dec!(100), true);
        let target = wallet(OwnerKind::System, AssetTypeId::new(), dec!(0), true);

        assert_eq!(
            validate_transfer(&source, &target, dec!(10)).unwrap_err(),
            LedgerError::AssetMismatch
        );
    }

    #[test]
    fn test_validate_transfer_inactive_wallet() {
        let asset = AssetTypeId::new();
        let source = wallet(OwnerKind::User, asset, dec!(100), false);
        let target = wallet(OwnerKind::System, asset, dec!(0), true);

        assert_eq!(
            validate_transfer(&source, &target, dec!(10)).unwrap_err(),
            LedgerError::InactiveWallet(source.id)
        );
    }
}
