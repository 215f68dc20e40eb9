use crate::domain::types::{TransactionId, WalletId};
use rust_decimal::Decimal;
use thiserror::Error;

/// Taxonomía de fallas operacionales del ledger.
///
/// Cada variante mapea a un código estable y a un status HTTP en la capa API
/// (`api::error`). Las fallas de infraestructura se envuelven en `Repository`
/// y nunca exponen detalles internos al cliente.
#[derive(Error, Debug, PartialEq)]
pub enum LedgerError {
    #[error("Wallet not found with ID: {0}")]
    WalletNotFound(WalletId),

    #[error("Transaction not found with ID: {0}")]
    TransactionNotFound(TransactionId),

    #[error("Wallet {0} is inactive")]
    InactiveWallet(WalletId),

    #[error("Wallets hold different asset types")]
    AssetMismatch,

    #[error("Insufficient funds in wallet {wallet}: available {available}, required {required}")]
    InsufficientFunds {
        wallet: WalletId,
        available: Decimal,
        required: Decimal,
    },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// Otra petición con la misma clave de idempotencia ganó la carrera de
    /// inserción. El motor de flujos la convierte en una relectura de la
    /// transacción ganadora; solo emerge al cliente si esa relectura falla.
    #[error("Idempotency key already used: {0}")]
    DuplicateIdempotencyKey(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    /// El CHECK de saldo no negativo rechazó un UPDATE. No debería ocurrir si
    /// la validación de saldo del motor corrió; defensa en profundidad.
    #[error("Datastore constraint violated: {0}")]
    ConstraintViolation(String),

    #[error("Repository error: {0}")]
    Repository(String),
}

impl LedgerError {
    /// Código estable del contrato de errores (§ taxonomía).
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::WalletNotFound(_) | LedgerError::TransactionNotFound(_) => "NOT_FOUND",
            LedgerError::InactiveWallet(_)
            | LedgerError::AssetMismatch
            | LedgerError::DuplicateIdempotencyKey(_)
            | LedgerError::Conflict(_) => "CONFLICT",
            LedgerError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            LedgerError::Validation(_) => "VALIDATION_ERROR",
            LedgerError::RateLimited => "RATE_LIMIT_EXCEEDED",
            LedgerError::ConstraintViolation(_) => "CONSTRAINT_VIOLATION",
            LedgerError::Repository(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(
            LedgerError::WalletNotFound(WalletId::new()).code(),
            "NOT_FOUND"
        );
        assert_eq!(
            LedgerError::InsufficientFunds {
                wallet: WalletId::new(),
                available: dec!(10),
                required: dec!(20),
            }
            .code(),
            "INSUFFICIENT_FUNDS"
        );
        assert_eq!(LedgerError::AssetMismatch.code(), "CONFLICT");
        assert_eq!(LedgerError::RateLimited.code(), "RATE_LIMIT_EXCEEDED");
        assert_eq!(
            LedgerError::Repository("db down".into()).code(),
            "INTERNAL_ERROR"
        );
    }
}
