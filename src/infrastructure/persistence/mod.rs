pub mod asset_type_repository;
pub mod idempotency_repository;
pub mod ledger_repository;
pub mod models;
pub mod transaction_repository;
pub mod wallet_repository;

use crate::domain::error::LedgerError;

/// Traducción de fallas del datastore a la taxonomía del dominio.
///
/// * Violación de unicidad no clasificada antes -> `Conflict`.
/// * Violación de CHECK (en particular el saldo no negativo) -> `ConstraintViolation`.
/// * Cualquier otra cosa -> `Repository` (el cliente recibe un 500 genérico).
pub(crate) fn map_db_error(e: sqlx::Error) -> LedgerError {
    if let sqlx::Error::Database(db) = &e {
        match db.kind() {
            sqlx::error::ErrorKind::UniqueViolation => {
                return LedgerError::Conflict(db.message().to_string());
            }
            sqlx::error::ErrorKind::CheckViolation => {
                if db.constraint() == Some("wallets_balance_non_negative") {
                    return LedgerError::ConstraintViolation(
                        "wallet balance would become negative".to_string(),
                    );
                }
                return LedgerError::ConstraintViolation(db.message().to_string());
            }
            _ => {}
        }
    }
    LedgerError::Repository(e.to_string())
}
