use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::api::response::{ErrorBody, ErrorResponse};
use crate::domain::error::LedgerError;

/// Error unificado de la capa API: una falla de dominio más el request id
/// que el middleware asignó a la petición.
pub struct ApiError {
    pub error: LedgerError,
    pub request_id: String,
}

impl ApiError {
    pub fn new(error: LedgerError, request_id: impl Into<String>) -> Self {
        Self {
            error,
            request_id: request_id.into(),
        }
    }
}

/// Status HTTP para cada clase de falla de la taxonomía.
pub fn status_for(error: &LedgerError) -> StatusCode {
    match error {
        LedgerError::WalletNotFound(_) | LedgerError::TransactionNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        LedgerError::InactiveWallet(_)
        | LedgerError::AssetMismatch
        | LedgerError::DuplicateIdempotencyKey(_)
        | LedgerError::Conflict(_) => StatusCode::CONFLICT,
        LedgerError::InsufficientFunds { .. }
        | LedgerError::Validation(_)
        | LedgerError::ConstraintViolation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        LedgerError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        LedgerError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Construye el sobre de error estándar para una falla de dominio.
///
/// Las fallas no operacionales (`Repository`) se loguean con el request id y
/// devuelven un mensaje genérico en builds de release; el detalle real solo
/// se expone en desarrollo.
pub fn error_envelope(error: &LedgerError, request_id: &str) -> (StatusCode, ErrorResponse) {
    let status = status_for(error);

    let details = match error {
        LedgerError::InsufficientFunds {
            available,
            required,
            ..
        } => Some(json!({ "available": available, "required": required })),
        _ => None,
    };

    let message = match error {
        LedgerError::Repository(detail) => {
            tracing::error!(request_id = %request_id, error = %detail, "Unhandled repository error");
            if cfg!(debug_assertions) {
                detail.clone()
            } else {
                "Internal server error".to_string()
            }
        }
        other => other.to_string(),
    };

    let envelope = ErrorResponse {
        success: false,
        error: ErrorBody {
            code: error.code().to_string(),
            message,
            details,
        },
        request_id: request_id.to_string(),
    };

    (status, envelope)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, envelope) = error_envelope(&self.error, &self.request_id);
        (status, Json(envelope)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::WalletId;
    use rust_decimal_macros::dec;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&LedgerError::WalletNotFound(WalletId::new())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(status_for(&LedgerError::AssetMismatch), StatusCode::CONFLICT);
        assert_eq!(
            status_for(&LedgerError::InsufficientFunds {
                wallet: WalletId::new(),
                available: dec!(1),
                required: dec!(2),
            }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(&LedgerError::RateLimited),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            status_for(&LedgerError::Repository("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_insufficient_funds_envelope_carries_amounts() {
        let error = LedgerError::InsufficientFunds {
            wallet: WalletId::new(),
            available: dec!(600),
            required: dec!(9999),
        };
        let (status, envelope) = error_envelope(&error, "req-1");

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(envelope.error.code, "INSUFFICIENT_FUNDS");
        let details = envelope.error.details.unwrap();
        assert_eq!(details["available"], serde_json::json!(dec!(600)));
        assert_eq!(details["required"], serde_json::json!(dec!(9999)));
        assert_eq!(envelope.request_id, "req-1");
    }
}
