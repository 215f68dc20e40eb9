//! Frontera de idempotencia de los endpoints de mutación.
//!
//! Envuelve cada mutación como una etapa de pipeline sobre el sobre de
//! respuesta tratado como valor: consulta el almacén antes de invocar el
//! flujo (replay byte a byte en hit) y, en miss, ejecuta el flujo y guarda el
//! sobre resultante cuando el status es < 500. Las respuestas 5xx nunca se
//! cachean: el cliente puede reintentar con la misma clave sin riesgo.

use axum::{
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::api::error::error_envelope;
use crate::api::http_routes::AppState;
use crate::api::response::ApiResponse;
use crate::api::views::TransactionView;
use crate::domain::entities::IdempotencyRecord;
use crate::domain::error::LedgerError;
use crate::use_cases::process_transaction::TransferCommand;

pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";
pub const REPLAYED_HEADER: &str = "x-idempotency-replayed";

/// Extrae y valida el header `Idempotency-Key`.
///
/// Obligatorio en toda mutación: cualquier string opaco no vacío de hasta
/// 255 caracteres. La identidad de replay es `(clave, path)`.
fn require_idempotency_key(headers: &HeaderMap) -> Result<String, LedgerError> {
    let key = headers
        .get(IDEMPOTENCY_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .unwrap_or_default();

    if key.is_empty() {
        return Err(LedgerError::Validation(
            "Idempotency-Key header is required".to_string(),
        ));
    }
    if key.len() > 255 {
        return Err(LedgerError::Validation(
            "Idempotency-Key must be at most 255 characters".to_string(),
        ));
    }

    Ok(key.to_string())
}

/// Ejecuta una mutación bajo el protocolo de idempotencia.
///
/// 1. Sin clave válida -> VALIDATION_ERROR, nada se cachea.
/// 2. Hit en el almacén -> responde el sobre guardado tal cual, con
///    `X-Idempotency-Replayed: true`; el flujo de mutación no corre.
/// 3. Miss -> corre el flujo, arma el sobre y lo guarda (best-effort) si el
///    status es < 500.
///
/// Una falla del almacén degrada a "sin cache": la clave única sobre
/// `transactions.idempotency_key` sigue garantizando una sola transacción
/// por clave.
pub async fn run_idempotent(
    state: &AppState,
    headers: &HeaderMap,
    request_path: &'static str,
    request_id: &str,
    mut command: TransferCommand,
) -> Response {
    let key = match require_idempotency_key(headers) {
        Ok(key) => key,
        Err(error) => {
            let (status, envelope) = error_envelope(&error, request_id);
            return (status, Json(envelope)).into_response();
        }
    };

    match state.idempotency_repo.find(&key, request_path).await {
        Ok(Some(record)) => {
            let status = StatusCode::from_u16(record.response_status as u16)
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            return (
                status,
                [(REPLAYED_HEADER, "true")],
                Json(record.response_body),
            )
                .into_response();
        }
        Ok(None) => {}
        Err(error) => {
            tracing::warn!(
                request_id = %request_id,
                error = %error,
                "Idempotency lookup failed, proceeding without response cache"
            );
        }
    }

    command.idempotency_key = Some(key.clone());
    let result = state.process_transaction_use_case.execute(command).await;

    let (status, body) = match result {
        Ok(receipt) => {
            let envelope = ApiResponse::success(TransactionView::from(receipt));
            let body = serde_json::to_value(envelope).unwrap_or_default();
            (StatusCode::CREATED, body)
        }
        Err(error) => {
            let (status, envelope) = error_envelope(&error, request_id);
            let body = serde_json::to_value(envelope).unwrap_or_default();
            (status, body)
        }
    };

    if status.as_u16() < 500 {
        let record = IdempotencyRecord::new(
            key,
            request_path.to_string(),
            status.as_u16() as i32,
            body.clone(),
            state.idempotency_ttl,
        );
        if let Err(error) = state.idempotency_repo.save(record).await {
            tracing::warn!(
                request_id = %request_id,
                error = %error,
                "Failed to store idempotent response"
            );
        }
    }

    (status, Json(body)).into_response()
}
