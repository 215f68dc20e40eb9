use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::idempotency::run_idempotent;
use crate::api::middleware::{request_id, RequestId};
use crate::api::rate_limiter::{rate_limit, RateLimiter};
use crate::api::response::{ApiResponse, Pagination};
use crate::api::views::{AssetTypeView, BalanceView, TransactionView, WalletView};
use crate::domain::entities::{OwnerKind, TransactionKind};
use crate::domain::error::LedgerError;
use crate::domain::repository::IdempotencyRepository;
use crate::domain::types::{TransactionId, WalletId};
use crate::use_cases::{
    get_transaction_details::GetTransactionDetailsUseCase, get_wallet::GetWalletUseCase,
    get_wallet_history::GetWalletHistoryUseCase, list_asset_types::ListAssetTypesUseCase,
    list_wallets::ListWalletsUseCase,
    process_transaction::{ProcessTransactionUseCase, TransferCommand},
};

pub const TOPUP_PATH: &str = "/api/v1/transactions/topup";
pub const BONUS_PATH: &str = "/api/v1/transactions/bonus";
pub const SPEND_PATH: &str = "/api/v1/transactions/spend";

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

// Estado compartido de la aplicación
pub struct AppState {
    pub process_transaction_use_case: ProcessTransactionUseCase,
    pub get_transaction_details_use_case: GetTransactionDetailsUseCase,
    pub get_wallet_use_case: GetWalletUseCase,
    pub list_wallets_use_case: ListWalletsUseCase,
    pub get_wallet_history_use_case: GetWalletHistoryUseCase,
    pub list_asset_types_use_case: ListAssetTypesUseCase,
    pub idempotency_repo: Arc<dyn IdempotencyRepository>,
    pub idempotency_ttl: chrono::Duration,
    pub pool: PgPool,
}

pub fn routes(state: Arc<AppState>, rate_limiter: Arc<RateLimiter>) -> Router {
    // Solo las mutaciones pasan por el limitador de tasa.
    let mutations = Router::new()
        .route("/transactions/topup", post(topup))
        .route("/transactions/bonus", post(bonus))
        .route("/transactions/spend", post(spend))
        .layer(middleware::from_fn_with_state(rate_limiter, rate_limit));

    Router::new()
        .route("/health", get(health))
        .nest(
            "/api/v1",
            Router::new()
                .route("/asset-types", get(list_asset_types))
                .route("/wallets", get(list_wallets))
                .route("/wallets/{id}", get(get_wallet_details))
                .route("/wallets/{id}/balance", get(get_wallet_balance))
                .route("/wallets/{id}/transactions", get(get_wallet_history))
                .route("/transactions/{id}", get(get_transaction_details))
                .merge(mutations),
        )
        .layer(middleware::from_fn(request_id))
        .with_state(state)
}

// DTOs de entrada de las mutaciones

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopupRequest {
    pub wallet_id: Uuid,
    pub system_wallet_id: Uuid,
    pub amount: Decimal,
    pub reference_id: String,
    pub description: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BonusRequest {
    pub wallet_id: Uuid,
    pub system_wallet_id: Uuid,
    pub amount: Decimal,
    pub reason: String,
    pub description: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SpendRequest {
    pub wallet_id: Uuid,
    pub system_wallet_id: Uuid,
    pub amount: Decimal,
    pub service_id: String,
    pub description: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct WalletListQuery {
    pub owner_type: Option<OwnerKind>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Resuelve y acota los parámetros de paginación (página base 1, límite 1..=100).
fn page_params(page: Option<i64>, limit: Option<i64>) -> Result<(i64, i64), LedgerError> {
    let page = page.unwrap_or(1);
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE);

    if page < 1 {
        return Err(LedgerError::Validation(
            "page must be greater than or equal to 1".to_string(),
        ));
    }
    if !(1..=MAX_PAGE_SIZE).contains(&limit) {
        return Err(LedgerError::Validation(format!(
            "limit must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }

    Ok((page, limit))
}

/// Normaliza el metadata del cliente a un objeto y promueve un correlator del
/// flujo (`reason` / `serviceId`) dentro del bag.
fn metadata_with(extra: Option<serde_json::Value>, key: &str, value: &str) -> serde_json::Value {
    let mut map = match extra {
        Some(serde_json::Value::Object(map)) => map,
        _ => serde_json::Map::new(),
    };
    map.insert(
        key.to_string(),
        serde_json::Value::String(value.to_string()),
    );
    serde_json::Value::Object(map)
}

// Handler: Health check del servicio (verifica el pool contra la BD)
// GET /health
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service healthy"),
        (status = 503, description = "Datastore unreachable")
    )
)]
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => (StatusCode::OK, Json(json!({ "status": "healthy" }))),
        Err(e) => {
            tracing::error!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unhealthy" })),
            )
        }
    }
}

// Handler: Listar tipos de activo
// GET /api/v1/asset-types
#[utoipa::path(
    get,
    path = "/api/v1/asset-types",
    responses((status = 200, description = "Registered asset types"))
)]
pub async fn list_asset_types(
    State(state): State<Arc<AppState>>,
    Extension(RequestId(request_id)): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<AssetTypeView>>>, ApiError> {
    let asset_types = state
        .list_asset_types_use_case
        .execute()
        .await
        .map_err(|e| ApiError::new(e, &request_id))?;

    let views = asset_types.into_iter().map(AssetTypeView::from).collect();
    Ok(Json(ApiResponse::success(views)))
}

// Handler: Listar billeteras (paginado, filtro opcional por tipo de dueño)
// GET /api/v1/wallets
#[utoipa::path(
    get,
    path = "/api/v1/wallets",
    params(WalletListQuery),
    responses(
        (status = 200, description = "Paginated wallet list"),
        (status = 422, description = "Invalid pagination parameters")
    )
)]
pub async fn list_wallets(
    State(state): State<Arc<AppState>>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    Query(query): Query<WalletListQuery>,
) -> Result<Json<ApiResponse<Vec<WalletView>>>, ApiError> {
    let (page, limit) =
        page_params(query.page, query.limit).map_err(|e| ApiError::new(e, &request_id))?;

    let result = state
        .list_wallets_use_case
        .execute(query.owner_type, page, limit)
        .await
        .map_err(|e| ApiError::new(e, &request_id))?;

    let views: Vec<WalletView> = result.items.into_iter().map(WalletView::from).collect();
    Ok(Json(ApiResponse::paginated(
        views,
        Pagination::new(page, limit, result.total),
    )))
}

// Handler: Ver detalles de una billetera específica
// GET /api/v1/wallets/{id}
#[utoipa::path(
    get,
    path = "/api/v1/wallets/{id}",
    params(("id" = Uuid, Path, description = "Wallet id")),
    responses(
        (status = 200, description = "Wallet detail"),
        (status = 404, description = "Unknown wallet")
    )
)]
pub async fn get_wallet_details(
    State(state): State<Arc<AppState>>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<WalletView>>, ApiError> {
    let wallet = state
        .get_wallet_use_case
        .execute(WalletId(id))
        .await
        .map_err(|e| ApiError::new(e, &request_id))?;

    Ok(Json(ApiResponse::success(WalletView::from(wallet))))
}

// Handler: Vista de saldo de una billetera
// GET /api/v1/wallets/{id}/balance
#[utoipa::path(
    get,
    path = "/api/v1/wallets/{id}/balance",
    params(("id" = Uuid, Path, description = "Wallet id")),
    responses(
        (status = 200, description = "Wallet balance"),
        (status = 404, description = "Unknown wallet")
    )
)]
pub async fn get_wallet_balance(
    State(state): State<Arc<AppState>>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<BalanceView>>, ApiError> {
    let wallet = state
        .get_wallet_use_case
        .execute(WalletId(id))
        .await
        .map_err(|e| ApiError::new(e, &request_id))?;

    Ok(Json(ApiResponse::success(BalanceView::from(wallet))))
}

// Handler: Historial de movimientos de una billetera específica (paginado)
// GET /api/v1/wallets/{id}/transactions
#[utoipa::path(
    get,
    path = "/api/v1/wallets/{id}/transactions",
    params(("id" = Uuid, Path, description = "Wallet id"), PageQuery),
    responses(
        (status = 200, description = "Paginated transaction history"),
        (status = 404, description = "Unknown wallet")
    )
)]
pub async fn get_wallet_history(
    State(state): State<Arc<AppState>>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    Path(id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<TransactionView>>>, ApiError> {
    let (page, limit) =
        page_params(query.page, query.limit).map_err(|e| ApiError::new(e, &request_id))?;

    let result = state
        .get_wallet_history_use_case
        .execute(WalletId(id), page, limit)
        .await
        .map_err(|e| ApiError::new(e, &request_id))?;

    let views: Vec<TransactionView> = result
        .items
        .into_iter()
        .map(TransactionView::from)
        .collect();
    Ok(Json(ApiResponse::paginated(
        views,
        Pagination::new(page, limit, result.total),
    )))
}

// Handler: Detalle de una transacción con sus dos asientos
// GET /api/v1/transactions/{id}
#[utoipa::path(
    get,
    path = "/api/v1/transactions/{id}",
    params(("id" = Uuid, Path, description = "Transaction id")),
    responses(
        (status = 200, description = "Transaction with ledger entries"),
        (status = 404, description = "Unknown transaction")
    )
)]
pub async fn get_transaction_details(
    State(state): State<Arc<AppState>>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<TransactionView>>, ApiError> {
    let receipt = state
        .get_transaction_details_use_case
        .execute(TransactionId(id))
        .await
        .map_err(|e| ApiError::new(e, &request_id))?;

    Ok(Json(ApiResponse::success(TransactionView::from(receipt))))
}

// Handler: Acreditar créditos comprados (tesorería -> usuario)
// POST /api/v1/transactions/topup
// Header: Idempotency-Key requerido
#[utoipa::path(
    post,
    path = "/api/v1/transactions/topup",
    request_body = TopupRequest,
    responses(
        (status = 201, description = "Completed transaction with both entries"),
        (status = 409, description = "Conflict (inactive wallet / asset mismatch)"),
        (status = 422, description = "Validation error or insufficient funds")
    )
)]
pub async fn topup(
    State(state): State<Arc<AppState>>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    headers: HeaderMap,
    Json(payload): Json<TopupRequest>,
) -> Response {
    let command = TransferCommand {
        kind: TransactionKind::Topup,
        user_wallet_id: WalletId(payload.wallet_id),
        system_wallet_id: WalletId(payload.system_wallet_id),
        amount: payload.amount,
        idempotency_key: None,
        reference_id: Some(payload.reference_id),
        description: payload.description,
        metadata: payload.metadata.unwrap_or_else(|| json!({})),
    };

    run_idempotent(&state, &headers, TOPUP_PATH, &request_id, command).await
}

// Handler: Emitir créditos gratis desde el pozo de bonos (sistema -> usuario)
// POST /api/v1/transactions/bonus
// Header: Idempotency-Key requerido
#[utoipa::path(
    post,
    path = "/api/v1/transactions/bonus",
    request_body = BonusRequest,
    responses(
        (status = 201, description = "Completed transaction with both entries"),
        (status = 409, description = "Conflict (inactive wallet / asset mismatch)"),
        (status = 422, description = "Validation error or insufficient funds")
    )
)]
pub async fn bonus(
    State(state): State<Arc<AppState>>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    headers: HeaderMap,
    Json(payload): Json<BonusRequest>,
) -> Response {
    let command = TransferCommand {
        kind: TransactionKind::Bonus,
        user_wallet_id: WalletId(payload.wallet_id),
        system_wallet_id: WalletId(payload.system_wallet_id),
        amount: payload.amount,
        idempotency_key: None,
        // El bonus no tiene correlator externo; la razón viaja en el metadata.
        reference_id: None,
        description: payload.description,
        metadata: metadata_with(payload.metadata, "reason", &payload.reason),
    };

    run_idempotent(&state, &headers, BONUS_PATH, &request_id, command).await
}

// Handler: Quemar créditos del usuario hacia ingresos (usuario -> sistema)
// POST /api/v1/transactions/spend
// Header: Idempotency-Key requerido
#[utoipa::path(
    post,
    path = "/api/v1/transactions/spend",
    request_body = SpendRequest,
    responses(
        (status = 201, description = "Completed transaction with both entries"),
        (status = 409, description = "Conflict (inactive wallet / asset mismatch)"),
        (status = 422, description = "Validation error or insufficient funds")
    )
)]
pub async fn spend(
    State(state): State<Arc<AppState>>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    headers: HeaderMap,
    Json(payload): Json<SpendRequest>,
) -> Response {
    let command = TransferCommand {
        kind: TransactionKind::Spend,
        user_wallet_id: WalletId(payload.wallet_id),
        system_wallet_id: WalletId(payload.system_wallet_id),
        amount: payload.amount,
        idempotency_key: None,
        reference_id: Some(payload.service_id.clone()),
        description: payload.description,
        metadata: metadata_with(payload.metadata, "serviceId", &payload.service_id),
    };

    run_idempotent(&state, &headers, SPEND_PATH, &request_id, command).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, None, Ok((1, 20)))]
    #[case(Some(3), Some(50), Ok((3, 50)))]
    #[case(Some(0), None, Err(()))]
    #[case(None, Some(0), Err(()))]
    #[case(None, Some(101), Err(()))]
    fn test_page_params_bounds(
        #[case] page: Option<i64>,
        #[case] limit: Option<i64>,
        #[case] expected: Result<(i64, i64), ()>,
    ) {
        let result = page_params(page, limit);
        match expected {
            Ok(values) => assert_eq!(result.unwrap(), values),
            Err(()) => assert!(matches!(result, Err(LedgerError::Validation(_)))),
        }
    }

    #[test]
    fn test_metadata_with_preserves_client_bag() {
        let metadata = metadata_with(
            Some(json!({ "campaign": "summer" })),
            "reason",
            "referral",
        );

        assert_eq!(metadata["campaign"], "summer");
        assert_eq!(metadata["reason"], "referral");
    }

    #[test]
    fn test_metadata_with_replaces_non_object_bag() {
        let metadata = metadata_with(Some(json!([1, 2])), "serviceId", "svc-9");
        assert_eq!(metadata, json!({ "serviceId": "svc-9" }));
    }
}
