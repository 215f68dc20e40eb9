use dotenvy::dotenv;
use ledger_service::{
    api::{
        http_routes::{routes, AppState},
        rate_limiter::RateLimiter,
    },
    config::Config,
    infrastructure::persistence::{
        asset_type_repository::PostgresAssetTypeRepository,
        idempotency_repository::PostgresIdempotencyRepository,
        ledger_repository::PostgresLedgerRepository,
        transaction_repository::PostgresTransactionRepository,
        wallet_repository::PostgresWalletRepository,
    },
    use_cases::{
        get_transaction_details::GetTransactionDetailsUseCase, get_wallet::GetWalletUseCase,
        get_wallet_history::GetWalletHistoryUseCase, list_asset_types::ListAssetTypesUseCase,
        list_wallets::ListWalletsUseCase, process_transaction::ProcessTransactionUseCase,
    },
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        ledger_service::api::http_routes::health,
        ledger_service::api::http_routes::list_asset_types,
        ledger_service::api::http_routes::list_wallets,
        ledger_service::api::http_routes::get_wallet_details,
        ledger_service::api::http_routes::get_wallet_balance,
        ledger_service::api::http_routes::get_wallet_history,
        ledger_service::api::http_routes::get_transaction_details,
        ledger_service::api::http_routes::topup,
        ledger_service::api::http_routes::bonus,
        ledger_service::api::http_routes::spend
    ),
    components(schemas(
        ledger_service::api::http_routes::TopupRequest,
        ledger_service::api::http_routes::BonusRequest,
        ledger_service::api::http_routes::SpendRequest,
        ledger_service::api::response::ApiResponse<serde_json::Value>
    ))
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Cargar variables de entorno
    dotenv().ok();
    let config = Config::from_env()?;

    // 2. Configurar Logging/Tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting Ledger Service...");

    // 3. Configurar Conexión a Base de Datos
    let pool = PgPoolOptions::new()
        .min_connections(config.pool_min_connections)
        .max_connections(config.pool_max_connections)
        .acquire_timeout(Duration::from_secs(config.pool_acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.pool_idle_timeout_secs))
        .connect(&config.database_url)
        .await?;

    info!("Connected to Database");

    // 4. Instanciar Dependencias (Infraestructura)
    let asset_type_repo = Arc::new(PostgresAssetTypeRepository::new(pool.clone()));
    let wallet_repo = Arc::new(PostgresWalletRepository::new(pool.clone()));
    let transaction_repo = Arc::new(PostgresTransactionRepository::new(pool.clone()));
    let ledger_repo = Arc::new(PostgresLedgerRepository::new(pool.clone()));
    let idempotency_repo = Arc::new(PostgresIdempotencyRepository::new(pool.clone()));

    // 5. Instanciar Casos de Uso
    let process_transaction_use_case =
        ProcessTransactionUseCase::new(transaction_repo.clone(), ledger_repo.clone());
    let get_transaction_details_use_case =
        GetTransactionDetailsUseCase::new(transaction_repo.clone());
    let get_wallet_use_case = GetWalletUseCase::new(wallet_repo.clone());
    let list_wallets_use_case = ListWalletsUseCase::new(wallet_repo.clone());
    let get_wallet_history_use_case =
        GetWalletHistoryUseCase::new(wallet_repo.clone(), transaction_repo.clone());
    let list_asset_types_use_case = ListAssetTypesUseCase::new(asset_type_repo.clone());

    // 6. Configurar Estado de la App Axum
    let app_state = Arc::new(AppState {
        process_transaction_use_case,
        get_transaction_details_use_case,
        get_wallet_use_case,
        list_wallets_use_case,
        get_wallet_history_use_case,
        list_asset_types_use_case,
        idempotency_repo: idempotency_repo.clone(),
        idempotency_ttl: chrono::Duration::hours(config.idempotency_ttl_hours),
        pool: pool.clone(),
    });

    let rate_limiter = Arc::new(RateLimiter::new(
        config.rate_limit_max_requests,
        Duration::from_secs(config.rate_limit_window_secs),
    ));

    // 7. Configurar Rutas y Servidor
    let app = routes(app_state, rate_limiter)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // 8. Iniciar Background Jobs (poda de respuestas idempotentes expiradas)
    tokio::spawn(async move {
        // Intervalo de ejecución: cada 60 segundos
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        let job = ledger_service::jobs::prune_idempotency::PruneIdempotencyJob::new(
            idempotency_repo,
        );

        info!("Background Job Scheduler started");

        loop {
            interval.tick().await;
            job.run().await;
        }
    });

    let addr = format!("{}:{}", config.host, config.port);
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down, closing connection pool...");
    pool.close().await;

    Ok(())
}

/// Espera la señal de apagado y arma el hard-stop acotado.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining in-flight requests...");

    // Si el drain se cuelga, forzamos la salida tras un plazo acotado.
    tokio::spawn(async {
        tokio::time::sleep(Duration::from_secs(10)).await;
        error!("Graceful drain timed out, forcing exit");
        std::process::exit(1);
    });
}
