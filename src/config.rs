use anyhow::Context;
use std::env;
use std::str::FromStr;

/// Configuración del servicio, leída del entorno con defaults razonables.
///
/// Solo `DATABASE_URL` es obligatoria; el resto de los knobs (pool, límites
/// de tasa, TTL de idempotencia, nivel de log) tienen valores por defecto.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub pool_min_connections: u32,
    pub pool_max_connections: u32,
    pub pool_acquire_timeout_secs: u64,
    pub pool_idle_timeout_secs: u64,
    pub rate_limit_window_secs: u64,
    pub rate_limit_max_requests: u32,
    pub idempotency_ttl_hours: i64,
    pub log_level: String,
}

fn env_or<T: FromStr>(name: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("Invalid value for {name}")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env_or("PORT", 3000)?,
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            pool_min_connections: env_or("DB_POOL_MIN_CONNECTIONS", 1)?,
            pool_max_connections: env_or("DB_POOL_MAX_CONNECTIONS", 5)?,
            pool_acquire_timeout_secs: env_or("DB_POOL_ACQUIRE_TIMEOUT_SECS", 5)?,
            pool_idle_timeout_secs: env_or("DB_POOL_IDLE_TIMEOUT_SECS", 30)?,
            rate_limit_window_secs: env_or("RATE_LIMIT_WINDOW_SECS", 60)?,
            rate_limit_max_requests: env_or("RATE_LIMIT_MAX_REQUESTS", 100)?,
            idempotency_ttl_hours: env_or("IDEMPOTENCY_TTL_HOURS", 24)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }
}
