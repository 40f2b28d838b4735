// src/config.rs

use crate::{
    common::db_utils::connect_with_retry,
    db::{
        AlertRepository, CatalogRepository, DashboardRepository, InventoryRepository,
        TransactionRepository, UserRepository,
    },
    services::{
        auth::AuthService, catalog_service::CatalogService, dashboard_service::DashboardService,
        inventory_service::InventoryService, notifier::StockNotifier,
    },
};
use anyhow::Context;
use sqlx::PgPool;
use std::{env, str::FromStr};

// Configuração lida do ambiente (.env ou variáveis do processo)
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub host: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub db_connect_attempts: u32,
    pub db_retry_delay_secs: u64,
    pub event_buffer: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Monta a configuração a partir de qualquer fonte chave/valor.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("{} deve ser definida", key))
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            jwt_ttl_hours: parse_or(&lookup, "JWT_TTL_HOURS", 24)?,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", 3000)?,
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 10)?,
            db_acquire_timeout_secs: parse_or(&lookup, "DB_ACQUIRE_TIMEOUT_SECS", 5)?,
            db_connect_attempts: parse_or(&lookup, "DB_CONNECT_ATTEMPTS", 5)?,
            db_retry_delay_secs: parse_or(&lookup, "DB_RETRY_DELAY_SECS", 5)?,
            event_buffer: parse_or(&lookup, "EVENT_BUFFER", 256)?,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("valor inválido para {}: {}", key, e)),
        None => Ok(default),
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub notifier: StockNotifier,
    pub auth_service: AuthService,
    pub inventory_service: InventoryService,
    pub catalog_service: CatalogService,
    pub dashboard_service: DashboardService,
}

impl AppState {
    // Conecta ao banco e monta o gráfico de dependências
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let db_pool = connect_with_retry(&config).await?;

        let notifier = StockNotifier::new(config.event_buffer);

        let user_repo = UserRepository::new(db_pool.clone());
        let inventory_repo = InventoryRepository::new(db_pool.clone());
        let transaction_repo = TransactionRepository::new(db_pool.clone());
        let alert_repo = AlertRepository::new(db_pool.clone());
        let catalog_repo = CatalogRepository::new(db_pool.clone());
        let dashboard_repo = DashboardRepository::new(db_pool.clone());

        let auth_service = AuthService::new(user_repo, config.jwt_secret.clone(), config.jwt_ttl_hours);
        let inventory_service = InventoryService::new(
            db_pool.clone(),
            inventory_repo,
            transaction_repo,
            alert_repo,
            notifier.clone(),
        );
        let catalog_service = CatalogService::new(catalog_repo, db_pool.clone());
        let dashboard_service = DashboardService::new(dashboard_repo);

        Ok(Self {
            db_pool,
            notifier,
            auth_service,
            inventory_service,
            catalog_service,
            dashboard_service,
        })
    }
}
