// src/common/db_utils.rs

use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

use crate::common::error::AppError;
use crate::config::Config;

// ---
// Conexão com o Banco de Dados (com nova tentativa)
// ---
/// Abre a pool na inicialização. Se o banco ainda não estiver de pé,
/// tenta de novo `db_connect_attempts` vezes com intervalo fixo.
pub async fn connect_with_retry(config: &Config) -> anyhow::Result<PgPool> {
    let mut attempt = 1;
    loop {
        let result = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(config.db_acquire_timeout_secs))
            .connect(&config.database_url)
            .await;

        match result {
            Ok(pool) => {
                tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");
                return Ok(pool);
            }
            Err(e) if attempt < config.db_connect_attempts => {
                tracing::warn!(
                    "🔄 Falha ao conectar ao banco (tentativa {}/{}): {}. Nova tentativa em {}s",
                    attempt,
                    config.db_connect_attempts,
                    e,
                    config.db_retry_delay_secs
                );
                tokio::time::sleep(Duration::from_secs(config.db_retry_delay_secs)).await;
                attempt += 1;
            }
            Err(e) => {
                tracing::error!("🔥 Falha ao conectar ao banco de dados: {:?}", e);
                return Err(e.into());
            }
        }
    }
}

// ---
// Tradução de violações de constraint
// ---
/// Converte violação de unicidade em `DuplicateKey` e de chave estrangeira
/// em `NotFound`. O resto segue como erro de banco.
pub(crate) fn map_constraint_error(e: sqlx::Error, what: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            let constraint = db_err.constraint().unwrap_or_default();
            return AppError::DuplicateKey(format!("{} ({})", what, constraint));
        }
        if db_err.is_foreign_key_violation() {
            let constraint = db_err.constraint().unwrap_or_default();
            return AppError::NotFound(format!("referência inválida ({})", constraint));
        }
    }
    e.into()
}

/// Escapa curingas do LIKE para que a busca seja por substring literal.
pub(crate) fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}
