// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::models::transaction::{LedgerSubType, LedgerType};

// Nosso tipo de erro, agora com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // Regras de negócio que o `validator` não consegue expressar
    #[error("Dados inválidos: {0}")]
    ValidationFailed(String),

    #[error("Registro duplicado: {0}")]
    DuplicateKey(String),

    #[error("Não encontrado: {0}")]
    NotFound(String),

    #[error("Quantidade inválida: {0}")]
    InvalidQuantity(String),

    #[error("Subtipo {sub_type:?} não pertence ao tipo {ledger_type:?}")]
    InvalidSubType {
        ledger_type: LedgerType,
        sub_type: LedgerSubType,
    },

    #[error("Alerta {0} já foi resolvido")]
    AlreadyResolved(Uuid),

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    /// Código estável enviado ao cliente junto com a mensagem.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) | AppError::ValidationFailed(_) => "VALIDATION_FAILED",
            AppError::DuplicateKey(_) => "DUPLICATE_KEY",
            AppError::NotFound(_) | AppError::UserNotFound => "NOT_FOUND",
            AppError::InvalidQuantity(_) => "INVALID_QUANTITY",
            AppError::InvalidSubType { .. } => "INVALID_SUB_TYPE",
            AppError::AlreadyResolved(_) => "ALREADY_RESOLVED",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::InvalidToken => "INVALID_TOKEN",
            AppError::DatabaseError(e) if is_store_unavailable(e) => "STORE_UNAVAILABLE",
            _ => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::ValidationFailed(_)
            | AppError::InvalidSubType { .. } => StatusCode::BAD_REQUEST,
            AppError::DuplicateKey(_) | AppError::AlreadyResolved(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) | AppError::UserNotFound => StatusCode::NOT_FOUND,
            AppError::InvalidQuantity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::DatabaseError(e) if is_store_unavailable(e) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Falhas de infraestrutura que o cliente pode tentar de novo
fn is_store_unavailable(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let message = match self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "code": code,
                    "details": details,
                }));
                return (status, body).into_response();
            }
            AppError::InvalidCredentials => "E-mail ou senha inválidos.".to_string(),
            AppError::InvalidToken => "Token de autenticação inválido ou ausente.".to_string(),
            AppError::UserNotFound => "Usuário não encontrado.".to_string(),

            // Erros de domínio: a mensagem do `thiserror` já é suficiente
            ref e @ (AppError::ValidationFailed(_)
            | AppError::DuplicateKey(_)
            | AppError::NotFound(_)
            | AppError::InvalidQuantity(_)
            | AppError::InvalidSubType { .. }
            | AppError::AlreadyResolved(_)) => e.to_string(),

            // Todos os outros erros (banco, bcrypt, jwt, anyhow) viram 5xx.
            // O `tracing` loga a mensagem detalhada; o cliente recebe uma genérica.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                if status == StatusCode::SERVICE_UNAVAILABLE {
                    "Banco de dados indisponível, tente novamente.".to_string()
                } else {
                    "Ocorreu um erro inesperado.".to_string()
                }
            }
        };

        // Resposta padrão para erros simples que só têm uma mensagem.
        let body = Json(json!({ "error": message, "code": code }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_client_statuses() {
        assert_eq!(AppError::NotFound("item".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::DuplicateKey("sku".into()).status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::InvalidQuantity("negativo".into()).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::AlreadyResolved(Uuid::nil()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::InvalidSubType {
                ledger_type: LedgerType::In,
                sub_type: LedgerSubType::Sale,
            }
            .status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn pool_timeout_is_reported_as_unavailable() {
        let err = AppError::DatabaseError(sqlx::Error::PoolTimedOut);
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.code(), "STORE_UNAVAILABLE");

        let err = AppError::DatabaseError(sqlx::Error::RowNotFound);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "INTERNAL");
    }

    #[test]
    fn response_carries_status_code() {
        let response = AppError::AlreadyResolved(Uuid::nil()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
