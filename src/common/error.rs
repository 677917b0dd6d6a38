use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // Validação manual (números mal formados, lojas repetidas, etc.)
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0} não encontrado(a)")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("Usuário já existe")]
    UsernameAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("{0}")]
    Forbidden(String),

    #[error("Usuário não encontrado")]
    UserNotFound,

    // --- Regras de negócio da grade ---
    #[error("A grade não possui itens.")]
    GradeWithoutItems,

    // Cada linha: "<item> (diferença: <n>)"
    #[error("{}", .0.join("\n"))]
    PendingDistribution(Vec<String>),

    #[error("{0}")]
    NothingToReconcile(String),

    // Falha no warehouse analítico (ClickHouse)
    #[error("Erro no warehouse: {0}")]
    WarehouseError(String),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) | AppError::UserNotFound => StatusCode::NOT_FOUND,
            AppError::Conflict(_) | AppError::UsernameAlreadyExists => StatusCode::CONFLICT,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::GradeWithoutItems
            | AppError::PendingDistribution(_)
            | AppError::NothingToReconcile(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::WarehouseError(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors.iter()
                        .map(|e| e.message.as_ref().map(|m| m.to_string()).unwrap_or_else(|| e.code.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                })
            }
            // A lista de pendências volta completa para o usuário corrigir a distribuição.
            AppError::PendingDistribution(ref lines) => json!({
                "error": format!("Distribuição pendente:\n{}", lines.join("\n")),
                "details": lines,
            }),
            AppError::WarehouseError(ref e) => {
                tracing::error!("🔥 Falha no warehouse: {}", e);
                json!({ "error": "Falha ao consultar o warehouse analítico." })
            }
            ref e if status == StatusCode::INTERNAL_SERVER_ERROR => {
                // O `tracing` loga a mensagem detalhada; o cliente recebe só a genérica.
                tracing::error!("🔥 Erro Interno do Servidor: {:?}", e);
                json!({ "error": "Ocorreu um erro inesperado." })
            }
            ref e => json!({ "error": e.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_distribution_joins_lines_with_newlines() {
        let err = AppError::PendingDistribution(vec![
            "Suco Tang 25g (diferença: 100)".into(),
            "Café 500g (diferença: 3)".into(),
        ]);
        assert_eq!(err.to_string(), "Suco Tang 25g (diferença: 100)\nCafé 500g (diferença: 3)");
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn upstream_errors_hide_details() {
        let response = AppError::WarehouseError("timeout na porta 8123".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let response = AppError::DatabaseError(sqlx::Error::RowNotFound).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn business_errors_map_to_client_statuses() {
        assert_eq!(AppError::GradeWithoutItems.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(AppError::InvalidInput("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::NotFound("Grade").status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(AppError::Forbidden("x".into()).status(), StatusCode::FORBIDDEN);
    }
}
