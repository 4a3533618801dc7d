// src/error.rs
use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Erro na base de dados: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Erro de migração da base de dados: {0}")]
    SqlxMigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Erro de variável de ambiente: {0}")]
    EnvVarError(#[from] std::env::VarError),

    #[error("Erro de configuração: {0}")]
    Config(String),

    #[error("Erro ao processar password")]
    PasswordHashingError,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Não autenticado: {0}")]
    Unauthorized(String),

    #[error("Acesso negado: {0}")]
    Forbidden(String),

    #[error("Não encontrado: {0}")]
    NotFound(String),

    #[error("Pedido inválido: {0}")]
    BadRequest(String),

    #[error("Dados inválidos: {0}")]
    Validation(#[from] validator::ValidationErrors),

    // Erros de parâmetros do dashboard carregam um código legível pelo front
    #[error("{code}: {message}")]
    InvalidParam { code: &'static str, message: String },

    #[error("Erro no serviço de imagens: {0}")]
    ImageHost(String),

    #[error("Serviço de imagens não configurado")]
    ImageHostUnavailable,

    #[error("Erro ao enviar e-mail: {0}")]
    Email(String),

    #[error("Erro interno inesperado")]
    InternalServerError,
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::SqlxError(_) | AppError::SqlxMigrateError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "database_error",
                "Erro ao aceder aos dados.".into(),
            ),
            AppError::EnvVarError(_) | AppError::Config(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "configuration_error",
                "Erro de configuração.".into(),
            ),
            AppError::PasswordHashingError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_server_error",
                "Erro ao processar credenciais.".into(),
            ),
            // Mensagem genérica para não revelar se o e-mail existe
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                "E-mail ou senha inválidos.".into(),
            ),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg.clone()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                format!("Dados inválidos: {}", errors),
            ),
            AppError::InvalidParam { code, message } => {
                (StatusCode::BAD_REQUEST, *code, message.clone())
            }
            AppError::ImageHost(_) => (
                StatusCode::BAD_GATEWAY,
                "image_upload_error",
                "Erro no upload da imagem.".into(),
            ),
            AppError::ImageHostUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "image_host_unavailable",
                "Serviço de imagens indisponível.".into(),
            ),
            AppError::Email(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "email_error",
                "Erro ao enviar e-mail.".into(),
            ),
            AppError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_server_error",
                "Erro interno do servidor".into(),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        if status.is_server_error() {
            tracing::error!("Erro processado: {:?}", self);
        } else {
            tracing::warn!("Pedido rejeitado ({}): {}", status.as_u16(), self);
        }

        (status, Json(json!({ "error": code, "message": message }))).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for AppError {
    fn from(error: MultipartError) -> Self {
        AppError::BadRequest(format!("Multipart inválido: {}", error))
    }
}

// Tipo Result padrão para a aplicação
pub type AppResult<T = ()> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn not_found_is_404() {
        let response = AppError::NotFound("Colaboração não encontrada.".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn invalid_credentials_is_401() {
        let response = AppError::InvalidCredentials.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn invalid_param_keeps_code() {
        let err = AppError::InvalidParam {
            code: "invalid_period",
            message: "Período inválido.".into(),
        };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "invalid_period");
    }

    #[tokio::test]
    async fn database_errors_hide_details() {
        let response = AppError::SqlxError(sqlx::Error::RowNotFound).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "Erro ao aceder aos dados.");
    }
}
