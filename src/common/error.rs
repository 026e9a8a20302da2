// src/common/error.rs

use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::middleware::i18n::Locale;

// Nosso tipo de erro de domínio, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // Validação de regra de negócio (mensagem já pronta para o usuário)
    #[error("Dados inválidos: {0}")]
    InvalidInput(String),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Empresa não encontrada")]
    BusinessNotFound,

    #[error("Cargo não encontrado")]
    RoleNotFound,

    #[error("Código de cargo não encontrado")]
    RoleCodeNotFound,

    #[error("Funcionário não encontrado")]
    StaffNotFound,

    #[error("Acesso negado: {0}")]
    Forbidden(String),

    #[error("Conflito: {0}")]
    Conflict(String),

    // O documento da empresa mudou entre a leitura e a escrita
    #[error("Conflito de versão na empresa")]
    VersionConflict,

    #[error("Cargo em uso: {0}")]
    RoleInUse(String),

    #[error("Cargo padrão protegido: {0}")]
    DefaultRoleProtected(String),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

// O corpo de erro que vai para o cliente
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::UserNotFound
            | AppError::BusinessNotFound
            | AppError::RoleNotFound
            | AppError::RoleCodeNotFound
            | AppError::StaffNotFound => StatusCode::NOT_FOUND,
            AppError::EmailAlreadyExists
            | AppError::Conflict(_)
            | AppError::VersionConflict
            | AppError::RoleInUse(_)
            | AppError::DefaultRoleProtected(_) => StatusCode::CONFLICT,
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Código estável para o frontend decidir o que fazer sem ler a mensagem.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) | AppError::InvalidInput(_) => "VALIDATION_ERROR",
            AppError::EmailAlreadyExists => "EMAIL_ALREADY_EXISTS",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::InvalidToken => "INVALID_TOKEN",
            AppError::UserNotFound => "USER_NOT_FOUND",
            AppError::BusinessNotFound => "BUSINESS_NOT_FOUND",
            AppError::RoleNotFound => "ROLE_NOT_FOUND",
            AppError::RoleCodeNotFound => "ROLE_CODE_NOT_FOUND",
            AppError::StaffNotFound => "STAFF_NOT_FOUND",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::Conflict(_) | AppError::VersionConflict => "CONFLICT",
            AppError::RoleInUse(_) => "ROLE_IN_USE",
            AppError::DefaultRoleProtected(_) => "DEFAULT_ROLE_PROTECTED",
            _ => "INTERNAL_SERVER_ERROR",
        }
    }

    // Mensagem traduzida. Só "pt" e "en" por enquanto; qualquer outro idioma cai no inglês.
    fn message(&self, lang: &str) -> String {
        let pt = lang == "pt";
        let text = |en: &str, pt_text: &str| if pt { pt_text.to_string() } else { en.to_string() };

        match self {
            AppError::ValidationError(_) => text("One or more fields are invalid.", "Um ou mais campos são inválidos."),
            AppError::InvalidInput(msg) => msg.clone(),
            AppError::EmailAlreadyExists => text("This email is already in use.", "Este e-mail já está em uso."),
            AppError::InvalidCredentials => text("Invalid email or password.", "E-mail ou senha inválidos."),
            AppError::InvalidToken => text(
                "Authentication token is invalid or missing.",
                "Token de autenticação inválido ou ausente.",
            ),
            AppError::UserNotFound => text("User not found.", "Usuário não encontrado."),
            AppError::BusinessNotFound => text("Business not found.", "Empresa não encontrada."),
            AppError::RoleNotFound => text("Role not found.", "Cargo não encontrado."),
            AppError::RoleCodeNotFound => text("Invalid role code.", "Código de cargo inválido."),
            AppError::StaffNotFound => text("Staff member not found.", "Funcionário não encontrado."),
            AppError::Forbidden(msg) => msg.clone(),
            AppError::Conflict(msg) => msg.clone(),
            AppError::VersionConflict => text(
                "The business was modified by another request. Please retry.",
                "A empresa foi alterada por outra requisição. Tente novamente.",
            ),
            AppError::RoleInUse(name) => {
                if pt {
                    format!("O cargo '{}' está atribuído a funcionários e não pode ser removido.", name)
                } else {
                    format!("Role '{}' is assigned to staff members and cannot be deleted.", name)
                }
            }
            AppError::DefaultRoleProtected(name) => {
                if pt {
                    format!("O cargo padrão '{}' não pode ser removido.", name)
                } else {
                    format!("Default role '{}' cannot be deleted.", name)
                }
            }
            _ => text("An unexpected error occurred.", "Ocorreu um erro inesperado."),
        }
    }

    /// Converte o erro de domínio no corpo HTTP, já no idioma do cliente.
    pub fn to_api_error(&self, locale: &Locale) -> ApiError {
        let status = self.status();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            // Detalhes completos só no log, nunca na resposta
            tracing::error!(error = ?self, "Erro Interno do Servidor: {}", self);
        }

        let details = match self {
            AppError::ValidationError(errors) => {
                let mut details = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                Some(serde_json::json!({ "code": self.code(), "fields": details }))
            }
            _ => Some(serde_json::json!({ "code": self.code() })),
        };

        ApiError {
            status,
            error: self.message(&locale.0),
            details,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default()).into_response()
    }
}
