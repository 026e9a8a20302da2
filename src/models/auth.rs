// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::permission::{has_permission, Action, Module, Permission};

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    #[schema(example = "b@x.com")]
    pub email: String,
    #[schema(example = "Bhavna")]
    pub name: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    pub password_hash: String,

    // Cópia desnormalizada do vínculo com a empresa (cache para autorização rápida)
    pub business: Option<BusinessSnapshot>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_business_owner(&self) -> bool {
        self.business.as_ref().is_some_and(|b| b.is_business_owner)
    }

    /// Checagem O(1) sobre o snapshot. Dono da empresa passa em tudo.
    pub fn can(&self, module: Module, action: Action) -> bool {
        match &self.business {
            Some(snapshot) if snapshot.is_business_owner => true,
            Some(snapshot) => has_permission(&snapshot.permissions, module, action),
            None => false,
        }
    }
}

// ---
// O snapshot que fica gravado no usuário
// ---
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BusinessSnapshot {
    pub business_id: Uuid,
    #[schema(example = "Acme")]
    pub business_name: String,
    #[schema(example = "ACME12")]
    pub business_code: String,
    pub is_business_owner: bool,
    #[schema(example = "Manager")]
    pub role: String,

    // Só para funcionários: de qual cargo/versão as permissões foram copiadas
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_version: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staff_id: Option<String>,

    #[serde(default)]
    pub permissions: Vec<Permission>,
}

// Dados para registro de um novo usuário
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterUserPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginUserPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // Subject (ID do usuário)
    pub exp: usize, // Expiration time (quando o token expira)
    pub iat: usize, // Issued At (quando o token foi criado)
}
