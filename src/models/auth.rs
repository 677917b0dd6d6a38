// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub name: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    #[schema(ignore)]
    pub password_hash: String,

    // Compradores aparecem como responsáveis das grades
    pub is_buyer: bool,
    // Administradores mantêm o cadastro de usuários
    pub is_admin: bool,
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Cadastro de usuário feito por um administrador
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewUserPayload {
    #[validate(length(min = 3, max = 150, message = "O usuário deve ter entre 3 e 150 caracteres."))]
    pub username: String,
    #[validate(length(min = 1, max = 150, message = "O nome deve ter entre 1 e 150 caracteres."))]
    pub name: String,
    #[validate(length(min = 6, max = 72, message = "A senha deve ter entre 6 e 72 caracteres."))]
    pub password: String,
    #[serde(default)]
    pub is_buyer: bool,
    #[serde(default)]
    pub is_admin: bool,
}

// Edição: a senha só muda quando informada
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserPayload {
    #[validate(length(min = 3, max = 150, message = "O usuário deve ter entre 3 e 150 caracteres."))]
    pub username: String,
    #[validate(length(min = 1, max = 150, message = "O nome deve ter entre 1 e 150 caracteres."))]
    pub name: String,
    #[validate(length(min = 6, max = 72, message = "A senha deve ter entre 6 e 72 caracteres."))]
    pub password: Option<String>,
    #[serde(default)]
    pub is_buyer: bool,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserPage {
    pub items: Vec<User>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginUserPayload {
    #[validate(length(min = 1, message = "O usuário é obrigatório."))]
    pub username: String,
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
