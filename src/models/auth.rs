// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub cliente_id: Uuid,
    pub nome: String,
    pub email: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    pub senha_hash: String,

    // Admin do SaaS (painel), não confundir com role por restaurante
    pub is_admin: bool,
    pub ativo: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Dados para login
#[derive(Debug, Deserialize, Validate)]
pub struct LoginPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub senha: String,
}

// Resumo de um restaurante dentro da resposta de login
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestauranteResumo {
    pub id: Uuid,
    pub nome: String,
    pub slug: String,
}

// Resposta de autenticação com o token e os restaurantes acessíveis
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: UserResumo,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResumo {
    pub id: Uuid,
    pub nome: String,
    pub email: String,
    pub is_admin: bool,
    pub cliente_id: Uuid,
    pub restaurantes: Vec<RestauranteResumo>,
}

// Estrutura de dados ("claims") dentro do JWT.
// Carrega apenas os tenants ATIVOS no momento da emissão.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // ID do usuário
    pub email: String,
    pub cliente_id: Uuid,
    pub tenant_ids: Vec<Uuid>,
    pub is_admin: bool,
    pub exp: usize, // Expiration time
    pub iat: usize, // Issued At
}
