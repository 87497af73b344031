// src/models/tenancy.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ---
// 1. Cliente (A "Empresa")
// ---
// O proprietário de um ou mais restaurantes
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Cliente {
    pub id: Uuid,
    pub nome_empresa: String,
    pub email: String,
    pub telefone: Option<String>,
    pub cnpj: Option<String>,
    pub endereco: Option<String>,
    pub cidade: Option<String>,
    pub estado: Option<String>,
    pub ativo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---
// 2. Tenant (O "Restaurante")
// ---
// A unidade: escopo primário de estoque e equipe
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: Uuid,
    pub cliente_id: Uuid,
    pub nome: String,
    // Identificador estilo subdomínio, único no sistema
    pub slug: String,
    pub email: String,
    pub telefone: Option<String>,
    pub cnpj: Option<String>,
    pub endereco: Option<String>,
    pub ativo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---
// 3. Role por restaurante
// ---
// 'admin' gerencia produtos e estoque; 'leitura' apenas escaneia e dá baixa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "role_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RoleType {
    Admin,
    Leitura,
}

// ---
// 4. Membro da equipe (visão usuário + role dentro de um restaurante)
// ---
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MembroTenant {
    pub id: Uuid,
    pub nome: String,
    pub email: String,
    pub ativo: bool,
    pub role: RoleType,
    pub desde: DateTime<Utc>,
}

// ---
// 5. UserTenant (A "Ponte" Usuário-Restaurante)
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserTenant {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub role: RoleType,
    pub created_at: DateTime<Utc>,
}
