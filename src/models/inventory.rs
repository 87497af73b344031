// src/models/inventory.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// --- 1. Alimento (o produto do restaurante) ---
// Carrega o contador agregado de estoque; a verdade é o livro de movimentações.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Alimento {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub nome: String,
    pub categoria: Option<String>,
    pub subcategoria: Option<String>,
    pub tipo_conservacao: Option<String>, // congelado, resfriado
    pub unidade_medida: Option<String>,   // kg, g, l, ml, unidade
    pub quantidade_estoque: Decimal,
    pub quantidade_minima: Decimal,
    pub preco_unitario: Option<Decimal>,
    pub fornecedor: Option<String>,
    pub observacoes: Option<String>,
    pub ativo: bool,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- 2. Tipo de movimentação ---
// Enum único em todo o código; a string existe só na borda (banco/JSON).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "tipo_movimentacao", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TipoMovimentacao {
    Entrada,
    Saida,
    Ajuste,
    Uso, // Baixa via QR Code
}

// --- 3. Movimentação de Estoque (histórico, write-once) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MovimentacaoEstoque {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub alimento_id: Uuid,
    pub lote_id: Option<Uuid>,
    pub usuario_id: Uuid,
    pub tipo: TipoMovimentacao,
    pub quantidade: Decimal,
    pub quantidade_anterior: Option<Decimal>,
    pub quantidade_nova: Option<Decimal>,
    pub motivo: Option<String>,
    pub qr_code_usado: Option<String>,
    pub created_at: DateTime<Utc>,
}

// Movimentação enriquecida com nomes para listagem
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MovimentacaoDetalhada {
    pub id: Uuid,
    pub alimento_id: Uuid,
    pub alimento_nome: String,
    pub usuario_nome: String,
    pub lote_id: Option<Uuid>,
    pub tipo: TipoMovimentacao,
    pub quantidade: Decimal,
    pub quantidade_anterior: Option<Decimal>,
    pub quantidade_nova: Option<Decimal>,
    pub motivo: Option<String>,
    pub qr_code_usado: Option<String>,
    pub created_at: DateTime<Utc>,
}

// --- 4. Patch explícito de Alimento ---
// Campos opcionais enumerados um a um; nunca aceitamos um mapa
// campo-nome/valor arbitrário para dentro da persistência.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlimentoPatch {
    pub nome: Option<String>,
    pub categoria: Option<String>,
    pub subcategoria: Option<String>,
    pub tipo_conservacao: Option<String>,
    pub unidade_medida: Option<String>,
    pub quantidade_minima: Option<Decimal>,
    pub preco_unitario: Option<Decimal>,
    pub fornecedor: Option<String>,
    pub observacoes: Option<String>,
    pub ativo: Option<bool>,
}
