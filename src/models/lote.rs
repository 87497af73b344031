// src/models/lote.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// --- 1. Lote de Produto (cada etiqueta impressa rastreia um destes) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProdutoLote {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub alimento_id: Uuid,

    // Identificação
    pub lote_numero: String,
    pub qr_code: String, // token único, formato LOT-{uuid}

    // Datas
    pub data_fabricacao: DateTime<Utc>,
    pub data_validade: DateTime<Utc>,

    // Quantidades
    pub quantidade_produzida: Decimal,
    pub quantidade_disponivel: Decimal,
    pub unidade_medida: Option<String>,
    pub quantidade_etiquetas: i32,

    // Informações da etiqueta
    pub fabricante: Option<String>,
    pub sif: Option<String>,
    pub peso_liquido: Option<String>,
    pub ingredientes: Option<String>,
    pub modo_conservacao: Option<String>,
    pub responsavel_tecnico: Option<String>,
    pub observacoes: Option<String>,

    // Status
    pub ativo: bool,
    pub usado_completamente: bool, // true quando quantidade_disponivel = 0
    pub etiqueta_impressa: bool,

    // Auditoria
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- 2. Status de um job de impressão ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "status_print_job", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum StatusPrintJob {
    Pending,
    Printing,
    Completed,
    Failed,
}

// --- 3. Print Job (fila consumida pelo app desktop via polling) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PrintJob {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub lote_id: Uuid,
    pub status: StatusPrintJob,
    pub tentativas: i32,
    pub erro_mensagem: Option<String>,
    // Snapshot JSON com todos os dados da etiqueta
    pub etiqueta_data: Option<String>,
    pub created_at: DateTime<Utc>,
    pub printed_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

// --- 4. Snapshot da etiqueta ---
// Desnormalizado de propósito: uma edição posterior do Alimento/Tenant não
// pode mudar uma etiqueta que já está na fila de impressão.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EtiquetaData {
    pub tenant_nome: String,
    pub tenant_email: String,
    pub tenant_telefone: Option<String>,
    pub produto_nome: String,
    pub fabricante: String,
    pub sif: String,
    pub lote_numero: String,
    pub qr_code: String,
    pub data_fabricacao: String, // dd/mm/aaaa
    pub data_validade: String,   // dd/mm/aaaa
    pub peso_liquido: String,
    pub ingredientes: String,
    pub modo_conservacao: String,
    pub responsavel_tecnico: String,
}

// --- 5. Alertas de validade ---
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LoteAlerta {
    pub id: Uuid,
    pub alimento_id: Uuid,
    pub alimento_nome: String,
    pub lote_numero: String,
    pub data_validade: DateTime<Utc>,
    pub quantidade_disponivel: Decimal,
    pub unidade_medida: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertasLotesResponse {
    pub vencidos: Vec<LoteAlerta>,
    pub vencendo: Vec<LoteAlerta>,
    pub total_vencidos: usize,
    pub total_vencendo: usize,
}
