// src/handlers/tenant_alimentos.rs
//
// Catálogo de alimentos e livro de movimentações, no escopo de um
// restaurante. Leitura exige role 'leitura'; mutação exige 'admin'.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, tenancy::TenantContext},
    models::{
        audit::RequestInfo,
        inventory::{
            Alimento, AlimentoPatch, MovimentacaoDetalhada, MovimentacaoEstoque, TipoMovimentacao,
        },
        tenancy::RoleType,
    },
    services::inventory_service::NovaMovimentacaoPayload,
};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NovoAlimentoPayload {
    #[validate(length(min = 2, message = "Nome deve ter no mínimo 2 caracteres."))]
    pub nome: String,
    pub categoria: Option<String>,
    pub subcategoria: Option<String>,
    pub tipo_conservacao: Option<String>,
    pub unidade_medida: Option<String>,
    pub quantidade_minima: Option<Decimal>,
    pub preco_unitario: Option<Decimal>,
    pub fornecedor: Option<String>,
    pub observacoes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListarAlimentosQuery {
    #[serde(default)]
    pub incluir_inativos: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovimentacoesQuery {
    pub tipo: Option<TipoMovimentacao>,
    pub data_inicio: Option<DateTime<Utc>>,
    pub data_fim: Option<DateTime<Utc>>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

/// GET /api/tenant/{tenant_id}/alimentos
pub async fn listar(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    TenantContext(tenant): TenantContext,
    Query(query): Query<ListarAlimentosQuery>,
) -> Result<Json<Vec<Alimento>>, AppError> {
    state
        .access_service
        .evaluate(&user, tenant.id, RoleType::Leitura)
        .await?;
    let alimentos = state
        .inventory_repo
        .list_alimentos(tenant.id, !query.incluir_inativos)
        .await?;
    Ok(Json(alimentos))
}

/// GET /api/tenant/{tenant_id}/alimentos/{alimento_id}
pub async fn buscar(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    TenantContext(tenant): TenantContext,
    Path((_, alimento_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Alimento>, AppError> {
    state
        .access_service
        .evaluate(&user, tenant.id, RoleType::Leitura)
        .await?;
    state
        .inventory_repo
        .find_alimento(tenant.id, alimento_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Alimento não encontrado".to_string()))
}

/// GET /api/tenant/{tenant_id}/alimentos/estoque-baixo
pub async fn estoque_baixo(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    TenantContext(tenant): TenantContext,
) -> Result<Json<Vec<Alimento>>, AppError> {
    state
        .access_service
        .evaluate(&user, tenant.id, RoleType::Leitura)
        .await?;
    let alimentos = state
        .inventory_service
        .alimentos_abaixo_do_minimo(tenant.id)
        .await?;
    Ok(Json(alimentos))
}

/// POST /api/tenant/{tenant_id}/alimentos
pub async fn criar(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    TenantContext(tenant): TenantContext,
    info: RequestInfo,
    Json(payload): Json<NovoAlimentoPayload>,
) -> Result<(StatusCode, Json<Alimento>), AppError> {
    state
        .access_service
        .evaluate(&user, tenant.id, RoleType::Admin)
        .await?;
    payload.validate()?;

    let mut tx = state.db_pool.begin().await?;
    let alimento = state
        .inventory_repo
        .create_alimento(
            &mut *tx,
            tenant.id,
            &payload.nome,
            payload.categoria.as_deref(),
            payload.subcategoria.as_deref(),
            payload.tipo_conservacao.as_deref(),
            payload.unidade_medida.as_deref(),
            payload.quantidade_minima.unwrap_or(Decimal::ZERO),
            payload.preco_unitario,
            payload.fornecedor.as_deref(),
            payload.observacoes.as_deref(),
            user.id,
        )
        .await?;
    state
        .audit_service
        .registrar_em(
            &mut *tx,
            Some(user.id),
            Some(tenant.id),
            "criar_alimento",
            "alimentos",
            Some(alimento.id),
            Some(&format!("nome={}", alimento.nome)),
            &info,
        )
        .await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(alimento)))
}

/// PATCH /api/tenant/{tenant_id}/alimentos/{alimento_id}
pub async fn atualizar(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    TenantContext(tenant): TenantContext,
    Path((_, alimento_id)): Path<(Uuid, Uuid)>,
    info: RequestInfo,
    Json(patch): Json<AlimentoPatch>,
) -> Result<Json<Alimento>, AppError> {
    state
        .access_service
        .evaluate(&user, tenant.id, RoleType::Admin)
        .await?;

    let mut tx = state.db_pool.begin().await?;
    let alimento = state
        .inventory_repo
        .patch_alimento(&mut *tx, tenant.id, alimento_id, &patch, user.id)
        .await?;
    state
        .audit_service
        .registrar_em(
            &mut *tx,
            Some(user.id),
            Some(tenant.id),
            "atualizar_alimento",
            "alimentos",
            Some(alimento.id),
            None,
            &info,
        )
        .await?;
    tx.commit().await?;

    Ok(Json(alimento))
}

/// DELETE /api/tenant/{tenant_id}/alimentos/{alimento_id}
pub async fn remover(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    TenantContext(tenant): TenantContext,
    Path((_, alimento_id)): Path<(Uuid, Uuid)>,
    info: RequestInfo,
) -> Result<StatusCode, AppError> {
    state
        .access_service
        .evaluate(&user, tenant.id, RoleType::Admin)
        .await?;

    let mut tx = state.db_pool.begin().await?;
    state
        .inventory_repo
        .delete_alimento(&mut *tx, tenant.id, alimento_id)
        .await?;
    state
        .audit_service
        .registrar_em(
            &mut *tx,
            Some(user.id),
            Some(tenant.id),
            "remover_alimento",
            "alimentos",
            Some(alimento_id),
            None,
            &info,
        )
        .await?;
    tx.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/tenant/{tenant_id}/movimentacoes
pub async fn listar_movimentacoes(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    TenantContext(tenant): TenantContext,
    Query(query): Query<MovimentacoesQuery>,
) -> Result<Json<Vec<MovimentacaoDetalhada>>, AppError> {
    state
        .access_service
        .evaluate(&user, tenant.id, RoleType::Leitura)
        .await?;
    let offset = query.offset.unwrap_or(0).max(0);
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let movimentacoes = state
        .inventory_service
        .listar_movimentacoes(
            tenant.id,
            query.tipo,
            query.data_inicio,
            query.data_fim,
            offset,
            limit,
        )
        .await?;
    Ok(Json(movimentacoes))
}

/// POST /api/tenant/{tenant_id}/movimentacoes — entrada, saída ou ajuste manual.
/// Entrada e ajuste mexem no inventário para cima: exigem 'admin'. Saída é o
/// dia a dia da cozinha: 'leitura' basta.
pub async fn criar_movimentacao(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    TenantContext(tenant): TenantContext,
    info: RequestInfo,
    Json(payload): Json<NovaMovimentacaoPayload>,
) -> Result<(StatusCode, Json<MovimentacaoEstoque>), AppError> {
    let requerido = match payload.tipo {
        TipoMovimentacao::Entrada | TipoMovimentacao::Ajuste => RoleType::Admin,
        TipoMovimentacao::Saida | TipoMovimentacao::Uso => RoleType::Leitura,
    };
    state
        .access_service
        .evaluate(&user, tenant.id, requerido)
        .await?;
    let movimentacao = state
        .inventory_service
        .registrar_movimentacao(tenant.id, user.id, &payload, &info)
        .await?;
    Ok((StatusCode::CREATED, Json(movimentacao)))
}
