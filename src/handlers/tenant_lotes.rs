// src/handlers/tenant_lotes.rs
//
// Lotes de produção: criação (com etiqueta na fila), listagens, alertas de
// validade, reimpressão e o PDF da etiqueta.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, tenancy::TenantContext},
    models::{
        audit::RequestInfo,
        lote::{AlertasLotesResponse, PrintJob, ProdutoLote},
        tenancy::RoleType,
    },
    services::lote_service::{montar_etiqueta, NovoLotePayload, DIAS_ALERTA_VENCIMENTO},
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoteCriadoResponse {
    pub lote: ProdutoLote,
    // Um job por cópia de etiqueta pedida
    pub print_jobs: Vec<PrintJob>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListarLotesQuery {
    pub alimento_id: Option<Uuid>,
    pub ativo: Option<bool>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VencendoQuery {
    pub dias: Option<i64>,
}

/// POST /api/tenant/{tenant_id}/lotes
pub async fn criar(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    TenantContext(tenant): TenantContext,
    info: RequestInfo,
    Json(payload): Json<NovoLotePayload>,
) -> Result<(StatusCode, Json<LoteCriadoResponse>), AppError> {
    state
        .access_service
        .evaluate(&user, tenant.id, RoleType::Admin)
        .await?;
    let (lote, print_jobs) = state
        .lote_service
        .criar_lote(tenant.id, user.id, &payload, &info)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(LoteCriadoResponse { lote, print_jobs }),
    ))
}

/// GET /api/tenant/{tenant_id}/lotes
pub async fn listar(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    TenantContext(tenant): TenantContext,
    Query(query): Query<ListarLotesQuery>,
) -> Result<Json<Vec<ProdutoLote>>, AppError> {
    state
        .access_service
        .evaluate(&user, tenant.id, RoleType::Leitura)
        .await?;
    let offset = query.offset.unwrap_or(0).max(0);
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let lotes = state
        .lote_service
        .listar(tenant.id, query.alimento_id, query.ativo, offset, limit)
        .await?;
    Ok(Json(lotes))
}

/// GET /api/tenant/{tenant_id}/lotes/vencendo?dias=7
pub async fn vencendo(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    TenantContext(tenant): TenantContext,
    Query(query): Query<VencendoQuery>,
) -> Result<Json<Vec<ProdutoLote>>, AppError> {
    state
        .access_service
        .evaluate(&user, tenant.id, RoleType::Leitura)
        .await?;
    let dias = query.dias.unwrap_or(DIAS_ALERTA_VENCIMENTO).clamp(1, 365);
    let lotes = state.lote_service.listar_vencendo(tenant.id, dias).await?;
    Ok(Json(lotes))
}

/// GET /api/tenant/{tenant_id}/lotes/alertas
pub async fn alertas(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    TenantContext(tenant): TenantContext,
) -> Result<Json<AlertasLotesResponse>, AppError> {
    state
        .access_service
        .evaluate(&user, tenant.id, RoleType::Leitura)
        .await?;
    Ok(Json(state.lote_service.alertas(tenant.id).await?))
}

/// GET /api/tenant/{tenant_id}/lotes/{lote_id}
pub async fn buscar(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    TenantContext(tenant): TenantContext,
    Path((_, lote_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ProdutoLote>, AppError> {
    state
        .access_service
        .evaluate(&user, tenant.id, RoleType::Leitura)
        .await?;
    Ok(Json(state.lote_service.buscar(tenant.id, lote_id).await?))
}

/// POST /api/tenant/{tenant_id}/lotes/{lote_id}/reimprimir
pub async fn reimprimir(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    TenantContext(tenant): TenantContext,
    Path((_, lote_id)): Path<(Uuid, Uuid)>,
    info: RequestInfo,
) -> Result<(StatusCode, Json<PrintJob>), AppError> {
    state
        .access_service
        .evaluate(&user, tenant.id, RoleType::Admin)
        .await?;
    let job = state
        .lote_service
        .reimprimir(tenant.id, user.id, lote_id, &info)
        .await?;
    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /api/tenant/{tenant_id}/lotes/{lote_id}/etiqueta — PDF da etiqueta
pub async fn etiqueta_pdf(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    TenantContext(tenant): TenantContext,
    Path((_, lote_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    state
        .access_service
        .evaluate(&user, tenant.id, RoleType::Leitura)
        .await?;

    let lote = state.lote_service.buscar(tenant.id, lote_id).await?;
    let alimento = state
        .inventory_repo
        .find_alimento(tenant.id, lote.alimento_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Alimento não encontrado".to_string()))?;

    let etiqueta = montar_etiqueta(
        &tenant.nome,
        &tenant.email,
        tenant.telefone.as_deref(),
        &alimento.nome,
        &lote,
    );
    let pdf = state.etiqueta_service.renderizar(&etiqueta)?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"etiqueta-{}.pdf\"", lote.lote_numero),
            ),
        ],
        pdf,
    ))
}
