// src/handlers/print_jobs.rs
//
// Fila de impressão consumida pelo app desktop via polling:
// pending -> printing -> completed | failed (failed com menos de 3
// tentativas volta para pending).

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, tenancy::TenantContext},
    models::{
        lote::{PrintJob, StatusPrintJob},
        tenancy::RoleType,
    },
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListarJobsQuery {
    pub status: Option<StatusPrintJob>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendentesQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FalhaPayload {
    #[validate(length(min = 1, max = 500, message = "Mensagem de erro deve ter entre 1 e 500 caracteres."))]
    pub erro_mensagem: String,
}

/// GET /api/tenant/{tenant_id}/print-jobs/pendentes
pub async fn pendentes(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    TenantContext(tenant): TenantContext,
    Query(query): Query<PendentesQuery>,
) -> Result<Json<Vec<PrintJob>>, AppError> {
    state
        .access_service
        .evaluate(&user, tenant.id, RoleType::Leitura)
        .await?;
    let limit = query.limit.unwrap_or(10).clamp(1, 50);
    Ok(Json(state.lote_service.jobs_pendentes(tenant.id, limit).await?))
}

/// GET /api/tenant/{tenant_id}/print-jobs
pub async fn listar(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    TenantContext(tenant): TenantContext,
    Query(query): Query<ListarJobsQuery>,
) -> Result<Json<Vec<PrintJob>>, AppError> {
    state
        .access_service
        .evaluate(&user, tenant.id, RoleType::Leitura)
        .await?;
    let offset = query.offset.unwrap_or(0).max(0);
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let jobs = state
        .lote_service
        .listar_jobs(tenant.id, query.status, offset, limit)
        .await?;
    Ok(Json(jobs))
}

/// GET /api/tenant/{tenant_id}/print-jobs/{job_id}
pub async fn buscar(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    TenantContext(tenant): TenantContext,
    Path((_, job_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<PrintJob>, AppError> {
    state
        .access_service
        .evaluate(&user, tenant.id, RoleType::Leitura)
        .await?;
    Ok(Json(state.lote_service.buscar_job(tenant.id, job_id).await?))
}

/// GET /api/tenant/{tenant_id}/print-jobs/{job_id}/pdf — PDF a partir do
/// snapshot congelado no momento do enfileiramento
pub async fn pdf(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    TenantContext(tenant): TenantContext,
    Path((_, job_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    state
        .access_service
        .evaluate(&user, tenant.id, RoleType::Leitura)
        .await?;
    let job = state.lote_service.buscar_job(tenant.id, job_id).await?;
    let pdf = state.etiqueta_service.gerar_pdf(&job)?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"job-{}.pdf\"", job.id),
            ),
        ],
        pdf,
    ))
}

/// POST /api/tenant/{tenant_id}/print-jobs/{job_id}/iniciar
pub async fn iniciar(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    TenantContext(tenant): TenantContext,
    Path((_, job_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<PrintJob>, AppError> {
    state
        .access_service
        .evaluate(&user, tenant.id, RoleType::Leitura)
        .await?;
    Ok(Json(state.lote_service.iniciar_job(tenant.id, job_id).await?))
}

/// POST /api/tenant/{tenant_id}/print-jobs/{job_id}/concluir
pub async fn concluir(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    TenantContext(tenant): TenantContext,
    Path((_, job_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<PrintJob>, AppError> {
    state
        .access_service
        .evaluate(&user, tenant.id, RoleType::Leitura)
        .await?;
    Ok(Json(state.lote_service.concluir_job(tenant.id, job_id).await?))
}

/// POST /api/tenant/{tenant_id}/print-jobs/{job_id}/falhar
pub async fn falhar(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    TenantContext(tenant): TenantContext,
    Path((_, job_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<FalhaPayload>,
) -> Result<Json<PrintJob>, AppError> {
    state
        .access_service
        .evaluate(&user, tenant.id, RoleType::Leitura)
        .await?;
    payload.validate()?;
    let job = state
        .lote_service
        .falhar_job(tenant.id, job_id, &payload.erro_mensagem)
        .await?;
    Ok(Json(job))
}
