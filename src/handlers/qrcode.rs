// src/handlers/qrcode.rs
//
// Fluxo da cozinha: escanear a etiqueta, conferir o lote e dar baixa.
// Ambas as operações valem para o role 'leitura' — é o fluxo de quem está
// no fogão, não do gestor.

use axum::{extract::State, Json};
use serde::Deserialize;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, tenancy::TenantContext},
    models::{audit::RequestInfo, tenancy::RoleType},
    services::lote_service::{ConsumoLotePayload, ConsumoResponse, ValidacaoLoteResponse},
};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ValidarPayload {
    #[validate(length(min = 1, message = "O QR Code é obrigatório."))]
    pub qr_code: String,
}

/// POST /api/tenant/{tenant_id}/qrcode/validar — consulta, nada muda
pub async fn validar(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    TenantContext(tenant): TenantContext,
    Json(payload): Json<ValidarPayload>,
) -> Result<Json<ValidacaoLoteResponse>, AppError> {
    state
        .access_service
        .evaluate(&user, tenant.id, RoleType::Leitura)
        .await?;
    payload.validate()?;
    let resposta = state.lote_service.validar(tenant.id, &payload.qr_code).await?;
    Ok(Json(resposta))
}

/// POST /api/tenant/{tenant_id}/qrcode/usar — baixa de consumo no lote
pub async fn usar(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    TenantContext(tenant): TenantContext,
    info: RequestInfo,
    Json(payload): Json<ConsumoLotePayload>,
) -> Result<Json<ConsumoResponse>, AppError> {
    state
        .access_service
        .evaluate(&user, tenant.id, RoleType::Leitura)
        .await?;
    let consumo = state
        .lote_service
        .consumir(tenant.id, user.id, &payload, &info)
        .await?;
    Ok(Json(consumo))
}
