// src/handlers/admin_audit.rs

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    common::error::AppError, config::AppState, middleware::auth::SaasAdmin,
    models::audit::AuditLog,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditQuery {
    pub tenant_id: Option<Uuid>,
    pub action: Option<String>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

/// GET /api/admin/audit — leitura da trilha, restrita ao admin do SaaS
pub async fn listar(
    State(state): State<AppState>,
    SaasAdmin(_admin): SaasAdmin,
    Query(query): Query<AuditQuery>,
) -> Result<Json<Vec<AuditLog>>, AppError> {
    let offset = query.offset.unwrap_or(0).max(0);
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let logs = state
        .audit_service
        .listar(query.tenant_id, query.action.as_deref(), offset, limit)
        .await?;
    Ok(Json(logs))
}
