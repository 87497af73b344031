// src/middleware/tenancy.rs

use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use std::collections::HashMap;
use uuid::Uuid;

use crate::{common::error::AppError, config::AppState, models::tenancy::Tenant};

// O extrator do restaurante da rota.
// Lê o {tenant_id} do caminho e garante que o restaurante existe e está
// ativo. Restaurante inexistente, bloqueado ou fora do token responde 404:
// quem não tem acesso não descobre nem que ele existe.
#[derive(Debug, Clone)]
pub struct TenantContext(pub Tenant);

impl FromRequestParts<AppState> for TenantContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Path(params) = Path::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::NotFound("Restaurante não encontrado".to_string()))?;

        let tenant_id = params
            .get("tenant_id")
            .and_then(|raw| Uuid::parse_str(raw).ok())
            .ok_or_else(|| AppError::NotFound("Restaurante não encontrado".to_string()))?;

        // O auth_guard já rodou; sem claims aqui é bug de composição de rotas
        let claims = parts
            .extensions
            .get::<std::sync::Arc<crate::models::auth::Claims>>()
            .cloned()
            .ok_or(AppError::InvalidToken)?;

        if !claims.is_admin && !claims.tenant_ids.contains(&tenant_id) {
            return Err(AppError::NotFound("Restaurante não encontrado".to_string()));
        }

        let tenant = state
            .tenancy_repo
            .find_tenant(tenant_id)
            .await?
            .filter(|t| t.ativo)
            .ok_or_else(|| AppError::NotFound("Restaurante não encontrado".to_string()))?;

        Ok(TenantContext(tenant))
    }
}
