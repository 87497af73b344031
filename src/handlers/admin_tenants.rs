// src/handlers/admin_tenants.rs
//
// Painel administrativo do SaaS: gestão de restaurantes (unidades).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::SaasAdmin,
    models::{audit::RequestInfo, tenancy::Tenant},
};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NovoTenantPayload {
    pub cliente_id: Uuid,
    #[validate(length(min = 2, message = "Nome deve ter no mínimo 2 caracteres."))]
    pub nome: String,
    // Identificador estilo subdomínio; único no sistema
    #[validate(length(min = 2, max = 63, message = "Slug deve ter entre 2 e 63 caracteres."))]
    pub slug: String,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    pub telefone: Option<String>,
    pub cnpj: Option<String>,
    pub endereco: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtivoPayload {
    pub ativo: bool,
}

/// GET /api/admin/tenants
pub async fn listar(
    State(state): State<AppState>,
    SaasAdmin(_admin): SaasAdmin,
) -> Result<Json<Vec<Tenant>>, AppError> {
    Ok(Json(state.tenancy_repo.list_tenants().await?))
}

/// GET /api/admin/tenants/{tenant_id}
pub async fn buscar(
    State(state): State<AppState>,
    SaasAdmin(_admin): SaasAdmin,
    Path(tenant_id): Path<Uuid>,
) -> Result<Json<Tenant>, AppError> {
    state
        .tenancy_repo
        .find_tenant(tenant_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Restaurante não encontrado".to_string()))
}

/// POST /api/admin/tenants
pub async fn criar(
    State(state): State<AppState>,
    SaasAdmin(admin): SaasAdmin,
    info: RequestInfo,
    Json(payload): Json<NovoTenantPayload>,
) -> Result<(StatusCode, Json<Tenant>), AppError> {
    payload.validate()?;
    if !slug_valido(&payload.slug) {
        return Err(AppError::InvalidState(
            "Slug deve conter apenas letras minúsculas, números e hífens".to_string(),
        ));
    }

    // O restaurante precisa pertencer a um cliente existente e ativo
    let cliente = state
        .tenancy_repo
        .find_cliente(payload.cliente_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Cliente não encontrado".to_string()))?;
    if !cliente.ativo {
        return Err(AppError::InvalidState("Cliente está desativado".to_string()));
    }

    let mut tx = state.db_pool.begin().await?;
    let tenant = state
        .tenancy_repo
        .create_tenant(
            &mut *tx,
            payload.cliente_id,
            &payload.nome,
            &payload.slug,
            &payload.email,
            payload.telefone.as_deref(),
            payload.cnpj.as_deref(),
            payload.endereco.as_deref(),
        )
        .await?;
    state
        .audit_service
        .registrar_em(
            &mut *tx,
            Some(admin.id),
            Some(tenant.id),
            "criar_tenant",
            "tenants",
            Some(tenant.id),
            Some(&format!("slug={}", tenant.slug)),
            &info,
        )
        .await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(tenant)))
}

/// PATCH /api/admin/tenants/{tenant_id}/ativo
pub async fn definir_ativo(
    State(state): State<AppState>,
    SaasAdmin(admin): SaasAdmin,
    Path(tenant_id): Path<Uuid>,
    info: RequestInfo,
    Json(payload): Json<AtivoPayload>,
) -> Result<Json<Tenant>, AppError> {
    let mut tx = state.db_pool.begin().await?;
    let tenant = state
        .tenancy_repo
        .set_tenant_ativo(&mut *tx, tenant_id, payload.ativo)
        .await?;
    let acao = if payload.ativo {
        "ativar_tenant"
    } else {
        "desativar_tenant"
    };
    state
        .audit_service
        .registrar_em(
            &mut *tx,
            Some(admin.id),
            Some(tenant.id),
            acao,
            "tenants",
            Some(tenant.id),
            None,
            &info,
        )
        .await?;
    tx.commit().await?;
    Ok(Json(tenant))
}

/// DELETE /api/admin/tenants/{tenant_id}
pub async fn remover(
    State(state): State<AppState>,
    SaasAdmin(admin): SaasAdmin,
    Path(tenant_id): Path<Uuid>,
    info: RequestInfo,
) -> Result<StatusCode, AppError> {
    let mut tx = state.db_pool.begin().await?;
    state.tenancy_repo.delete_tenant(&mut *tx, tenant_id).await?;
    state
        .audit_service
        .registrar_em(
            &mut *tx,
            Some(admin.id),
            Some(tenant_id),
            "remover_tenant",
            "tenants",
            Some(tenant_id),
            None,
            &info,
        )
        .await?;
    tx.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

fn slug_valido(slug: &str) -> bool {
    !slug.starts_with('-')
        && !slug.ends_with('-')
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_validos_e_invalidos() {
        assert!(slug_valido("unidade-centro"));
        assert!(slug_valido("filial2"));
        assert!(!slug_valido("Unidade"));
        assert!(!slug_valido("unidade_centro"));
        assert!(!slug_valido("-começa-com-hifen"));
        assert!(!slug_valido("termina-"));
    }
}
