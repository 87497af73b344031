// src/handlers/admin_usuarios.rs
//
// Painel administrativo do SaaS: equipe dos clientes e acessos por
// restaurante.

use axum::{
    extract::{Path, Query, State},
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
    models::{
        audit::RequestInfo,
        auth::User,
        tenancy::{RoleType, UserTenant},
    },
    services::auth::hash_senha,
};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NovoUsuarioPayload {
    pub cliente_id: Uuid,
    #[validate(length(min = 2, message = "Nome deve ter no mínimo 2 caracteres."))]
    pub nome: String,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub senha: String,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AtualizarUsuarioPayload {
    #[validate(length(min = 2, message = "Nome deve ter no mínimo 2 caracteres."))]
    pub nome: Option<String>,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub senha: Option<String>,
    pub ativo: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipPayload {
    pub role: RoleType,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListarUsuariosQuery {
    pub cliente_id: Option<Uuid>,
}

/// GET /api/admin/usuarios?clienteId=...
pub async fn listar(
    State(state): State<AppState>,
    SaasAdmin(_admin): SaasAdmin,
    Query(query): Query<ListarUsuariosQuery>,
) -> Result<Json<Vec<User>>, AppError> {
    let usuarios = match query.cliente_id {
        Some(cliente_id) => state.user_repo.list_by_cliente(cliente_id).await?,
        None => state.user_repo.list_all().await?,
    };
    Ok(Json(usuarios))
}

/// POST /api/admin/usuarios
pub async fn criar(
    State(state): State<AppState>,
    SaasAdmin(admin): SaasAdmin,
    info: RequestInfo,
    Json(payload): Json<NovoUsuarioPayload>,
) -> Result<(StatusCode, Json<User>), AppError> {
    payload.validate()?;

    state
        .tenancy_repo
        .find_cliente(payload.cliente_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Cliente não encontrado".to_string()))?;

    let senha_hash = hash_senha(payload.senha.clone()).await?;

    let mut tx = state.db_pool.begin().await?;
    let usuario = state
        .user_repo
        .create_user(
            &mut *tx,
            payload.cliente_id,
            &payload.nome,
            &payload.email,
            &senha_hash,
            payload.is_admin,
        )
        .await?;
    state
        .audit_service
        .registrar_em(
            &mut *tx,
            Some(admin.id),
            None,
            "criar_usuario",
            "users",
            Some(usuario.id),
            Some(&format!("email={}", usuario.email)),
            &info,
        )
        .await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(usuario)))
}

/// PATCH /api/admin/usuarios/{user_id}
pub async fn atualizar(
    State(state): State<AppState>,
    SaasAdmin(admin): SaasAdmin,
    Path(user_id): Path<Uuid>,
    info: RequestInfo,
    Json(payload): Json<AtualizarUsuarioPayload>,
) -> Result<Json<User>, AppError> {
    payload.validate()?;

    let senha_hash = match payload.senha.clone() {
        Some(senha) => Some(hash_senha(senha).await?),
        None => None,
    };

    let mut tx = state.db_pool.begin().await?;
    let usuario = state
        .user_repo
        .update_user(
            &mut *tx,
            user_id,
            payload.nome.as_deref(),
            senha_hash.as_deref(),
            payload.ativo,
        )
        .await?;
    state
        .audit_service
        .registrar_em(
            &mut *tx,
            Some(admin.id),
            None,
            "atualizar_usuario",
            "users",
            Some(usuario.id),
            None,
            &info,
        )
        .await?;
    tx.commit().await?;

    Ok(Json(usuario))
}

/// DELETE /api/admin/usuarios/{user_id}
pub async fn remover(
    State(state): State<AppState>,
    SaasAdmin(admin): SaasAdmin,
    Path(user_id): Path<Uuid>,
    info: RequestInfo,
) -> Result<StatusCode, AppError> {
    let mut tx = state.db_pool.begin().await?;
    state.user_repo.delete_user(&mut *tx, user_id).await?;
    state
        .audit_service
        .registrar_em(
            &mut *tx,
            Some(admin.id),
            None,
            "remover_usuario",
            "users",
            Some(user_id),
            None,
            &info,
        )
        .await?;
    tx.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/admin/usuarios/{user_id}/tenants/{tenant_id}
/// Concede (ou atualiza) o acesso com o role informado. O usuário e o
/// restaurante precisam pertencer ao MESMO cliente.
pub async fn conceder_acesso(
    State(state): State<AppState>,
    SaasAdmin(admin): SaasAdmin,
    Path((user_id, tenant_id)): Path<(Uuid, Uuid)>,
    info: RequestInfo,
    Json(payload): Json<MembershipPayload>,
) -> Result<Json<UserTenant>, AppError> {
    let usuario = state
        .user_repo
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Usuário não encontrado".to_string()))?;
    let tenant = state
        .tenancy_repo
        .find_tenant(tenant_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Restaurante não encontrado".to_string()))?;
    if usuario.cliente_id != tenant.cliente_id {
        return Err(AppError::InvalidState(
            "Usuário e restaurante pertencem a clientes diferentes".to_string(),
        ));
    }

    let mut tx = state.db_pool.begin().await?;
    let membership = state
        .tenancy_repo
        .grant_membership(&mut *tx, user_id, tenant_id, payload.role)
        .await?;
    state
        .audit_service
        .registrar_em(
            &mut *tx,
            Some(admin.id),
            Some(tenant_id),
            "conceder_acesso",
            "user_tenants",
            Some(user_id),
            Some(&format!("role={:?}", payload.role)),
            &info,
        )
        .await?;
    tx.commit().await?;

    Ok(Json(membership))
}

/// DELETE /api/admin/usuarios/{user_id}/tenants/{tenant_id}
pub async fn revogar_acesso(
    State(state): State<AppState>,
    SaasAdmin(admin): SaasAdmin,
    Path((user_id, tenant_id)): Path<(Uuid, Uuid)>,
    info: RequestInfo,
) -> Result<StatusCode, AppError> {
    let mut tx = state.db_pool.begin().await?;
    state
        .tenancy_repo
        .revoke_membership(&mut *tx, user_id, tenant_id)
        .await?;
    state
        .audit_service
        .registrar_em(
            &mut *tx,
            Some(admin.id),
            Some(tenant_id),
            "revogar_acesso",
            "user_tenants",
            Some(user_id),
            None,
            &info,
        )
        .await?;
    tx.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}
