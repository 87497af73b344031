// src/handlers/admin_clientes.rs
//
// Painel administrativo do SaaS: gestão de clientes (empresas).
// Todas as rotas exigem `is_admin`.

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
    models::{audit::RequestInfo, tenancy::Cliente},
};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NovoClientePayload {
    #[validate(length(min = 2, message = "Nome da empresa deve ter no mínimo 2 caracteres."))]
    pub nome_empresa: String,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    pub telefone: Option<String>,
    pub cnpj: Option<String>,
    pub endereco: Option<String>,
    pub cidade: Option<String>,
    pub estado: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtivoPayload {
    pub ativo: bool,
}

/// GET /api/admin/clientes
pub async fn listar(
    State(state): State<AppState>,
    SaasAdmin(_admin): SaasAdmin,
) -> Result<Json<Vec<Cliente>>, AppError> {
    Ok(Json(state.tenancy_repo.list_clientes().await?))
}

/// GET /api/admin/clientes/{cliente_id}
pub async fn buscar(
    State(state): State<AppState>,
    SaasAdmin(_admin): SaasAdmin,
    Path(cliente_id): Path<Uuid>,
) -> Result<Json<Cliente>, AppError> {
    state
        .tenancy_repo
        .find_cliente(cliente_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Cliente não encontrado".to_string()))
}

/// POST /api/admin/clientes
pub async fn criar(
    State(state): State<AppState>,
    SaasAdmin(admin): SaasAdmin,
    info: RequestInfo,
    Json(payload): Json<NovoClientePayload>,
) -> Result<(StatusCode, Json<Cliente>), AppError> {
    payload.validate()?;

    let mut tx = state.db_pool.begin().await?;
    let cliente = state
        .tenancy_repo
        .create_cliente(
            &mut *tx,
            &payload.nome_empresa,
            &payload.email,
            payload.telefone.as_deref(),
            payload.cnpj.as_deref(),
            payload.endereco.as_deref(),
            payload.cidade.as_deref(),
            payload.estado.as_deref(),
        )
        .await?;
    registrar_auditoria(&state, &mut tx, &admin, "criar_cliente", cliente.id, &info).await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(cliente)))
}

/// PATCH /api/admin/clientes/{cliente_id}/ativo
/// Desativar um cliente bloqueia o acesso de toda a sua equipe, em todas as
/// unidades, no próximo request.
pub async fn definir_ativo(
    State(state): State<AppState>,
    SaasAdmin(admin): SaasAdmin,
    Path(cliente_id): Path<Uuid>,
    info: RequestInfo,
    Json(payload): Json<AtivoPayload>,
) -> Result<Json<Cliente>, AppError> {
    let mut tx = state.db_pool.begin().await?;
    let cliente = state
        .tenancy_repo
        .set_cliente_ativo(&mut *tx, cliente_id, payload.ativo)
        .await?;
    let acao = if payload.ativo {
        "ativar_cliente"
    } else {
        "desativar_cliente"
    };
    registrar_auditoria(&state, &mut tx, &admin, acao, cliente.id, &info).await?;
    tx.commit().await?;
    Ok(Json(cliente))
}

/// DELETE /api/admin/clientes/{cliente_id}
pub async fn remover(
    State(state): State<AppState>,
    SaasAdmin(admin): SaasAdmin,
    Path(cliente_id): Path<Uuid>,
    info: RequestInfo,
) -> Result<StatusCode, AppError> {
    let mut tx = state.db_pool.begin().await?;
    state.tenancy_repo.delete_cliente(&mut *tx, cliente_id).await?;
    registrar_auditoria(&state, &mut tx, &admin, "remover_cliente", cliente_id, &info).await?;
    tx.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn registrar_auditoria(
    state: &AppState,
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    admin: &crate::models::auth::User,
    acao: &str,
    cliente_id: Uuid,
    info: &RequestInfo,
) -> Result<(), AppError> {
    state
        .audit_service
        .registrar_em(
            &mut **tx,
            Some(admin.id),
            None,
            acao,
            "clientes",
            Some(cliente_id),
            None,
            info,
        )
        .await?;
    Ok(())
}
