// src/handlers/tenant_usuarios.rs
//
// Equipe do restaurante, gerenciada pelo admin da própria unidade: listar,
// cadastrar, atualizar e remover o acesso de funcionários. Tudo aqui exige
// role 'admin' NO restaurante da URL; contas de administrador do SaaS são
// gerenciadas só pelo painel /api/admin.

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
    middleware::{auth::AuthenticatedUser, tenancy::TenantContext},
    models::{
        audit::RequestInfo,
        auth::User,
        tenancy::{MembroTenant, RoleType, Tenant},
    },
    services::auth::hash_senha,
};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NovoMembroPayload {
    #[validate(length(min = 2, message = "Nome deve ter no mínimo 2 caracteres."))]
    pub nome: String,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub senha: String,
    pub role: RoleType,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AtualizarMembroPayload {
    #[validate(length(min = 2, message = "Nome deve ter no mínimo 2 caracteres."))]
    pub nome: Option<String>,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub senha: Option<String>,
    pub role: Option<RoleType>,
}

/// Contas fora do alcance do admin de restaurante: administradores do SaaS e
/// usuários de outro cliente. Devolve o motivo da negativa (ou None).
pub fn pode_gerenciar(alvo: &User, tenant: &Tenant) -> Option<&'static str> {
    if alvo.is_admin {
        return Some("Administradores do sistema não são gerenciados por aqui");
    }
    if alvo.cliente_id != tenant.cliente_id {
        return Some("Usuário pertence a outro cliente");
    }
    None
}

/// GET /api/tenant/{tenant_id}/usuarios
pub async fn listar(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    TenantContext(tenant): TenantContext,
) -> Result<Json<Vec<MembroTenant>>, AppError> {
    state
        .access_service
        .evaluate(&user, tenant.id, RoleType::Admin)
        .await?;
    let membros = state.tenancy_repo.list_members(tenant.id).await?;
    Ok(Json(membros))
}

/// POST /api/tenant/{tenant_id}/usuarios
/// Cria o funcionário já vinculado ao restaurante com o role pedido. A conta
/// nasce no cliente do restaurante, nunca como admin do SaaS.
pub async fn criar(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    TenantContext(tenant): TenantContext,
    info: RequestInfo,
    Json(payload): Json<NovoMembroPayload>,
) -> Result<(StatusCode, Json<User>), AppError> {
    state
        .access_service
        .evaluate(&user, tenant.id, RoleType::Admin)
        .await?;
    payload.validate()?;

    let senha_hash = hash_senha(payload.senha.clone()).await?;

    let mut tx = state.db_pool.begin().await?;
    let novo = state
        .user_repo
        .create_user(
            &mut *tx,
            tenant.cliente_id,
            &payload.nome,
            &payload.email,
            &senha_hash,
            false,
        )
        .await?;
    state
        .tenancy_repo
        .grant_membership(&mut *tx, novo.id, tenant.id, payload.role)
        .await?;
    state
        .audit_service
        .registrar_em(
            &mut *tx,
            Some(user.id),
            Some(tenant.id),
            "criar_membro",
            "users",
            Some(novo.id),
            Some(&format!("email={} role={:?}", novo.email, payload.role)),
            &info,
        )
        .await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(novo)))
}

/// PATCH /api/tenant/{tenant_id}/usuarios/{user_id}
pub async fn atualizar(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    TenantContext(tenant): TenantContext,
    Path((_, user_id)): Path<(Uuid, Uuid)>,
    info: RequestInfo,
    Json(payload): Json<AtualizarMembroPayload>,
) -> Result<Json<User>, AppError> {
    state
        .access_service
        .evaluate(&user, tenant.id, RoleType::Admin)
        .await?;
    payload.validate()?;

    let alvo = buscar_membro(&state, &tenant, user_id).await?;

    let senha_hash = match payload.senha.clone() {
        Some(senha) => Some(hash_senha(senha).await?),
        None => None,
    };

    let mut tx = state.db_pool.begin().await?;
    let atualizado = state
        .user_repo
        .update_user(
            &mut *tx,
            alvo.id,
            payload.nome.as_deref(),
            senha_hash.as_deref(),
            None,
        )
        .await?;
    if let Some(role) = payload.role {
        state
            .tenancy_repo
            .grant_membership(&mut *tx, alvo.id, tenant.id, role)
            .await?;
    }
    state
        .audit_service
        .registrar_em(
            &mut *tx,
            Some(user.id),
            Some(tenant.id),
            "atualizar_membro",
            "users",
            Some(alvo.id),
            None,
            &info,
        )
        .await?;
    tx.commit().await?;

    Ok(Json(atualizado))
}

/// DELETE /api/tenant/{tenant_id}/usuarios/{user_id}
/// Remove só o vínculo com ESTE restaurante; a conta segue existindo (e
/// segue valendo em outras unidades do mesmo cliente).
pub async fn remover(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    TenantContext(tenant): TenantContext,
    Path((_, user_id)): Path<(Uuid, Uuid)>,
    info: RequestInfo,
) -> Result<StatusCode, AppError> {
    state
        .access_service
        .evaluate(&user, tenant.id, RoleType::Admin)
        .await?;
    if user_id == user.id {
        return Err(AppError::InvalidState(
            "Você não pode remover seu próprio acesso".to_string(),
        ));
    }

    let alvo = buscar_membro(&state, &tenant, user_id).await?;

    let mut tx = state.db_pool.begin().await?;
    state
        .tenancy_repo
        .revoke_membership(&mut *tx, alvo.id, tenant.id)
        .await?;
    state
        .audit_service
        .registrar_em(
            &mut *tx,
            Some(user.id),
            Some(tenant.id),
            "remover_membro",
            "user_tenants",
            Some(alvo.id),
            None,
            &info,
        )
        .await?;
    tx.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Carrega o alvo e confere que ele é gerenciável por este restaurante:
/// precisa existir, estar ao alcance do admin da unidade e ter vínculo aqui.
async fn buscar_membro(
    state: &AppState,
    tenant: &Tenant,
    user_id: Uuid,
) -> Result<User, AppError> {
    let alvo = state
        .user_repo
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Usuário não encontrado".to_string()))?;
    if let Some(motivo) = pode_gerenciar(&alvo, tenant) {
        return Err(AppError::Forbidden(motivo.to_string()));
    }
    state
        .tenancy_repo
        .membership_of(alvo.id, tenant.id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound("Usuário não vinculado a este restaurante".to_string())
        })?;
    Ok(alvo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn tenant_teste(cliente_id: Uuid) -> Tenant {
        Tenant {
            id: Uuid::new_v4(),
            cliente_id,
            nome: "Unidade Centro".to_string(),
            slug: "unidade-centro".to_string(),
            email: "centro@rest.com".to_string(),
            telefone: None,
            cnpj: None,
            endereco: None,
            ativo: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn usuario_teste(cliente_id: Uuid, is_admin: bool) -> User {
        User {
            id: Uuid::new_v4(),
            cliente_id,
            nome: "João Lima".to_string(),
            email: "joao@restaurante.com.br".to_string(),
            senha_hash: "irrelevante".to_string(),
            is_admin,
            ativo: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn funcionario_do_mesmo_cliente_e_gerenciavel() {
        let cliente_id = Uuid::new_v4();
        let tenant = tenant_teste(cliente_id);
        let alvo = usuario_teste(cliente_id, false);
        assert_eq!(pode_gerenciar(&alvo, &tenant), None);
    }

    #[test]
    fn admin_do_saas_fica_fora_do_alcance() {
        let cliente_id = Uuid::new_v4();
        let tenant = tenant_teste(cliente_id);
        let alvo = usuario_teste(cliente_id, true);
        assert_eq!(
            pode_gerenciar(&alvo, &tenant),
            Some("Administradores do sistema não são gerenciados por aqui")
        );
    }

    #[test]
    fn usuario_de_outro_cliente_e_negado() {
        let tenant = tenant_teste(Uuid::new_v4());
        let alvo = usuario_teste(Uuid::new_v4(), false);
        assert_eq!(
            pode_gerenciar(&alvo, &tenant),
            Some("Usuário pertence a outro cliente")
        );
    }
}
