// src/services/access.rs
//
// Avaliador de acesso centralizado: TODA operação de mutação passa por aqui.
// Nenhum handler refaz lookup de associação por conta própria.

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::TenancyRepository,
    models::{
        auth::User,
        tenancy::{RoleType, Tenant},
    },
};

#[derive(Clone)]
pub struct AccessService {
    tenancy_repo: TenancyRepository,
}

/// 'admin' exige role exatamente 'admin'; 'leitura' é satisfeito por ambos.
pub fn role_satisfaz(role: RoleType, requerido: RoleType) -> bool {
    match requerido {
        RoleType::Admin => role == RoleType::Admin,
        RoleType::Leitura => true,
    }
}

/// Núcleo puro da avaliação, sem banco: recebe os fatos já carregados e
/// devolve o motivo da negativa (ou None para permitir).
pub fn avaliar_membro(
    user_ativo: bool,
    cliente_ativo: bool,
    role: Option<RoleType>,
    requerido: RoleType,
) -> Option<&'static str> {
    if !user_ativo {
        return Some("Usuário inativo");
    }
    if !cliente_ativo {
        return Some("Cliente inativo");
    }
    match role {
        None => Some("Usuário não tem acesso a este restaurante"),
        Some(r) if !role_satisfaz(r, requerido) => {
            Some("Role 'admin' requerido neste restaurante")
        }
        Some(_) => None,
    }
}

impl AccessService {
    pub fn new(tenancy_repo: TenancyRepository) -> Self {
        Self { tenancy_repo }
    }

    /// Permite ou nega. Admin do SaaS passa direto; os demais precisam estar
    /// ativos, com cliente ativo, e ter a associação com o role requerido.
    /// Nunca rebaixa o escopo silenciosamente: nega com motivo legível.
    pub async fn evaluate(
        &self,
        user: &User,
        tenant_id: Uuid,
        requerido: RoleType,
    ) -> Result<(), AppError> {
        if user.is_admin {
            return Ok(());
        }

        let cliente_ativo = self
            .tenancy_repo
            .find_cliente(user.cliente_id)
            .await?
            .map(|c| c.ativo)
            .unwrap_or(false);

        let role = self
            .tenancy_repo
            .membership_of(user.id, tenant_id)
            .await?
            .map(|m| m.role);

        match avaliar_membro(user.ativo, cliente_ativo, role, requerido) {
            None => Ok(()),
            Some(motivo) => Err(AppError::Forbidden(motivo.to_string())),
        }
    }

    /// Restaurantes que entram no token: apenas os ativos.
    /// Admin do SaaS enxerga todos os restaurantes ativos do sistema.
    pub async fn tenants_para_token(&self, user: &User) -> Result<Vec<Tenant>, AppError> {
        if user.is_admin {
            return self.tenancy_repo.all_active_tenants().await;
        }
        self.tenancy_repo.tenants_of_user(user.id, true).await
    }

    /// Visão de perfil: inclui restaurantes bloqueados, para o cliente poder
    /// explicar por que o acesso está negado.
    pub async fn tenants_para_exibicao(&self, user: &User) -> Result<Vec<Tenant>, AppError> {
        if user.is_admin {
            return self.tenancy_repo.all_active_tenants().await;
        }
        self.tenancy_repo.tenants_of_user(user.id, false).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_satisfaz_ambos_os_requisitos() {
        assert!(role_satisfaz(RoleType::Admin, RoleType::Admin));
        assert!(role_satisfaz(RoleType::Admin, RoleType::Leitura));
    }

    #[test]
    fn leitura_nao_satisfaz_admin() {
        assert!(!role_satisfaz(RoleType::Leitura, RoleType::Admin));
        assert!(role_satisfaz(RoleType::Leitura, RoleType::Leitura));
    }

    #[test]
    fn usuario_inativo_e_negado_antes_de_tudo() {
        let motivo = avaliar_membro(false, true, Some(RoleType::Admin), RoleType::Leitura);
        assert_eq!(motivo, Some("Usuário inativo"));
    }

    #[test]
    fn cliente_inativo_bloqueia_mesmo_com_role_admin() {
        let motivo = avaliar_membro(true, false, Some(RoleType::Admin), RoleType::Admin);
        assert_eq!(motivo, Some("Cliente inativo"));
    }

    #[test]
    fn sem_associacao_nega_em_outro_restaurante() {
        let motivo = avaliar_membro(true, true, None, RoleType::Leitura);
        assert_eq!(motivo, Some("Usuário não tem acesso a este restaurante"));
    }

    #[test]
    fn leitura_negada_em_operacao_admin_mas_permitida_em_leitura() {
        assert_eq!(
            avaliar_membro(true, true, Some(RoleType::Leitura), RoleType::Admin),
            Some("Role 'admin' requerido neste restaurante")
        );
        assert_eq!(
            avaliar_membro(true, true, Some(RoleType::Leitura), RoleType::Leitura),
            None
        );
    }
}
