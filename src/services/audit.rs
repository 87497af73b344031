// src/services/audit.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::AuditRepository,
    models::audit::{AuditLog, RequestInfo},
};

/// Fachada da trilha de auditoria para registros fora de transação.
/// Mutações transacionais gravam direto via `AuditRepository::insert` com o
/// executor da própria transação.
#[derive(Clone)]
pub struct AuditService {
    audit_repo: AuditRepository,
}

impl AuditService {
    pub fn new(audit_repo: AuditRepository) -> Self {
        Self { audit_repo }
    }

    /// Registra a ação e falha junto com ela: trilha incompleta é pior que
    /// uma resposta 500.
    pub async fn registrar(
        &self,
        user_id: Option<Uuid>,
        tenant_id: Option<Uuid>,
        action: &str,
        resource: &str,
        resource_id: Option<Uuid>,
        details: Option<&str>,
        info: &RequestInfo,
    ) -> Result<AuditLog, AppError> {
        self.audit_repo
            .insert(
                self.audit_repo.pool(),
                user_id,
                tenant_id,
                action,
                resource,
                resource_id,
                details,
                info.ip.as_deref(),
                info.user_agent.as_deref(),
            )
            .await
    }

    /// Variante transacional: o registro vive e morre com a transação do
    /// chamador.
    pub async fn registrar_em<'e, E>(
        &self,
        executor: E,
        user_id: Option<Uuid>,
        tenant_id: Option<Uuid>,
        action: &str,
        resource: &str,
        resource_id: Option<Uuid>,
        details: Option<&str>,
        info: &RequestInfo,
    ) -> Result<AuditLog, AppError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        self.audit_repo
            .insert(
                executor,
                user_id,
                tenant_id,
                action,
                resource,
                resource_id,
                details,
                info.ip.as_deref(),
                info.user_agent.as_deref(),
            )
            .await
    }

    pub async fn listar(
        &self,
        tenant_id: Option<Uuid>,
        action: Option<&str>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<AuditLog>, AppError> {
        self.audit_repo.list(tenant_id, action, offset, limit).await
    }
}
