// src/db/audit_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::audit::AuditLog};

#[derive(Clone)]
pub struct AuditRepository {
    pool: PgPool,
}

impl AuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Executor padrão para registros fora de transação.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Append na trilha. Recebe o executor do chamador: quando a ação de
    /// negócio roda em transação, o rollback leva o registro junto.
    pub async fn insert<'e, E>(
        &self,
        executor: E,
        user_id: Option<Uuid>,
        tenant_id: Option<Uuid>,
        action: &str,
        resource: &str,
        resource_id: Option<Uuid>,
        details: Option<&str>,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<AuditLog, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let audit = sqlx::query_as::<_, AuditLog>(
            r#"
            INSERT INTO audit_logs (
                user_id, tenant_id, action, resource, resource_id,
                details, ip_address, user_agent
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(tenant_id)
        .bind(action)
        .bind(resource)
        .bind(resource_id)
        .bind(details)
        .bind(ip_address)
        .bind(user_agent)
        .fetch_one(executor)
        .await?;
        Ok(audit)
    }

    pub async fn list(
        &self,
        tenant_id: Option<Uuid>,
        action: Option<&str>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<AuditLog>, AppError> {
        let logs = sqlx::query_as::<_, AuditLog>(
            r#"
            SELECT * FROM audit_logs
            WHERE ($1::uuid IS NULL OR tenant_id = $1)
              AND ($2::varchar IS NULL OR action = $2)
            ORDER BY created_at DESC
            OFFSET $3 LIMIT $4
            "#,
        )
        .bind(tenant_id)
        .bind(action)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(logs)
    }
}
