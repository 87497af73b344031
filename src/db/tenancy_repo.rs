// src/db/tenancy_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::tenancy::{Cliente, MembroTenant, RoleType, Tenant, UserTenant},
};

#[derive(Clone)]
pub struct TenancyRepository {
    pool: PgPool,
}

impl TenancyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Clientes (empresas)
    // ---

    pub async fn find_cliente(&self, id: Uuid) -> Result<Option<Cliente>, AppError> {
        let cliente = sqlx::query_as::<_, Cliente>("SELECT * FROM clientes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(cliente)
    }

    pub async fn list_clientes(&self) -> Result<Vec<Cliente>, AppError> {
        let clientes =
            sqlx::query_as::<_, Cliente>("SELECT * FROM clientes ORDER BY nome_empresa ASC")
                .fetch_all(&self.pool)
                .await?;
        Ok(clientes)
    }

    pub async fn create_cliente<'e, E>(
        &self,
        executor: E,
        nome_empresa: &str,
        email: &str,
        telefone: Option<&str>,
        cnpj: Option<&str>,
        endereco: Option<&str>,
        cidade: Option<&str>,
        estado: Option<&str>,
    ) -> Result<Cliente, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Cliente>(
            r#"
            INSERT INTO clientes (nome_empresa, email, telefone, cnpj, endereco, cidade, estado)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(nome_empresa)
        .bind(email)
        .bind(telefone)
        .bind(cnpj)
        .bind(endereco)
        .bind(cidade)
        .bind(estado)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    let constraint = db_err.constraint().unwrap_or_default();
                    if constraint.contains("cnpj") {
                        return AppError::Conflict("CNPJ já cadastrado.".to_string());
                    }
                    return AppError::Conflict(format!("E-mail '{}' já está em uso.", email));
                }
            }
            e.into()
        })
    }

    pub async fn set_cliente_ativo<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        ativo: bool,
    ) -> Result<Cliente, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Cliente>(
            "UPDATE clientes SET ativo = $2, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(ativo)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::NotFound("Cliente não encontrado".to_string()))
    }

    pub async fn delete_cliente<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM clientes WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Cliente não encontrado".to_string()));
        }
        Ok(())
    }

    // ---
    // Tenants (restaurantes)
    // ---

    pub async fn find_tenant(&self, id: Uuid) -> Result<Option<Tenant>, AppError> {
        let tenant = sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(tenant)
    }

    pub async fn find_tenant_by_slug(&self, slug: &str) -> Result<Option<Tenant>, AppError> {
        let tenant = sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(tenant)
    }

    pub async fn list_tenants(&self) -> Result<Vec<Tenant>, AppError> {
        let tenants = sqlx::query_as::<_, Tenant>("SELECT * FROM tenants ORDER BY nome ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(tenants)
    }

    pub async fn create_tenant<'e, E>(
        &self,
        executor: E,
        cliente_id: Uuid,
        nome: &str,
        slug: &str,
        email: &str,
        telefone: Option<&str>,
        cnpj: Option<&str>,
        endereco: Option<&str>,
    ) -> Result<Tenant, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Tenant>(
            r#"
            INSERT INTO tenants (cliente_id, nome, slug, email, telefone, cnpj, endereco)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(cliente_id)
        .bind(nome)
        .bind(slug)
        .bind(email)
        .bind(telefone)
        .bind(cnpj)
        .bind(endereco)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::Conflict(format!("Slug '{}' já está em uso.", slug));
                }
            }
            e.into()
        })
    }

    pub async fn set_tenant_ativo<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        ativo: bool,
    ) -> Result<Tenant, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Tenant>(
            "UPDATE tenants SET ativo = $2, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(ativo)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::NotFound("Restaurante não encontrado".to_string()))
    }

    pub async fn delete_tenant<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM tenants WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Restaurante não encontrado".to_string()));
        }
        Ok(())
    }

    // ---
    // Associações (membership com role)
    // ---

    pub async fn membership_of(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<Option<UserTenant>, AppError> {
        let membership = sqlx::query_as::<_, UserTenant>(
            "SELECT * FROM user_tenants WHERE user_id = $1 AND tenant_id = $2",
        )
        .bind(user_id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(membership)
    }

    /// Equipe de um restaurante: usuários associados com seus roles.
    pub async fn list_members(&self, tenant_id: Uuid) -> Result<Vec<MembroTenant>, AppError> {
        let membros = sqlx::query_as::<_, MembroTenant>(
            r#"
            SELECT u.id, u.nome, u.email, u.ativo, ut.role, ut.created_at AS desde
            FROM users u
            JOIN user_tenants ut ON ut.user_id = u.id
            WHERE ut.tenant_id = $1
            ORDER BY u.nome ASC
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(membros)
    }

    /// Concede (ou atualiza) o acesso de um usuário a um restaurante.
    pub async fn grant_membership<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        tenant_id: Uuid,
        role: RoleType,
    ) -> Result<UserTenant, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let membership = sqlx::query_as::<_, UserTenant>(
            r#"
            INSERT INTO user_tenants (user_id, tenant_id, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, tenant_id)
            DO UPDATE SET role = $3
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(tenant_id)
        .bind(role)
        .fetch_one(executor)
        .await?;
        Ok(membership)
    }

    pub async fn revoke_membership<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "DELETE FROM user_tenants WHERE user_id = $1 AND tenant_id = $2",
        )
        .bind(user_id)
        .bind(tenant_id)
        .execute(executor)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(
                "Usuário não tem acesso a este restaurante".to_string(),
            ));
        }
        Ok(())
    }

    /// Restaurantes de um usuário. Com `apenas_ativos`, filtra os bloqueados
    /// (visão usada na emissão de token); sem o filtro, a visão de perfil
    /// mostra também os bloqueados para o cliente poder explicar a negativa.
    pub async fn tenants_of_user(
        &self,
        user_id: Uuid,
        apenas_ativos: bool,
    ) -> Result<Vec<Tenant>, AppError> {
        let tenants = sqlx::query_as::<_, Tenant>(
            r#"
            SELECT t.* FROM tenants t
            JOIN user_tenants ut ON ut.tenant_id = t.id
            WHERE ut.user_id = $1 AND (NOT $2 OR t.ativo)
            ORDER BY t.nome ASC
            "#,
        )
        .bind(user_id)
        .bind(apenas_ativos)
        .fetch_all(&self.pool)
        .await?;
        Ok(tenants)
    }

    pub async fn all_active_tenants(&self) -> Result<Vec<Tenant>, AppError> {
        let tenants =
            sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE ativo ORDER BY nome ASC")
                .fetch_all(&self.pool)
                .await?;
        Ok(tenants)
    }
}
