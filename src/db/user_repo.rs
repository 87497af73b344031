// src/db/user_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::auth::User};

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn list_by_cliente(&self, cliente_id: Uuid) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE cliente_id = $1 ORDER BY nome ASC",
        )
        .bind(cliente_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    pub async fn list_all(&self) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY nome ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    pub async fn create_user<'e, E>(
        &self,
        executor: E,
        cliente_id: Uuid,
        nome: &str,
        email: &str,
        senha_hash: &str,
        is_admin: bool,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (cliente_id, nome, email, senha_hash, is_admin)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(cliente_id)
        .bind(nome)
        .bind(email)
        .bind(senha_hash)
        .bind(is_admin)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::Conflict(format!("E-mail '{}' já está em uso.", email));
                }
            }
            e.into()
        })
    }

    pub async fn update_user<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        nome: Option<&str>,
        senha_hash: Option<&str>,
        ativo: Option<bool>,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                nome = COALESCE($2, nome),
                senha_hash = COALESCE($3, senha_hash),
                ativo = COALESCE($4, ativo),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(nome)
        .bind(senha_hash)
        .bind(ativo)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::NotFound("Usuário não encontrado".to_string()))
    }

    pub async fn delete_user<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Usuário não encontrado".to_string()));
        }
        Ok(())
    }
}
