// src/db/inventory_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::inventory::{
        Alimento, AlimentoPatch, MovimentacaoDetalhada, MovimentacaoEstoque, TipoMovimentacao,
    },
};

#[derive(Clone)]
pub struct InventoryRepository {
    pool: PgPool,
}

impl InventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Alimentos
    // ---

    pub async fn list_alimentos(
        &self,
        tenant_id: Uuid,
        apenas_ativos: bool,
    ) -> Result<Vec<Alimento>, AppError> {
        let alimentos = sqlx::query_as::<_, Alimento>(
            r#"
            SELECT * FROM alimentos
            WHERE tenant_id = $1 AND (NOT $2 OR ativo)
            ORDER BY nome ASC
            "#,
        )
        .bind(tenant_id)
        .bind(apenas_ativos)
        .fetch_all(&self.pool)
        .await?;
        Ok(alimentos)
    }

    pub async fn find_alimento(
        &self,
        tenant_id: Uuid,
        alimento_id: Uuid,
    ) -> Result<Option<Alimento>, AppError> {
        let alimento = sqlx::query_as::<_, Alimento>(
            "SELECT * FROM alimentos WHERE id = $1 AND tenant_id = $2",
        )
        .bind(alimento_id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(alimento)
    }

    /// Busca o alimento com lock de linha (`FOR UPDATE`). Toda decisão de
    /// escrita sobre o contador de estoque parte desta leitura, dentro da
    /// mesma transação.
    pub async fn find_alimento_for_update<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        alimento_id: Uuid,
    ) -> Result<Option<Alimento>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let alimento = sqlx::query_as::<_, Alimento>(
            "SELECT * FROM alimentos WHERE id = $1 AND tenant_id = $2 FOR UPDATE",
        )
        .bind(alimento_id)
        .bind(tenant_id)
        .fetch_optional(executor)
        .await?;
        Ok(alimento)
    }

    pub async fn create_alimento<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        nome: &str,
        categoria: Option<&str>,
        subcategoria: Option<&str>,
        tipo_conservacao: Option<&str>,
        unidade_medida: Option<&str>,
        quantidade_minima: Decimal,
        preco_unitario: Option<Decimal>,
        fornecedor: Option<&str>,
        observacoes: Option<&str>,
        created_by: Uuid,
    ) -> Result<Alimento, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let alimento = sqlx::query_as::<_, Alimento>(
            r#"
            INSERT INTO alimentos (
                tenant_id, nome, categoria, subcategoria, tipo_conservacao,
                unidade_medida, quantidade_minima, preco_unitario, fornecedor,
                observacoes, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(nome)
        .bind(categoria)
        .bind(subcategoria)
        .bind(tipo_conservacao)
        .bind(unidade_medida)
        .bind(quantidade_minima)
        .bind(preco_unitario)
        .bind(fornecedor)
        .bind(observacoes)
        .bind(created_by)
        .fetch_one(executor)
        .await?;
        Ok(alimento)
    }

    /// Aplica um patch explícito, campo a campo, via COALESCE.
    pub async fn patch_alimento<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        alimento_id: Uuid,
        patch: &AlimentoPatch,
        updated_by: Uuid,
    ) -> Result<Alimento, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Alimento>(
            r#"
            UPDATE alimentos SET
                nome = COALESCE($3, nome),
                categoria = COALESCE($4, categoria),
                subcategoria = COALESCE($5, subcategoria),
                tipo_conservacao = COALESCE($6, tipo_conservacao),
                unidade_medida = COALESCE($7, unidade_medida),
                quantidade_minima = COALESCE($8, quantidade_minima),
                preco_unitario = COALESCE($9, preco_unitario),
                fornecedor = COALESCE($10, fornecedor),
                observacoes = COALESCE($11, observacoes),
                ativo = COALESCE($12, ativo),
                updated_by = $13,
                updated_at = now()
            WHERE id = $1 AND tenant_id = $2
            RETURNING *
            "#,
        )
        .bind(alimento_id)
        .bind(tenant_id)
        .bind(patch.nome.as_deref())
        .bind(patch.categoria.as_deref())
        .bind(patch.subcategoria.as_deref())
        .bind(patch.tipo_conservacao.as_deref())
        .bind(patch.unidade_medida.as_deref())
        .bind(patch.quantidade_minima)
        .bind(patch.preco_unitario)
        .bind(patch.fornecedor.as_deref())
        .bind(patch.observacoes.as_deref())
        .bind(patch.ativo)
        .bind(updated_by)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::NotFound("Alimento não encontrado".to_string()))
    }

    pub async fn delete_alimento<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        alimento_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM alimentos WHERE id = $1 AND tenant_id = $2")
            .bind(alimento_id)
            .bind(tenant_id)
            .execute(executor)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Alimento não encontrado".to_string()));
        }
        Ok(())
    }

    /// Grava o novo valor do contador agregado do alimento.
    pub async fn set_quantidade_estoque<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        alimento_id: Uuid,
        quantidade: Decimal,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "UPDATE alimentos SET quantidade_estoque = $3, updated_at = now()
             WHERE id = $1 AND tenant_id = $2",
        )
        .bind(alimento_id)
        .bind(tenant_id)
        .bind(quantidade)
        .execute(executor)
        .await?;
        Ok(())
    }

    // ---
    // Movimentações (livro-razão, write-once)
    // ---

    pub async fn record_movimentacao<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        alimento_id: Uuid,
        lote_id: Option<Uuid>,
        usuario_id: Uuid,
        tipo: TipoMovimentacao,
        quantidade: Decimal,
        quantidade_anterior: Decimal,
        quantidade_nova: Decimal,
        motivo: Option<&str>,
        qr_code_usado: Option<&str>,
    ) -> Result<MovimentacaoEstoque, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let movimentacao = sqlx::query_as::<_, MovimentacaoEstoque>(
            r#"
            INSERT INTO movimentacoes_estoque (
                tenant_id, alimento_id, lote_id, usuario_id, tipo, quantidade,
                quantidade_anterior, quantidade_nova, motivo, qr_code_usado
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(alimento_id)
        .bind(lote_id)
        .bind(usuario_id)
        .bind(tipo)
        .bind(quantidade)
        .bind(quantidade_anterior)
        .bind(quantidade_nova)
        .bind(motivo)
        .bind(qr_code_usado)
        .fetch_one(executor)
        .await?;
        Ok(movimentacao)
    }

    pub async fn list_movimentacoes(
        &self,
        tenant_id: Uuid,
        tipo: Option<TipoMovimentacao>,
        data_inicio: Option<DateTime<Utc>>,
        data_fim: Option<DateTime<Utc>>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<MovimentacaoDetalhada>, AppError> {
        let movimentacoes = sqlx::query_as::<_, MovimentacaoDetalhada>(
            r#"
            SELECT m.id, m.alimento_id, a.nome AS alimento_nome, u.nome AS usuario_nome,
                   m.lote_id, m.tipo, m.quantidade, m.quantidade_anterior,
                   m.quantidade_nova, m.motivo, m.qr_code_usado, m.created_at
            FROM movimentacoes_estoque m
            JOIN alimentos a ON a.id = m.alimento_id
            JOIN users u ON u.id = m.usuario_id
            WHERE m.tenant_id = $1
              AND ($2::tipo_movimentacao IS NULL OR m.tipo = $2)
              AND ($3::timestamptz IS NULL OR m.created_at >= $3)
              AND ($4::timestamptz IS NULL OR m.created_at <= $4)
            ORDER BY m.created_at DESC
            OFFSET $5 LIMIT $6
            "#,
        )
        .bind(tenant_id)
        .bind(tipo)
        .bind(data_inicio)
        .bind(data_fim)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(movimentacoes)
    }

    /// Remove movimentações anteriores ao corte e retorna o total deletado.
    /// Única deleção de rotina no livro-razão (varredura de retenção).
    pub async fn delete_movimentacoes_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM movimentacoes_estoque WHERE created_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
