// src/db/lote_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::lote::{LoteAlerta, PrintJob, ProdutoLote, StatusPrintJob},
};

/// Erro interno do insert de lote: distingue colisão de identificador
/// (regenerável) de qualquer outra falha.
pub enum LoteInsertError {
    IdentificadorDuplicado,
    Outro(AppError),
}

pub struct NovoLote<'a> {
    pub tenant_id: Uuid,
    pub alimento_id: Uuid,
    pub lote_numero: &'a str,
    pub qr_code: &'a str,
    pub data_fabricacao: DateTime<Utc>,
    pub data_validade: DateTime<Utc>,
    pub quantidade_produzida: Decimal,
    pub unidade_medida: Option<&'a str>,
    pub quantidade_etiquetas: i32,
    pub fabricante: Option<&'a str>,
    pub sif: Option<&'a str>,
    pub peso_liquido: Option<&'a str>,
    pub ingredientes: Option<&'a str>,
    pub modo_conservacao: Option<&'a str>,
    pub responsavel_tecnico: Option<&'a str>,
    pub observacoes: Option<&'a str>,
    pub created_by: Uuid,
}

#[derive(Clone)]
pub struct LoteRepository {
    pool: PgPool,
}

impl LoteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Lotes
    // ---

    /// Insere o lote com `quantidade_disponivel = quantidade_produzida`.
    /// Colisão de qr_code ou lote_numero vira `IdentificadorDuplicado` para o
    /// service regenerar e tentar de novo.
    pub async fn insert_lote<'e, E>(
        &self,
        executor: E,
        novo: &NovoLote<'_>,
    ) -> Result<ProdutoLote, LoteInsertError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, ProdutoLote>(
            r#"
            INSERT INTO produto_lotes (
                tenant_id, alimento_id, lote_numero, qr_code,
                data_fabricacao, data_validade,
                quantidade_produzida, quantidade_disponivel, unidade_medida,
                quantidade_etiquetas, fabricante, sif, peso_liquido,
                ingredientes, modo_conservacao, responsavel_tecnico,
                observacoes, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING *
            "#,
        )
        .bind(novo.tenant_id)
        .bind(novo.alimento_id)
        .bind(novo.lote_numero)
        .bind(novo.qr_code)
        .bind(novo.data_fabricacao)
        .bind(novo.data_validade)
        .bind(novo.quantidade_produzida)
        .bind(novo.unidade_medida)
        .bind(novo.quantidade_etiquetas)
        .bind(novo.fabricante)
        .bind(novo.sif)
        .bind(novo.peso_liquido)
        .bind(novo.ingredientes)
        .bind(novo.modo_conservacao)
        .bind(novo.responsavel_tecnico)
        .bind(novo.observacoes)
        .bind(novo.created_by)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return LoteInsertError::IdentificadorDuplicado;
                }
            }
            LoteInsertError::Outro(e.into())
        })
    }

    pub async fn find_lote(
        &self,
        tenant_id: Uuid,
        lote_id: Uuid,
    ) -> Result<Option<ProdutoLote>, AppError> {
        let lote = sqlx::query_as::<_, ProdutoLote>(
            "SELECT * FROM produto_lotes WHERE id = $1 AND tenant_id = $2",
        )
        .bind(lote_id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(lote)
    }

    /// Lookup somente-leitura pelo token do QR (usado por `validar`).
    pub async fn find_lote_by_qr(
        &self,
        tenant_id: Uuid,
        qr_code: &str,
    ) -> Result<Option<ProdutoLote>, AppError> {
        let lote = sqlx::query_as::<_, ProdutoLote>(
            "SELECT * FROM produto_lotes WHERE qr_code = $1 AND tenant_id = $2",
        )
        .bind(qr_code)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(lote)
    }

    /// Lookup com lock de linha para o fluxo de consumo. Dois `usar`
    /// simultâneos no mesmo lote serializam aqui.
    pub async fn find_lote_by_qr_for_update<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        qr_code: &str,
    ) -> Result<Option<ProdutoLote>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let lote = sqlx::query_as::<_, ProdutoLote>(
            "SELECT * FROM produto_lotes WHERE qr_code = $1 AND tenant_id = $2 FOR UPDATE",
        )
        .bind(qr_code)
        .bind(tenant_id)
        .fetch_optional(executor)
        .await?;
        Ok(lote)
    }

    pub async fn list_lotes(
        &self,
        tenant_id: Uuid,
        alimento_id: Option<Uuid>,
        ativo: Option<bool>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<ProdutoLote>, AppError> {
        let lotes = sqlx::query_as::<_, ProdutoLote>(
            r#"
            SELECT * FROM produto_lotes
            WHERE tenant_id = $1
              AND ($2::uuid IS NULL OR alimento_id = $2)
              AND ($3::boolean IS NULL OR ativo = $3)
            ORDER BY created_at DESC
            OFFSET $4 LIMIT $5
            "#,
        )
        .bind(tenant_id)
        .bind(alimento_id)
        .bind(ativo)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(lotes)
    }

    /// Lotes ativos, não esgotados, vencendo dentro da janela.
    pub async fn list_lotes_vencendo(
        &self,
        tenant_id: Uuid,
        ate: DateTime<Utc>,
        agora: DateTime<Utc>,
    ) -> Result<Vec<ProdutoLote>, AppError> {
        let lotes = sqlx::query_as::<_, ProdutoLote>(
            r#"
            SELECT * FROM produto_lotes
            WHERE tenant_id = $1 AND ativo AND NOT usado_completamente
              AND data_validade >= $3 AND data_validade <= $2
            ORDER BY data_validade ASC
            "#,
        )
        .bind(tenant_id)
        .bind(ate)
        .bind(agora)
        .fetch_all(&self.pool)
        .await?;
        Ok(lotes)
    }

    /// Alertas: vencidos (antes de `agora`) ou vencendo (até `ate`), ambos com
    /// saldo disponível.
    pub async fn list_alertas(
        &self,
        tenant_id: Uuid,
        agora: DateTime<Utc>,
        ate: DateTime<Utc>,
        vencidos: bool,
    ) -> Result<Vec<LoteAlerta>, AppError> {
        let alertas = sqlx::query_as::<_, LoteAlerta>(
            r#"
            SELECT l.id, l.alimento_id, a.nome AS alimento_nome, l.lote_numero,
                   l.data_validade, l.quantidade_disponivel, l.unidade_medida
            FROM produto_lotes l
            JOIN alimentos a ON a.id = l.alimento_id
            WHERE l.tenant_id = $1 AND l.ativo AND NOT l.usado_completamente
              AND l.quantidade_disponivel > 0
              AND (($4 AND l.data_validade < $2)
                   OR (NOT $4 AND l.data_validade >= $2 AND l.data_validade <= $3))
            ORDER BY l.data_validade ASC
            "#,
        )
        .bind(tenant_id)
        .bind(agora)
        .bind(ate)
        .bind(vencidos)
        .fetch_all(&self.pool)
        .await?;
        Ok(alertas)
    }

    /// Grava o novo saldo do lote e a flag de esgotamento.
    pub async fn set_quantidade_disponivel<'e, E>(
        &self,
        executor: E,
        lote_id: Uuid,
        quantidade_disponivel: Decimal,
        usado_completamente: bool,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "UPDATE produto_lotes SET quantidade_disponivel = $2,
                    usado_completamente = $3, updated_at = now()
             WHERE id = $1",
        )
        .bind(lote_id)
        .bind(quantidade_disponivel)
        .bind(usado_completamente)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn marcar_etiqueta_impressa<'e, E>(
        &self,
        executor: E,
        lote_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "UPDATE produto_lotes SET etiqueta_impressa = TRUE, updated_at = now() WHERE id = $1",
        )
        .bind(lote_id)
        .execute(executor)
        .await?;
        Ok(())
    }

    // ---
    // Print Jobs
    // ---

    pub async fn enqueue_print_job<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        lote_id: Uuid,
        etiqueta_data: &str,
    ) -> Result<PrintJob, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let job = sqlx::query_as::<_, PrintJob>(
            r#"
            INSERT INTO print_jobs (tenant_id, lote_id, status, etiqueta_data)
            VALUES ($1, $2, 'pending', $3)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(lote_id)
        .bind(etiqueta_data)
        .fetch_one(executor)
        .await?;
        Ok(job)
    }

    pub async fn find_print_job(
        &self,
        tenant_id: Uuid,
        job_id: Uuid,
    ) -> Result<Option<PrintJob>, AppError> {
        let job = sqlx::query_as::<_, PrintJob>(
            "SELECT * FROM print_jobs WHERE id = $1 AND tenant_id = $2",
        )
        .bind(job_id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(job)
    }

    pub async fn list_pending_print_jobs(
        &self,
        tenant_id: Uuid,
        limit: i64,
    ) -> Result<Vec<PrintJob>, AppError> {
        let jobs = sqlx::query_as::<_, PrintJob>(
            r#"
            SELECT * FROM print_jobs
            WHERE tenant_id = $1 AND status = 'pending'
            ORDER BY created_at ASC
            LIMIT $2
            "#,
        )
        .bind(tenant_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(jobs)
    }

    pub async fn list_print_jobs(
        &self,
        tenant_id: Uuid,
        status: Option<StatusPrintJob>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<PrintJob>, AppError> {
        let jobs = sqlx::query_as::<_, PrintJob>(
            r#"
            SELECT * FROM print_jobs
            WHERE tenant_id = $1
              AND ($2::status_print_job IS NULL OR status = $2)
            ORDER BY created_at DESC
            OFFSET $3 LIMIT $4
            "#,
        )
        .bind(tenant_id)
        .bind(status)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(jobs)
    }

    /// Marca o job como em impressão e incrementa a tentativa. O predicado de
    /// status no WHERE é o que impede dois agentes de reivindicarem o mesmo
    /// job: o segundo UPDATE não encontra linha e devolve `None`.
    pub async fn mark_job_printing<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        job_id: Uuid,
    ) -> Result<Option<PrintJob>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let job = sqlx::query_as::<_, PrintJob>(
            r#"
            UPDATE print_jobs SET status = 'printing', printed_at = now(),
                   tentativas = tentativas + 1
            WHERE id = $1 AND tenant_id = $2 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(job_id)
        .bind(tenant_id)
        .fetch_optional(executor)
        .await?;
        Ok(job)
    }

    /// `None` quando o job não está mais em `printing`.
    pub async fn mark_job_completed<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        job_id: Uuid,
    ) -> Result<Option<PrintJob>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let job = sqlx::query_as::<_, PrintJob>(
            r#"
            UPDATE print_jobs SET status = 'completed', completed_at = now()
            WHERE id = $1 AND tenant_id = $2 AND status = 'printing'
            RETURNING *
            "#,
        )
        .bind(job_id)
        .bind(tenant_id)
        .fetch_optional(executor)
        .await?;
        Ok(job)
    }

    /// Marca o job como falho. Com menos de 3 tentativas ele volta para
    /// `pending` e será pego de novo pelo polling. `None` quando o job não
    /// está mais em `printing`.
    pub async fn mark_job_failed<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        job_id: Uuid,
        erro_mensagem: &str,
    ) -> Result<Option<PrintJob>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let job = sqlx::query_as::<_, PrintJob>(
            r#"
            UPDATE print_jobs SET
                erro_mensagem = $3,
                status = CASE WHEN tentativas < 3 THEN 'pending'::status_print_job
                              ELSE 'failed'::status_print_job END
            WHERE id = $1 AND tenant_id = $2 AND status = 'printing'
            RETURNING *
            "#,
        )
        .bind(job_id)
        .bind(tenant_id)
        .bind(erro_mensagem)
        .fetch_optional(executor)
        .await?;
        Ok(job)
    }
}
