// src/services/lote_service.rs
//
// Ciclo de vida dos lotes: criação (com entrada de estoque e etiqueta na
// fila), validação por QR Code, baixa por consumo e a fila de impressão.

use chrono::{DateTime, Datelike, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::{
        lote_repo::{LoteInsertError, NovoLote},
        AuditRepository, InventoryRepository, LoteRepository, TenancyRepository,
    },
    models::{
        audit::RequestInfo,
        inventory::TipoMovimentacao,
        lote::{
            AlertasLotesResponse, EtiquetaData, PrintJob, ProdutoLote, StatusPrintJob,
        },
    },
    services::inventory_service::aplicar_movimentacao,
};

/// Tentativas de regeneração quando o identificador colide com um existente.
const MAX_TENTATIVAS_IDENTIFICADOR: u32 = 3;

/// Janela padrão do alerta "vencendo em breve" nas listagens.
pub const DIAS_ALERTA_VENCIMENTO: i64 = 7;

/// Janela curta usada na classificação da leitura do QR Code.
pub const DIAS_AVISO_VALIDADE: i64 = 3;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NovoLotePayload {
    pub alimento_id: Uuid,
    pub data_fabricacao: DateTime<Utc>,
    pub data_validade: DateTime<Utc>,
    pub quantidade_produzida: Decimal,
    #[validate(range(min = 1, max = 100, message = "Quantidade de etiquetas deve estar entre 1 e 100."))]
    pub quantidade_etiquetas: Option<i32>,
    pub fabricante: Option<String>,
    pub sif: Option<String>,
    pub peso_liquido: Option<String>,
    pub ingredientes: Option<String>,
    pub modo_conservacao: Option<String>,
    pub responsavel_tecnico: Option<String>,
    #[validate(length(max = 1000, message = "Observações devem ter no máximo 1000 caracteres."))]
    pub observacoes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ConsumoLotePayload {
    #[validate(length(min = 1, message = "O QR Code é obrigatório."))]
    pub qr_code: String,
    // Ausente = consome todo o saldo restante do lote
    pub quantidade: Option<Decimal>,
    #[validate(length(max = 500, message = "O motivo deve ter no máximo 500 caracteres."))]
    pub motivo: Option<String>,
}

/// Classificação da validade na leitura do QR Code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusValidade {
    Valido,
    Vencendo,
    Vencido,
}

// Vencido é comparação direta de instantes: `num_days` trunca, e um lote
// vencido há poucas horas ainda renderia 0 dias.
pub fn classificar_validade(validade: DateTime<Utc>, agora: DateTime<Utc>) -> StatusValidade {
    if validade < agora {
        StatusValidade::Vencido
    } else if dias_para_vencer(validade, agora) <= DIAS_AVISO_VALIDADE {
        StatusValidade::Vencendo
    } else {
        StatusValidade::Valido
    }
}

/// Mensagem exibida para quem escaneou. Lote vencido segue utilizável — a
/// decisão é da cozinha — mas o aviso vem em primeiro lugar.
pub fn mensagem_validacao(
    valido: bool,
    status: StatusValidade,
    dias_para_vencer: i64,
    disponivel: Decimal,
) -> String {
    if !valido {
        return "Lote indisponível para consumo".to_string();
    }
    match status {
        StatusValidade::Vencido if dias_para_vencer == 0 => {
            "ATENÇÃO: lote VENCIDO hoje".to_string()
        }
        StatusValidade::Vencido => {
            format!("ATENÇÃO: lote VENCIDO há {} dia(s)", dias_para_vencer.abs())
        }
        StatusValidade::Vencendo => {
            format!("Lote vence em {} dia(s); saldo {}", dias_para_vencer, disponivel)
        }
        StatusValidade::Valido => format!("Lote válido; saldo {}", disponivel),
    }
}

// Resposta da validação de QR Code (somente leitura, nada muda no banco).
// Token desconhecido também responde por aqui, com `valido=false` — a leitura
// de uma etiqueta errada não é um erro HTTP.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidacaoLoteResponse {
    pub valido: bool,
    pub mensagem: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StatusValidade>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vencido: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dias_para_vencer: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alimento_nome: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lote: Option<ProdutoLote>,
}

impl ValidacaoLoteResponse {
    fn invalida(mensagem: &str) -> Self {
        Self {
            valido: false,
            mensagem: mensagem.to_string(),
            status: None,
            vencido: None,
            dias_para_vencer: None,
            alimento_nome: None,
            lote: None,
        }
    }
}

// Resposta do consumo: o app mostra o antes/depois para o operador conferir
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumoResponse {
    pub quantidade_consumida: Decimal,
    pub estoque_anterior: Decimal,
    pub estoque_novo: Decimal,
    pub lote_saldo_restante: Decimal,
    pub usado_completamente: bool,
    pub lote: ProdutoLote,
}

#[derive(Clone)]
pub struct LoteService {
    pool: PgPool,
    lote_repo: LoteRepository,
    inventory_repo: InventoryRepository,
    tenancy_repo: TenancyRepository,
    audit_repo: AuditRepository,
}

/// Número de lote legível: prefixos do restaurante e do alimento + data de
/// fabricação + sufixo aleatório. Ex.: `8C1A-D3F2-20250830-7A1C`. Único por
/// restaurante (constraint no banco).
pub fn gerar_lote_numero(
    tenant_id: Uuid,
    alimento_id: Uuid,
    data: DateTime<Utc>,
    sufixo: &str,
) -> String {
    let prefixo_tenant = tenant_id.simple().to_string()[..4].to_uppercase();
    let prefixo_alimento = alimento_id.simple().to_string()[..4].to_uppercase();
    format!(
        "{}-{}-{:04}{:02}{:02}-{}",
        prefixo_tenant,
        prefixo_alimento,
        data.year(),
        data.month(),
        data.day(),
        sufixo.to_uppercase()
    )
}

/// Sufixo de 4 hex novos a cada chamada (fonte: UUID v4).
pub fn gerar_sufixo() -> String {
    Uuid::new_v4().simple().to_string()[..4].to_string()
}

/// Token opaco que vai dentro do QR Code.
pub fn gerar_qr_token() -> String {
    format!("LOT-{}", Uuid::new_v4())
}

/// Dias (arredondados para baixo) até a validade; negativo quando já venceu.
pub fn dias_para_vencer(validade: DateTime<Utc>, agora: DateTime<Utc>) -> i64 {
    (validade - agora).num_days()
}

/// Transições da fila de impressão: pending -> printing -> completed | failed.
/// (Job falho com tentativas restantes volta a pending, mas isso é o banco
/// quem decide, dentro do próprio UPDATE.)
pub fn transicao_de_job_valida(atual: StatusPrintJob, alvo: StatusPrintJob) -> bool {
    matches!(
        (atual, alvo),
        (StatusPrintJob::Pending, StatusPrintJob::Printing)
            | (StatusPrintJob::Printing, StatusPrintJob::Completed)
            | (StatusPrintJob::Printing, StatusPrintJob::Failed)
    )
}

/// Baixa de consumo sobre o saldo do lote: devolve o novo saldo e se o lote
/// ficou esgotado. A mesma aritmética de `saida` do livro de movimentações.
pub fn consumir_do_lote(
    disponivel: Decimal,
    quantidade: Decimal,
) -> Result<(Decimal, bool), AppError> {
    let novo = aplicar_movimentacao(disponivel, TipoMovimentacao::Uso, quantidade)?;
    Ok((novo, novo == Decimal::ZERO))
}

impl LoteService {
    pub fn new(
        pool: PgPool,
        lote_repo: LoteRepository,
        inventory_repo: InventoryRepository,
        tenancy_repo: TenancyRepository,
        audit_repo: AuditRepository,
    ) -> Self {
        Self {
            pool,
            lote_repo,
            inventory_repo,
            tenancy_repo,
            audit_repo,
        }
    }

    /// Cria o lote, dá entrada do total produzido no estoque do alimento e
    /// enfileira uma etiqueta por cópia pedida. Tudo ou nada: uma transação só.
    ///
    /// Colisão de identificador (qr_code ou lote_numero) regenera e tenta de
    /// novo, até 3 vezes; depois disso é Conflict honesto.
    pub async fn criar_lote(
        &self,
        tenant_id: Uuid,
        usuario_id: Uuid,
        payload: &NovoLotePayload,
        info: &RequestInfo,
    ) -> Result<(ProdutoLote, Vec<PrintJob>), AppError> {
        payload.validate()?;
        if payload.data_validade <= payload.data_fabricacao {
            return Err(AppError::InvalidState(
                "Data de validade deve ser posterior à fabricação".to_string(),
            ));
        }
        if payload.quantidade_produzida <= Decimal::ZERO {
            return Err(AppError::InvalidState(
                "Quantidade produzida deve ser maior que zero".to_string(),
            ));
        }

        let tenant = self
            .tenancy_repo
            .find_tenant(tenant_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Restaurante não encontrado".to_string()))?;

        for tentativa in 1..=MAX_TENTATIVAS_IDENTIFICADOR {
            let lote_numero = gerar_lote_numero(
                tenant_id,
                payload.alimento_id,
                payload.data_fabricacao,
                &gerar_sufixo(),
            );
            let qr_code = gerar_qr_token();

            let mut tx = self.pool.begin().await?;

            let alimento = self
                .inventory_repo
                .find_alimento_for_update(&mut *tx, tenant_id, payload.alimento_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Alimento não encontrado".to_string()))?;
            if !alimento.ativo {
                return Err(AppError::InvalidState(
                    "Alimento está desativado".to_string(),
                ));
            }

            let novo = NovoLote {
                tenant_id,
                alimento_id: alimento.id,
                lote_numero: &lote_numero,
                qr_code: &qr_code,
                data_fabricacao: payload.data_fabricacao,
                data_validade: payload.data_validade,
                quantidade_produzida: payload.quantidade_produzida,
                unidade_medida: alimento.unidade_medida.as_deref(),
                quantidade_etiquetas: payload.quantidade_etiquetas.unwrap_or(1),
                fabricante: payload.fabricante.as_deref(),
                sif: payload.sif.as_deref(),
                peso_liquido: payload.peso_liquido.as_deref(),
                ingredientes: payload.ingredientes.as_deref(),
                modo_conservacao: payload.modo_conservacao.as_deref(),
                responsavel_tecnico: payload.responsavel_tecnico.as_deref(),
                observacoes: payload.observacoes.as_deref(),
                created_by: usuario_id,
            };

            let lote = match self.lote_repo.insert_lote(&mut *tx, &novo).await {
                Ok(lote) => lote,
                Err(LoteInsertError::IdentificadorDuplicado) => {
                    tx.rollback().await?;
                    tracing::warn!(
                        tentativa,
                        "Colisão de identificador de lote; regenerando"
                    );
                    continue;
                }
                Err(LoteInsertError::Outro(e)) => return Err(e),
            };

            // Entrada no estoque do alimento pelo total produzido
            let anterior = alimento.quantidade_estoque;
            let nova = aplicar_movimentacao(
                anterior,
                TipoMovimentacao::Entrada,
                payload.quantidade_produzida,
            )?;
            self.inventory_repo
                .set_quantidade_estoque(&mut *tx, tenant_id, alimento.id, nova)
                .await?;
            self.inventory_repo
                .record_movimentacao(
                    &mut *tx,
                    tenant_id,
                    alimento.id,
                    Some(lote.id),
                    usuario_id,
                    TipoMovimentacao::Entrada,
                    payload.quantidade_produzida,
                    anterior,
                    nova,
                    Some(&format!("Produção do lote {}", lote.lote_numero)),
                    None,
                )
                .await?;

            // Snapshot da etiqueta congelado no momento da criação; um job
            // por cópia pedida
            let etiqueta = montar_etiqueta(&tenant.nome, &tenant.email, tenant.telefone.as_deref(), &alimento.nome, &lote);
            let etiqueta_json = serde_json::to_string(&etiqueta)
                .map_err(|e| AppError::InternalServerError(e.into()))?;
            let mut jobs = Vec::with_capacity(lote.quantidade_etiquetas as usize);
            for _ in 0..lote.quantidade_etiquetas {
                let job = self
                    .lote_repo
                    .enqueue_print_job(&mut *tx, tenant_id, lote.id, &etiqueta_json)
                    .await?;
                jobs.push(job);
            }

            self.audit_repo
                .insert(
                    &mut *tx,
                    Some(usuario_id),
                    Some(tenant_id),
                    "criar_lote",
                    "produto_lotes",
                    Some(lote.id),
                    Some(&format!(
                        "lote={} alimento={} quantidade={}",
                        lote.lote_numero, alimento.nome, payload.quantidade_produzida
                    )),
                    info.ip.as_deref(),
                    info.user_agent.as_deref(),
                )
                .await?;

            tx.commit().await?;
            return Ok((lote, jobs));
        }

        Err(AppError::Conflict(
            "Não foi possível gerar um identificador único para o lote".to_string(),
        ))
    }

    /// Valida um QR Code sem alterar nada. Token desconhecido responde
    /// `valido=false`; lote vencido continua `valido` (o token existe e
    /// pertence ao restaurante), só vem marcado.
    pub async fn validar(
        &self,
        tenant_id: Uuid,
        qr_code: &str,
    ) -> Result<ValidacaoLoteResponse, AppError> {
        let Some(lote) = self.lote_repo.find_lote_by_qr(tenant_id, qr_code).await? else {
            return Ok(ValidacaoLoteResponse::invalida(
                "QR Code inválido ou não encontrado",
            ));
        };

        let alimento = self
            .inventory_repo
            .find_alimento(tenant_id, lote.alimento_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Alimento não encontrado".to_string()))?;

        let agora = Utc::now();
        let dias = dias_para_vencer(lote.data_validade, agora);
        let status = classificar_validade(lote.data_validade, agora);
        // Vencido continua válido para leitura; o aviso vai na mensagem
        let valido =
            lote.ativo && !lote.usado_completamente && lote.quantidade_disponivel > Decimal::ZERO;
        let mensagem = mensagem_validacao(valido, status, dias, lote.quantidade_disponivel);

        Ok(ValidacaoLoteResponse {
            valido,
            mensagem,
            status: Some(status),
            vencido: Some(status == StatusValidade::Vencido),
            dias_para_vencer: Some(dias),
            alimento_nome: Some(alimento.nome),
            lote: Some(lote),
        })
    }

    /// Consome do lote via QR Code. Lote e alimento são lidos com lock na
    /// mesma transação; dois consumos simultâneos do mesmo lote serializam e
    /// o segundo enxerga o saldo já debitado.
    pub async fn consumir(
        &self,
        tenant_id: Uuid,
        usuario_id: Uuid,
        payload: &ConsumoLotePayload,
        info: &RequestInfo,
    ) -> Result<ConsumoResponse, AppError> {
        payload.validate()?;

        let mut tx = self.pool.begin().await?;

        let lote = self
            .lote_repo
            .find_lote_by_qr_for_update(&mut *tx, tenant_id, &payload.qr_code)
            .await?
            .ok_or_else(|| AppError::NotFound("QR Code não encontrado".to_string()))?;

        if !lote.ativo {
            return Err(AppError::InvalidState("Lote está desativado".to_string()));
        }
        if lote.usado_completamente {
            return Err(AppError::InvalidState(
                "Lote já foi totalmente consumido".to_string(),
            ));
        }

        // Sem quantidade explícita, consome o saldo inteiro do lote
        let quantidade = payload.quantidade.unwrap_or(lote.quantidade_disponivel);
        if quantidade <= Decimal::ZERO {
            return Err(AppError::InvalidState(
                "Quantidade deve ser maior que zero".to_string(),
            ));
        }

        let (novo_saldo, esgotado) = consumir_do_lote(lote.quantidade_disponivel, quantidade)?;

        self.lote_repo
            .set_quantidade_disponivel(&mut *tx, lote.id, novo_saldo, esgotado)
            .await?;

        // Reflete a baixa no contador agregado do alimento
        let alimento = self
            .inventory_repo
            .find_alimento_for_update(&mut *tx, tenant_id, lote.alimento_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Alimento não encontrado".to_string()))?;
        let anterior = alimento.quantidade_estoque;
        let nova = aplicar_movimentacao(anterior, TipoMovimentacao::Uso, quantidade)?;
        self.inventory_repo
            .set_quantidade_estoque(&mut *tx, tenant_id, alimento.id, nova)
            .await?;

        self.inventory_repo
            .record_movimentacao(
                &mut *tx,
                tenant_id,
                alimento.id,
                Some(lote.id),
                usuario_id,
                TipoMovimentacao::Uso,
                quantidade,
                anterior,
                nova,
                payload.motivo.as_deref(),
                Some(&payload.qr_code),
            )
            .await?;

        self.audit_repo
            .insert(
                &mut *tx,
                Some(usuario_id),
                Some(tenant_id),
                "consumir_lote",
                "produto_lotes",
                Some(lote.id),
                Some(&format!(
                    "lote={} quantidade={} saldo_novo={}",
                    lote.lote_numero, quantidade, novo_saldo
                )),
                info.ip.as_deref(),
                info.user_agent.as_deref(),
            )
            .await?;

        tx.commit().await?;

        let lote_atual = self
            .lote_repo
            .find_lote(tenant_id, lote.id)
            .await?
            .ok_or_else(|| AppError::NotFound("Lote não encontrado".to_string()))?;

        Ok(ConsumoResponse {
            quantidade_consumida: quantidade,
            estoque_anterior: anterior,
            estoque_novo: nova,
            lote_saldo_restante: novo_saldo,
            usado_completamente: esgotado,
            lote: lote_atual,
        })
    }

    pub async fn buscar(&self, tenant_id: Uuid, lote_id: Uuid) -> Result<ProdutoLote, AppError> {
        self.lote_repo
            .find_lote(tenant_id, lote_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Lote não encontrado".to_string()))
    }

    pub async fn listar(
        &self,
        tenant_id: Uuid,
        alimento_id: Option<Uuid>,
        ativo: Option<bool>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<ProdutoLote>, AppError> {
        self.lote_repo
            .list_lotes(tenant_id, alimento_id, ativo, offset, limit)
            .await
    }

    pub async fn listar_vencendo(
        &self,
        tenant_id: Uuid,
        dias: i64,
    ) -> Result<Vec<ProdutoLote>, AppError> {
        let agora = Utc::now();
        self.lote_repo
            .list_lotes_vencendo(tenant_id, agora + Duration::days(dias), agora)
            .await
    }

    /// Painel de alertas: vencidos com saldo e vencendo na janela.
    pub async fn alertas(&self, tenant_id: Uuid) -> Result<AlertasLotesResponse, AppError> {
        let agora = Utc::now();
        let ate = agora + Duration::days(DIAS_ALERTA_VENCIMENTO);

        let vencidos = self.lote_repo.list_alertas(tenant_id, agora, ate, true).await?;
        let vencendo = self.lote_repo.list_alertas(tenant_id, agora, ate, false).await?;

        Ok(AlertasLotesResponse {
            total_vencidos: vencidos.len(),
            total_vencendo: vencendo.len(),
            vencidos,
            vencendo,
        })
    }

    /// Reenfileira a etiqueta do lote com um snapshot novo.
    pub async fn reimprimir(
        &self,
        tenant_id: Uuid,
        usuario_id: Uuid,
        lote_id: Uuid,
        info: &RequestInfo,
    ) -> Result<PrintJob, AppError> {
        let lote = self.buscar(tenant_id, lote_id).await?;
        let tenant = self
            .tenancy_repo
            .find_tenant(tenant_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Restaurante não encontrado".to_string()))?;
        let alimento = self
            .inventory_repo
            .find_alimento(tenant_id, lote.alimento_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Alimento não encontrado".to_string()))?;

        let etiqueta = montar_etiqueta(&tenant.nome, &tenant.email, tenant.telefone.as_deref(), &alimento.nome, &lote);
        let etiqueta_json = serde_json::to_string(&etiqueta)
            .map_err(|e| AppError::InternalServerError(e.into()))?;

        let mut tx = self.pool.begin().await?;
        let job = self
            .lote_repo
            .enqueue_print_job(&mut *tx, tenant_id, lote.id, &etiqueta_json)
            .await?;
        self.audit_repo
            .insert(
                &mut *tx,
                Some(usuario_id),
                Some(tenant_id),
                "reimprimir_etiqueta",
                "print_jobs",
                Some(job.id),
                Some(&format!("lote={}", lote.lote_numero)),
                info.ip.as_deref(),
                info.user_agent.as_deref(),
            )
            .await?;
        tx.commit().await?;
        Ok(job)
    }

    // ---
    // Fila de impressão (consumida por polling do app desktop)
    // ---

    pub async fn jobs_pendentes(
        &self,
        tenant_id: Uuid,
        limit: i64,
    ) -> Result<Vec<PrintJob>, AppError> {
        self.lote_repo.list_pending_print_jobs(tenant_id, limit).await
    }

    pub async fn listar_jobs(
        &self,
        tenant_id: Uuid,
        status: Option<StatusPrintJob>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<PrintJob>, AppError> {
        self.lote_repo.list_print_jobs(tenant_id, status, offset, limit).await
    }

    pub async fn buscar_job(&self, tenant_id: Uuid, job_id: Uuid) -> Result<PrintJob, AppError> {
        self.lote_repo
            .find_print_job(tenant_id, job_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Job não encontrado".to_string()))
    }

    /// pending -> printing. O UPDATE condiciona no status: de dois `iniciar`
    /// simultâneos no mesmo job, só um encontra um job ainda pendente.
    pub async fn iniciar_job(&self, tenant_id: Uuid, job_id: Uuid) -> Result<PrintJob, AppError> {
        let job = self.buscar_job(tenant_id, job_id).await?;
        if !transicao_de_job_valida(job.status, StatusPrintJob::Printing) {
            return Err(AppError::InvalidState(format!(
                "Job não está pendente (status atual: {:?})",
                job.status
            )));
        }
        let mut tx = self.pool.begin().await?;
        let job = self
            .lote_repo
            .mark_job_printing(&mut *tx, tenant_id, job_id)
            .await?
            .ok_or_else(|| {
                AppError::InvalidState("Job não está mais pendente".to_string())
            })?;
        tx.commit().await?;
        Ok(job)
    }

    /// printing -> completed; marca a etiqueta do lote como impressa.
    pub async fn concluir_job(&self, tenant_id: Uuid, job_id: Uuid) -> Result<PrintJob, AppError> {
        let job = self.buscar_job(tenant_id, job_id).await?;
        if !transicao_de_job_valida(job.status, StatusPrintJob::Completed) {
            return Err(AppError::InvalidState(format!(
                "Job não está em impressão (status atual: {:?})",
                job.status
            )));
        }
        let mut tx = self.pool.begin().await?;
        let job = self
            .lote_repo
            .mark_job_completed(&mut *tx, tenant_id, job_id)
            .await?
            .ok_or_else(|| {
                AppError::InvalidState("Job não está mais em impressão".to_string())
            })?;
        self.lote_repo.marcar_etiqueta_impressa(&mut *tx, job.lote_id).await?;
        tx.commit().await?;
        Ok(job)
    }

    /// printing -> failed (ou de volta a pending enquanto restarem tentativas).
    pub async fn falhar_job(
        &self,
        tenant_id: Uuid,
        job_id: Uuid,
        erro_mensagem: &str,
    ) -> Result<PrintJob, AppError> {
        let job = self.buscar_job(tenant_id, job_id).await?;
        if !transicao_de_job_valida(job.status, StatusPrintJob::Failed) {
            return Err(AppError::InvalidState(format!(
                "Job não está em impressão (status atual: {:?})",
                job.status
            )));
        }
        let mut tx = self.pool.begin().await?;
        let job = self
            .lote_repo
            .mark_job_failed(&mut *tx, tenant_id, job_id, erro_mensagem)
            .await?
            .ok_or_else(|| {
                AppError::InvalidState("Job não está mais em impressão".to_string())
            })?;
        tx.commit().await?;
        Ok(job)
    }
}

/// Congela os dados da etiqueta no formato de impressão (datas dd/mm/aaaa).
pub fn montar_etiqueta(
    tenant_nome: &str,
    tenant_email: &str,
    tenant_telefone: Option<&str>,
    produto_nome: &str,
    lote: &ProdutoLote,
) -> EtiquetaData {
    EtiquetaData {
        tenant_nome: tenant_nome.to_string(),
        tenant_email: tenant_email.to_string(),
        tenant_telefone: tenant_telefone.map(|t| t.to_string()),
        produto_nome: produto_nome.to_string(),
        fabricante: lote.fabricante.clone().unwrap_or_default(),
        sif: lote.sif.clone().unwrap_or_default(),
        lote_numero: lote.lote_numero.clone(),
        qr_code: lote.qr_code.clone(),
        data_fabricacao: lote.data_fabricacao.format("%d/%m/%Y").to_string(),
        data_validade: lote.data_validade.format("%d/%m/%Y").to_string(),
        peso_liquido: lote.peso_liquido.clone().unwrap_or_default(),
        ingredientes: lote.ingredientes.clone().unwrap_or_default(),
        modo_conservacao: lote.modo_conservacao.clone().unwrap_or_default(),
        responsavel_tecnico: lote.responsavel_tecnico.clone().unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn lote_numero_carrega_prefixos_e_data() {
        let tenant_id = Uuid::parse_str("8c1abbbb-0000-0000-0000-000000000000").unwrap();
        let alimento_id = Uuid::parse_str("d3f2aaaa-0000-0000-0000-000000000000").unwrap();
        let data = Utc.with_ymd_and_hms(2025, 8, 30, 12, 0, 0).unwrap();
        let numero = gerar_lote_numero(tenant_id, alimento_id, data, "7a1c");
        assert_eq!(numero, "8C1A-D3F2-20250830-7A1C");
    }

    #[test]
    fn classificacao_de_validade_usa_janela_de_aviso() {
        let agora = Utc.with_ymd_and_hms(2025, 8, 30, 12, 0, 0).unwrap();
        let em_dias = |d: i64| agora + Duration::days(d);
        assert_eq!(classificar_validade(em_dias(10), agora), StatusValidade::Valido);
        assert_eq!(classificar_validade(em_dias(4), agora), StatusValidade::Valido);
        assert_eq!(classificar_validade(em_dias(3), agora), StatusValidade::Vencendo);
        assert_eq!(classificar_validade(agora + Duration::hours(6), agora), StatusValidade::Vencendo);
        assert_eq!(classificar_validade(em_dias(-1), agora), StatusValidade::Vencido);
    }

    // Venceu há poucas horas: menos de um dia inteiro, mas já é vencido.
    #[test]
    fn vencido_ha_poucas_horas_ja_classifica_como_vencido() {
        let agora = Utc.with_ymd_and_hms(2025, 8, 30, 12, 0, 0).unwrap();
        let validade = agora - Duration::hours(6);
        assert_eq!(dias_para_vencer(validade, agora), 0);
        assert_eq!(classificar_validade(validade, agora), StatusValidade::Vencido);
    }

    #[test]
    fn mensagem_de_vencido_vem_com_aviso_em_destaque() {
        let msg = mensagem_validacao(true, StatusValidade::Vencido, -3, dec!(5));
        assert!(msg.contains("VENCIDO"));
        assert!(msg.contains("3 dia"));
    }

    #[test]
    fn mensagem_de_vencido_no_mesmo_dia_avisa_hoje() {
        let msg = mensagem_validacao(true, StatusValidade::Vencido, 0, dec!(5));
        assert_eq!(msg, "ATENÇÃO: lote VENCIDO hoje");
    }

    // Token desconhecido é resposta de negócio, não erro HTTP.
    #[test]
    fn resposta_de_qr_desconhecido_nega_sem_expor_detalhes() {
        let resposta = ValidacaoLoteResponse::invalida("QR Code inválido ou não encontrado");
        assert!(!resposta.valido);
        assert_eq!(resposta.mensagem, "QR Code inválido ou não encontrado");
        assert!(resposta.lote.is_none());
        assert!(resposta.status.is_none());
        let json = serde_json::to_value(&resposta).unwrap();
        assert!(json.get("lote").is_none());
        assert!(json.get("vencido").is_none());
    }

    #[test]
    fn transicoes_de_job_seguem_o_ciclo_pending_printing_final() {
        use StatusPrintJob::*;
        assert!(transicao_de_job_valida(Pending, Printing));
        assert!(transicao_de_job_valida(Printing, Completed));
        assert!(transicao_de_job_valida(Printing, Failed));
        // Reivindicar duas vezes, concluir sem imprimir, reviver job final
        assert!(!transicao_de_job_valida(Printing, Printing));
        assert!(!transicao_de_job_valida(Pending, Completed));
        assert!(!transicao_de_job_valida(Pending, Failed));
        assert!(!transicao_de_job_valida(Completed, Printing));
        assert!(!transicao_de_job_valida(Failed, Printing));
    }

    #[test]
    fn mensagem_de_lote_indisponivel_nao_expoe_saldo() {
        let msg = mensagem_validacao(false, StatusValidade::Valido, 10, dec!(5));
        assert_eq!(msg, "Lote indisponível para consumo");
    }

    #[test]
    fn qr_token_tem_prefixo_e_uuid() {
        let token = gerar_qr_token();
        assert!(token.starts_with("LOT-"));
        assert!(Uuid::parse_str(&token[4..]).is_ok());
    }

    #[test]
    fn tokens_consecutivos_nao_repetem() {
        assert_ne!(gerar_qr_token(), gerar_qr_token());
        assert_ne!(gerar_sufixo(), gerar_sufixo());
    }

    #[test]
    fn dias_para_vencer_classifica_vencido_e_valido() {
        let agora = Utc.with_ymd_and_hms(2025, 8, 30, 12, 0, 0).unwrap();
        assert_eq!(dias_para_vencer(agora + Duration::days(10), agora), 10);
        assert_eq!(dias_para_vencer(agora - Duration::days(3), agora), -3);
        // Mesmo dia, algumas horas à frente: ainda não venceu
        assert_eq!(dias_para_vencer(agora + Duration::hours(6), agora), 0);
    }

    #[test]
    fn consumo_parcial_mantem_lote_aberto() {
        let (saldo, esgotado) = consumir_do_lote(dec!(100), dec!(30)).unwrap();
        assert_eq!(saldo, dec!(70));
        assert!(!esgotado);
    }

    #[test]
    fn consumo_do_saldo_exato_esgota_o_lote() {
        let (saldo, esgotado) = consumir_do_lote(dec!(70), dec!(70)).unwrap();
        assert_eq!(saldo, Decimal::ZERO);
        assert!(esgotado);
    }

    #[test]
    fn consumo_acima_do_saldo_e_rejeitado() {
        let resultado = consumir_do_lote(dec!(70), dec!(70.001));
        assert!(matches!(resultado, Err(AppError::InvalidState(_))));
    }

    // Cenário completo: produção de 100, consumo de 30, consumo de 70,
    // terceira tentativa rejeitada.
    #[test]
    fn sequencia_de_consumos_ate_esgotar() {
        let (saldo, esgotado) = consumir_do_lote(dec!(100), dec!(30)).unwrap();
        assert!(!esgotado);
        let (saldo, esgotado) = consumir_do_lote(saldo, dec!(70)).unwrap();
        assert_eq!(saldo, Decimal::ZERO);
        assert!(esgotado);
        assert!(consumir_do_lote(saldo, dec!(1)).is_err());
    }

    #[test]
    fn etiqueta_formata_datas_em_dd_mm_aaaa() {
        let lote = ProdutoLote {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            alimento_id: Uuid::new_v4(),
            lote_numero: "L20250830-D3F2-7A1C".to_string(),
            qr_code: "LOT-teste".to_string(),
            data_fabricacao: Utc.with_ymd_and_hms(2025, 8, 30, 10, 0, 0).unwrap(),
            data_validade: Utc.with_ymd_and_hms(2025, 9, 6, 10, 0, 0).unwrap(),
            quantidade_produzida: dec!(100),
            quantidade_disponivel: dec!(100),
            unidade_medida: Some("kg".to_string()),
            quantidade_etiquetas: 1,
            fabricante: Some("Cozinha Central".to_string()),
            sif: None,
            peso_liquido: None,
            ingredientes: None,
            modo_conservacao: Some("Congelado".to_string()),
            responsavel_tecnico: None,
            observacoes: None,
            ativo: true,
            usado_completamente: false,
            etiqueta_impressa: false,
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let etiqueta = montar_etiqueta("Unidade Centro", "centro@rest.com", None, "Feijoada", &lote);
        assert_eq!(etiqueta.data_fabricacao, "30/08/2025");
        assert_eq!(etiqueta.data_validade, "06/09/2025");
        assert_eq!(etiqueta.produto_nome, "Feijoada");
        assert_eq!(etiqueta.qr_code, "LOT-teste");
        // Campos ausentes viram string vazia, nunca "null" na etiqueta
        assert_eq!(etiqueta.sif, "");
    }
}
