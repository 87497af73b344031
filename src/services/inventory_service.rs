// src/services/inventory_service.rs
//
// Motor do livro de movimentações. Toda mudança no contador de estoque de um
// alimento passa por `registrar_movimentacao`: lê com lock, aplica a regra do
// tipo, grava o contador e o registro do livro na MESMA transação.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::{AuditRepository, InventoryRepository},
    models::{
        audit::RequestInfo,
        inventory::{Alimento, MovimentacaoDetalhada, MovimentacaoEstoque, TipoMovimentacao},
    },
};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NovaMovimentacaoPayload {
    pub alimento_id: Uuid,
    pub tipo: TipoMovimentacao,
    pub quantidade: Decimal,
    #[validate(length(max = 500, message = "O motivo deve ter no máximo 500 caracteres."))]
    pub motivo: Option<String>,
}

#[derive(Clone)]
pub struct InventoryService {
    pool: PgPool,
    inventory_repo: InventoryRepository,
    audit_repo: AuditRepository,
}

/// Aplica uma movimentação sobre o saldo atual e devolve o novo saldo.
///
/// entrada soma, saída/uso subtraem (sem deixar negativo), ajuste substitui.
/// Quantidade negativa nunca é aceita; saída maior que o saldo também não.
pub fn aplicar_movimentacao(
    atual: Decimal,
    tipo: TipoMovimentacao,
    quantidade: Decimal,
) -> Result<Decimal, AppError> {
    if quantidade < Decimal::ZERO {
        return Err(AppError::InvalidState(
            "Quantidade não pode ser negativa".to_string(),
        ));
    }
    match tipo {
        TipoMovimentacao::Entrada => Ok(atual + quantidade),
        TipoMovimentacao::Saida | TipoMovimentacao::Uso => {
            if quantidade > atual {
                return Err(AppError::InvalidState(format!(
                    "Estoque insuficiente: disponível {atual}, solicitado {quantidade}"
                )));
            }
            Ok(atual - quantidade)
        }
        // Ajuste de inventário: o valor informado É o novo saldo
        TipoMovimentacao::Ajuste => Ok(quantidade),
    }
}

impl InventoryService {
    pub fn new(
        pool: PgPool,
        inventory_repo: InventoryRepository,
        audit_repo: AuditRepository,
    ) -> Self {
        Self {
            pool,
            inventory_repo,
            audit_repo,
        }
    }

    /// Registra uma movimentação manual (entrada, saída ou ajuste).
    /// O tipo `uso` só nasce do fluxo de QR Code, nunca deste endpoint.
    pub async fn registrar_movimentacao(
        &self,
        tenant_id: Uuid,
        usuario_id: Uuid,
        payload: &NovaMovimentacaoPayload,
        info: &RequestInfo,
    ) -> Result<MovimentacaoEstoque, AppError> {
        payload.validate()?;
        if payload.tipo == TipoMovimentacao::Uso {
            return Err(AppError::InvalidState(
                "Movimentação do tipo 'uso' só é gerada pelo consumo de QR Code".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let alimento = self
            .inventory_repo
            .find_alimento_for_update(&mut *tx, tenant_id, payload.alimento_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Alimento não encontrado".to_string()))?;

        let anterior = alimento.quantidade_estoque;
        let nova = aplicar_movimentacao(anterior, payload.tipo, payload.quantidade)?;

        self.inventory_repo
            .set_quantidade_estoque(&mut *tx, tenant_id, alimento.id, nova)
            .await?;

        let movimentacao = self
            .inventory_repo
            .record_movimentacao(
                &mut *tx,
                tenant_id,
                alimento.id,
                None,
                usuario_id,
                payload.tipo,
                payload.quantidade,
                anterior,
                nova,
                payload.motivo.as_deref(),
                None,
            )
            .await?;

        self.audit_repo
            .insert(
                &mut *tx,
                Some(usuario_id),
                Some(tenant_id),
                "movimentacao_estoque",
                "movimentacoes_estoque",
                Some(movimentacao.id),
                Some(&format!(
                    "tipo={:?} alimento={} quantidade={}",
                    payload.tipo, alimento.nome, payload.quantidade
                )),
                info.ip.as_deref(),
                info.user_agent.as_deref(),
            )
            .await?;

        tx.commit().await?;
        Ok(movimentacao)
    }

    pub async fn listar_movimentacoes(
        &self,
        tenant_id: Uuid,
        tipo: Option<TipoMovimentacao>,
        data_inicio: Option<DateTime<Utc>>,
        data_fim: Option<DateTime<Utc>>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<MovimentacaoDetalhada>, AppError> {
        self.inventory_repo
            .list_movimentacoes(tenant_id, tipo, data_inicio, data_fim, offset, limit)
            .await
    }

    /// Alimentos ativos com estoque abaixo do mínimo cadastrado.
    pub async fn alimentos_abaixo_do_minimo(
        &self,
        tenant_id: Uuid,
    ) -> Result<Vec<Alimento>, AppError> {
        let alimentos = self.inventory_repo.list_alimentos(tenant_id, true).await?;
        Ok(alimentos
            .into_iter()
            .filter(|a| a.quantidade_estoque < a.quantidade_minima)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn entrada_soma_ao_saldo() {
        let novo = aplicar_movimentacao(dec!(10.5), TipoMovimentacao::Entrada, dec!(2.25));
        assert_eq!(novo.unwrap(), dec!(12.75));
    }

    #[test]
    fn saida_subtrai_do_saldo() {
        let novo = aplicar_movimentacao(dec!(10), TipoMovimentacao::Saida, dec!(4));
        assert_eq!(novo.unwrap(), dec!(6));
    }

    #[test]
    fn saida_maior_que_o_saldo_e_rejeitada() {
        let resultado = aplicar_movimentacao(dec!(3), TipoMovimentacao::Saida, dec!(5));
        assert!(matches!(resultado, Err(AppError::InvalidState(_))));
    }

    #[test]
    fn saida_do_saldo_exato_zera_sem_erro() {
        let novo = aplicar_movimentacao(dec!(5), TipoMovimentacao::Saida, dec!(5));
        assert_eq!(novo.unwrap(), Decimal::ZERO);
    }

    #[test]
    fn ajuste_substitui_o_saldo() {
        let novo = aplicar_movimentacao(dec!(99), TipoMovimentacao::Ajuste, dec!(12.345));
        assert_eq!(novo.unwrap(), dec!(12.345));
    }

    #[test]
    fn quantidade_negativa_e_rejeitada_em_qualquer_tipo() {
        for tipo in [
            TipoMovimentacao::Entrada,
            TipoMovimentacao::Saida,
            TipoMovimentacao::Ajuste,
            TipoMovimentacao::Uso,
        ] {
            let resultado = aplicar_movimentacao(dec!(10), tipo, dec!(-1));
            assert!(matches!(resultado, Err(AppError::InvalidState(_))));
        }
    }

    #[test]
    fn uso_se_comporta_como_saida() {
        let novo = aplicar_movimentacao(dec!(8), TipoMovimentacao::Uso, dec!(3));
        assert_eq!(novo.unwrap(), dec!(5));
        assert!(aplicar_movimentacao(dec!(2), TipoMovimentacao::Uso, dec!(3)).is_err());
    }
}
