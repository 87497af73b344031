// src/services/history_cleanup.rs
//
// Varredura periódica de retenção: apaga do livro de movimentações tudo que
// passou da janela configurada. Roda como task de fundo com parada limpa via
// CancellationToken; o resultado da última rodada fica num canal `watch` que
// o /api/health expõe.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Serialize;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::db::InventoryRepository;

// Backoff exponencial entre falhas consecutivas
const BACKOFF_BASE_SEGUNDOS: u64 = 30;
const BACKOFF_TETO_SEGUNDOS: u64 = 3600;

// A partir daqui a falha vira `error!` em vez de `warn!`
const FALHAS_PARA_ESCALAR: u32 = 5;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupOutcome {
    pub rodou_em: DateTime<Utc>,
    pub sucesso: bool,
    pub removidos: u64,
    pub erro: Option<String>,
}

pub struct HistoryCleanup {
    inventory_repo: InventoryRepository,
    retention_days: i64,
    intervalo: Duration,
    outcome_tx: watch::Sender<Option<CleanupOutcome>>,
}

/// Corte da retenção: tudo anterior a este instante é removido.
pub fn calcular_corte(agora: DateTime<Utc>, retention_days: i64) -> DateTime<Utc> {
    agora - ChronoDuration::days(retention_days)
}

/// Espera após a N-ésima falha consecutiva: 30s, 60s, 120s... até o teto de 1h.
pub fn backoff_apos_falhas(falhas_consecutivas: u32) -> Duration {
    let expoente = falhas_consecutivas.saturating_sub(1).min(63);
    let segundos = BACKOFF_BASE_SEGUNDOS
        .saturating_mul(1u64 << expoente)
        .min(BACKOFF_TETO_SEGUNDOS);
    Duration::from_secs(segundos)
}

impl HistoryCleanup {
    pub fn new(
        inventory_repo: InventoryRepository,
        retention_days: i64,
        intervalo: Duration,
    ) -> (Self, watch::Receiver<Option<CleanupOutcome>>) {
        let (outcome_tx, outcome_rx) = watch::channel(None);
        (
            Self {
                inventory_repo,
                retention_days,
                intervalo,
                outcome_tx,
            },
            outcome_rx,
        )
    }

    /// Loop da task de fundo. Retorna quando o token for cancelado.
    pub async fn run(self, shutdown: CancellationToken) {
        tracing::info!(
            retention_days = self.retention_days,
            intervalo_s = self.intervalo.as_secs(),
            "Varredura de retenção iniciada"
        );

        let mut falhas_consecutivas: u32 = 0;

        loop {
            let espera = if falhas_consecutivas > 0 {
                backoff_apos_falhas(falhas_consecutivas)
            } else {
                self.intervalo
            };

            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Varredura de retenção encerrada");
                    return;
                }
                _ = tokio::time::sleep(espera) => {}
            }

            match self.executar_rodada().await {
                Ok(removidos) => {
                    falhas_consecutivas = 0;
                    tracing::info!(removidos, "Varredura de retenção concluída");
                    let _ = self.outcome_tx.send(Some(CleanupOutcome {
                        rodou_em: Utc::now(),
                        sucesso: true,
                        removidos,
                        erro: None,
                    }));
                }
                Err(e) => {
                    falhas_consecutivas += 1;
                    if falhas_consecutivas >= FALHAS_PARA_ESCALAR {
                        tracing::error!(
                            falhas_consecutivas,
                            "Varredura de retenção falhando repetidamente: {e}"
                        );
                    } else {
                        tracing::warn!(falhas_consecutivas, "Varredura de retenção falhou: {e}");
                    }
                    let _ = self.outcome_tx.send(Some(CleanupOutcome {
                        rodou_em: Utc::now(),
                        sucesso: false,
                        removidos: 0,
                        erro: Some(e.to_string()),
                    }));
                }
            }
        }
    }

    async fn executar_rodada(&self) -> Result<u64, crate::common::error::AppError> {
        let corte = calcular_corte(Utc::now(), self.retention_days);
        self.inventory_repo.delete_movimentacoes_before(corte).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn corte_recua_exatamente_a_janela_de_retencao() {
        let agora = Utc.with_ymd_and_hms(2025, 8, 30, 12, 0, 0).unwrap();
        let corte = calcular_corte(agora, 90);
        assert_eq!(corte, Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn backoff_dobra_a_cada_falha_ate_o_teto() {
        assert_eq!(backoff_apos_falhas(1), Duration::from_secs(30));
        assert_eq!(backoff_apos_falhas(2), Duration::from_secs(60));
        assert_eq!(backoff_apos_falhas(3), Duration::from_secs(120));
        assert_eq!(backoff_apos_falhas(10), Duration::from_secs(3600));
        // Contagens absurdas não estouram o u64
        assert_eq!(backoff_apos_falhas(u32::MAX), Duration::from_secs(3600));
    }
}
