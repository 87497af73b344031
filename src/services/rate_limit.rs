// src/services/rate_limit.rs
//
// Limitador de tentativas de login por IP (janela deslizante em memória).
// Uma instância só do backend por enquanto; se um dia houver réplicas, isto
// vira um contador compartilhado.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use crate::common::error::AppError;

#[derive(Clone)]
pub struct LoginRateLimiter {
    inner: Arc<Mutex<HashMap<String, Vec<Instant>>>>,
    janela: Duration,
    max_tentativas: usize,
}

/// Núcleo da janela deslizante: descarta o que saiu da janela e decide se a
/// nova tentativa cabe. Quando cabe, já a registra.
pub fn avaliar_janela(
    tentativas: &mut Vec<Instant>,
    agora: Instant,
    janela: Duration,
    max_tentativas: usize,
) -> bool {
    tentativas.retain(|t| agora.duration_since(*t) < janela);
    if tentativas.len() >= max_tentativas {
        return false;
    }
    tentativas.push(agora);
    true
}

impl LoginRateLimiter {
    pub fn new(max_tentativas_por_minuto: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            janela: Duration::from_secs(60),
            max_tentativas: max_tentativas_por_minuto,
        }
    }

    /// Registra a tentativa e nega com 429 quando o IP estourou a janela.
    pub fn verificar(&self, ip: &str) -> Result<(), AppError> {
        let agora = Instant::now();
        let mut mapa = self
            .inner
            .lock()
            .map_err(|_| AppError::InternalServerError(anyhow::anyhow!("Lock envenenado")))?;

        // Limpeza oportunista: IPs sem tentativa recente saem do mapa
        mapa.retain(|_, ts| ts.iter().any(|t| agora.duration_since(*t) < self.janela));

        let tentativas = mapa.entry(ip.to_string()).or_default();
        if avaliar_janela(tentativas, agora, self.janela, self.max_tentativas) {
            Ok(())
        } else {
            tracing::warn!(ip, "Limite de tentativas de login excedido");
            Err(AppError::RateLimited)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tentativas_dentro_do_limite_passam() {
        let mut tentativas = Vec::new();
        let agora = Instant::now();
        for _ in 0..5 {
            assert!(avaliar_janela(&mut tentativas, agora, Duration::from_secs(60), 5));
        }
    }

    #[test]
    fn tentativa_acima_do_limite_e_negada() {
        let mut tentativas = Vec::new();
        let agora = Instant::now();
        for _ in 0..3 {
            avaliar_janela(&mut tentativas, agora, Duration::from_secs(60), 3);
        }
        assert!(!avaliar_janela(&mut tentativas, agora, Duration::from_secs(60), 3));
    }

    #[test]
    fn janela_desliza_e_libera_tentativas_antigas() {
        let janela = Duration::from_secs(60);
        let inicio = Instant::now();
        let mut tentativas = Vec::new();
        for _ in 0..3 {
            avaliar_janela(&mut tentativas, inicio, janela, 3);
        }
        // Cheio agora...
        assert!(!avaliar_janela(&mut tentativas, inicio, janela, 3));
        // ...mas 61 segundos depois a janela andou
        let depois = inicio + Duration::from_secs(61);
        assert!(avaliar_janela(&mut tentativas, depois, janela, 3));
    }

    #[test]
    fn ips_diferentes_tem_janelas_independentes() {
        let limiter = LoginRateLimiter::new(2);
        assert!(limiter.verificar("10.0.0.1").is_ok());
        assert!(limiter.verificar("10.0.0.1").is_ok());
        assert!(limiter.verificar("10.0.0.1").is_err());
        assert!(limiter.verificar("10.0.0.2").is_ok());
    }
}
