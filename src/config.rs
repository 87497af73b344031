// src/config.rs

use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, time::Duration};
use tokio::sync::watch;

use crate::{
    db::{
        AuditRepository, InventoryRepository, LoteRepository, TenancyRepository, UserRepository,
    },
    services::{
        access::AccessService,
        audit::AuditService,
        auth::AuthService,
        etiqueta_service::EtiquetaService,
        history_cleanup::{CleanupOutcome, HistoryCleanup},
        inventory_service::InventoryService,
        lote_service::LoteService,
        rate_limit::LoginRateLimiter,
    },
};

// Valor que aparece em .env.example; subir com ele em produção é acidente
const JWT_SECRET_PLACEHOLDER: &str = "troque-este-segredo";

#[derive(Clone)]
pub struct Settings {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration_minutes: i64,
    pub cookie_secure: bool,
    pub host: String,
    pub port: u16,
    pub retention_days: i64,
    pub cleanup_interval_hours: u64,
    pub rate_limit_login_per_minute: usize,
    pub fonts_dir: String,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").map_err(|_| anyhow::anyhow!("DATABASE_URL deve ser definida"))?;
        let jwt_secret =
            env::var("JWT_SECRET").map_err(|_| anyhow::anyhow!("JWT_SECRET deve ser definido"))?;
        // Recusa o segredo de exemplo: melhor não subir do que subir aberto
        if jwt_secret == JWT_SECRET_PLACEHOLDER || jwt_secret.len() < 16 {
            anyhow::bail!("JWT_SECRET fraco ou igual ao exemplo; defina um segredo real");
        }

        Ok(Self {
            database_url,
            jwt_secret,
            jwt_expiration_minutes: env_ou("ACCESS_TOKEN_EXPIRE_MINUTES", 480)?,
            cookie_secure: env_ou("COOKIE_SECURE", false)?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_ou("PORT", 3000)?,
            retention_days: env_ou("RETENTION_DAYS", 90)?,
            cleanup_interval_hours: env_ou("CLEANUP_INTERVAL_HOURS", 24)?,
            rate_limit_login_per_minute: env_ou("RATE_LIMIT_LOGIN_PER_MINUTE", 20)?,
            fonts_dir: env::var("FONTS_DIR").unwrap_or_else(|_| "./fonts".to_string()),
        })
    }
}

fn env_ou<T: std::str::FromStr>(nome: &str, padrao: T) -> anyhow::Result<T> {
    match env::var(nome) {
        Ok(valor) => valor
            .parse()
            .map_err(|_| anyhow::anyhow!("{nome} inválido: '{valor}'")),
        Err(_) => Ok(padrao),
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub settings: Settings,
    pub auth_service: AuthService,
    pub access_service: AccessService,
    pub inventory_service: InventoryService,
    pub lote_service: LoteService,
    pub etiqueta_service: EtiquetaService,
    pub audit_service: AuditService,
    pub user_repo: UserRepository,
    pub tenancy_repo: TenancyRepository,
    pub inventory_repo: InventoryRepository,
    pub login_rate_limiter: LoginRateLimiter,
    // Resultado da última varredura de retenção, exposto no /api/health
    pub cleanup_outcome: watch::Receiver<Option<CleanupOutcome>>,
}

impl AppState {
    /// Conecta ao banco e monta o gráfico de dependências. Devolve também a
    /// task de limpeza para o main decidir quando (e se) rodá-la.
    pub async fn new(settings: Settings) -> anyhow::Result<(Self, HistoryCleanup)> {
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&settings.database_url)
            .await?;

        tracing::info!("Conexão com o banco de dados estabelecida");

        // --- Monta o gráfico de dependências ---
        let user_repo = UserRepository::new(db_pool.clone());
        let tenancy_repo = TenancyRepository::new(db_pool.clone());
        let inventory_repo = InventoryRepository::new(db_pool.clone());
        let lote_repo = LoteRepository::new(db_pool.clone());
        let audit_repo = AuditRepository::new(db_pool.clone());

        let access_service = AccessService::new(tenancy_repo.clone());
        let auth_service = AuthService::new(
            user_repo.clone(),
            access_service.clone(),
            audit_repo.clone(),
            settings.jwt_secret.clone(),
            settings.jwt_expiration_minutes,
        );
        let inventory_service = InventoryService::new(
            db_pool.clone(),
            inventory_repo.clone(),
            audit_repo.clone(),
        );
        let lote_service = LoteService::new(
            db_pool.clone(),
            lote_repo,
            inventory_repo.clone(),
            tenancy_repo.clone(),
            audit_repo.clone(),
        );
        let etiqueta_service = EtiquetaService::new(settings.fonts_dir.clone());
        let audit_service = AuditService::new(audit_repo);
        let login_rate_limiter = LoginRateLimiter::new(settings.rate_limit_login_per_minute);

        let (cleanup, cleanup_outcome) = HistoryCleanup::new(
            inventory_repo.clone(),
            settings.retention_days,
            Duration::from_secs(settings.cleanup_interval_hours * 3600),
        );

        Ok((
            Self {
                db_pool,
                settings,
                auth_service,
                access_service,
                inventory_service,
                lote_service,
                etiqueta_service,
                audit_service,
                user_repo,
                tenancy_repo,
                inventory_repo,
                login_rate_limiter,
                cleanup_outcome,
            },
            cleanup,
        ))
    }
}
