//src/main.rs

use axum::{
    extract::State,
    middleware as axum_middleware,
    routing::{get, patch, post, put},
    Json, Router,
};
use serde_json::json;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

// Declaração dos nossos módulos
mod common;
mod config;
mod db;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::{AppState, Settings};
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() {
    // Logger controlado por RUST_LOG (padrão: info)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_target(false)
        .compact()
        .init();

    // .expect() é bom aqui: se a configuração falhar, a aplicação não deve iniciar.
    let settings = Settings::from_env().expect("Configuração inválida");
    let (app_state, cleanup) = AppState::new(settings)
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    // Roda as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");
    tracing::info!("Migrações do banco de dados executadas");

    // Task de fundo: varredura de retenção do livro de movimentações
    let shutdown = CancellationToken::new();
    let cleanup_handle = tokio::spawn(cleanup.run(shutdown.clone()));

    // Rotas públicas de autenticação
    let auth_public = Router::new().route("/login", post(handlers::auth::login));

    // Rotas de sessão (protegidas)
    let auth_protected = Router::new()
        .route("/me", get(handlers::auth::me))
        .route("/refresh", post(handlers::auth::refresh))
        .route("/logout", post(handlers::auth::logout))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Painel administrativo do SaaS (o extrator SaasAdmin exige is_admin)
    let admin_routes = Router::new()
        .route(
            "/clientes",
            get(handlers::admin_clientes::listar).post(handlers::admin_clientes::criar),
        )
        .route(
            "/clientes/{cliente_id}",
            get(handlers::admin_clientes::buscar).delete(handlers::admin_clientes::remover),
        )
        .route(
            "/clientes/{cliente_id}/ativo",
            patch(handlers::admin_clientes::definir_ativo),
        )
        .route(
            "/tenants",
            get(handlers::admin_tenants::listar).post(handlers::admin_tenants::criar),
        )
        .route(
            "/tenants/{tenant_id}",
            get(handlers::admin_tenants::buscar).delete(handlers::admin_tenants::remover),
        )
        .route(
            "/tenants/{tenant_id}/ativo",
            patch(handlers::admin_tenants::definir_ativo),
        )
        .route(
            "/usuarios",
            get(handlers::admin_usuarios::listar).post(handlers::admin_usuarios::criar),
        )
        .route(
            "/usuarios/{user_id}",
            patch(handlers::admin_usuarios::atualizar).delete(handlers::admin_usuarios::remover),
        )
        .route(
            "/usuarios/{user_id}/tenants/{tenant_id}",
            put(handlers::admin_usuarios::conceder_acesso)
                .delete(handlers::admin_usuarios::revogar_acesso),
        )
        .route("/audit", get(handlers::admin_audit::listar))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Rotas no escopo de um restaurante: o TenantContext valida o {tenant_id}
    // da URL contra o token em cada handler
    let tenant_routes = Router::new()
        .route(
            "/alimentos",
            get(handlers::tenant_alimentos::listar).post(handlers::tenant_alimentos::criar),
        )
        .route(
            "/alimentos/estoque-baixo",
            get(handlers::tenant_alimentos::estoque_baixo),
        )
        .route(
            "/alimentos/{alimento_id}",
            get(handlers::tenant_alimentos::buscar)
                .patch(handlers::tenant_alimentos::atualizar)
                .delete(handlers::tenant_alimentos::remover),
        )
        .route(
            "/movimentacoes",
            get(handlers::tenant_alimentos::listar_movimentacoes)
                .post(handlers::tenant_alimentos::criar_movimentacao),
        )
        .route(
            "/lotes",
            get(handlers::tenant_lotes::listar).post(handlers::tenant_lotes::criar),
        )
        .route("/lotes/vencendo", get(handlers::tenant_lotes::vencendo))
        .route("/lotes/alertas", get(handlers::tenant_lotes::alertas))
        .route("/lotes/{lote_id}", get(handlers::tenant_lotes::buscar))
        .route(
            "/lotes/{lote_id}/reimprimir",
            post(handlers::tenant_lotes::reimprimir),
        )
        .route(
            "/lotes/{lote_id}/etiqueta",
            get(handlers::tenant_lotes::etiqueta_pdf),
        )
        .route(
            "/usuarios",
            get(handlers::tenant_usuarios::listar).post(handlers::tenant_usuarios::criar),
        )
        .route(
            "/usuarios/{user_id}",
            patch(handlers::tenant_usuarios::atualizar)
                .delete(handlers::tenant_usuarios::remover),
        )
        .route("/qrcode/validar", post(handlers::qrcode::validar))
        .route("/qrcode/usar", post(handlers::qrcode::usar))
        .route("/print-jobs", get(handlers::print_jobs::listar))
        .route("/print-jobs/pendentes", get(handlers::print_jobs::pendentes))
        .route("/print-jobs/{job_id}", get(handlers::print_jobs::buscar))
        .route("/print-jobs/{job_id}/pdf", get(handlers::print_jobs::pdf))
        .route(
            "/print-jobs/{job_id}/iniciar",
            post(handlers::print_jobs::iniciar),
        )
        .route(
            "/print-jobs/{job_id}/concluir",
            post(handlers::print_jobs::concluir),
        )
        .route(
            "/print-jobs/{job_id}/falhar",
            post(handlers::print_jobs::falhar),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal
    let addr = format!("{}:{}", app_state.settings.host, app_state.settings.port);
    let app = Router::new()
        .route("/api/health", get(health))
        .nest("/api/auth", auth_public.merge(auth_protected))
        .nest("/api/admin", admin_routes)
        .nest("/api/tenant/{tenant_id}", tenant_routes)
        .with_state(app_state);

    // Inicia o servidor
    let listener = TcpListener::bind(&addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("Servidor escutando em {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(aguardar_ctrl_c())
    .await
    .expect("Erro no servidor Axum");

    // Parada limpa da task de retenção
    shutdown.cancel();
    let _ = cleanup_handle.await;
}

/// GET /api/health — vivacidade + resultado da última varredura de retenção
async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let ultima_limpeza = state.cleanup_outcome.borrow().clone();
    Json(json!({
        "status": "ok",
        "ultimaLimpeza": ultima_limpeza,
    }))
}

async fn aguardar_ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Falha ao instalar handler de Ctrl+C: {e}");
    }
}
