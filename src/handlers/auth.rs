// src/handlers/auth.rs

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::AppendHeaders,
    Json,
};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::{
        audit::RequestInfo,
        auth::{AuthResponse, LoginPayload, RestauranteResumo, UserResumo},
    },
};

/// POST /api/auth/login
/// Além do corpo com o Bearer token, emite o cookie HttpOnly para clientes
/// de navegador.
pub async fn login(
    State(state): State<AppState>,
    info: RequestInfo,
    Json(payload): Json<LoginPayload>,
) -> Result<(AppendHeaders<[(header::HeaderName, String); 1]>, Json<AuthResponse>), AppError> {
    payload.validate()?;

    // Janela por IP antes de qualquer consulta ao banco
    let ip = info.ip.as_deref().unwrap_or("desconhecido");
    state.login_rate_limiter.verificar(ip)?;

    let resposta = state
        .auth_service
        .login(&payload, info.ip.as_deref(), info.user_agent.as_deref())
        .await?;

    let cookie = cookie_de_sessao(
        &resposta.access_token,
        state.settings.jwt_expiration_minutes * 60,
        state.settings.cookie_secure,
    );
    Ok((AppendHeaders([(header::SET_COOKIE, cookie)]), Json(resposta)))
}

/// GET /api/auth/me — perfil com TODOS os restaurantes, inclusive bloqueados
pub async fn me(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<UserResumo>, AppError> {
    let restaurantes = state.access_service.tenants_para_exibicao(&user).await?;
    Ok(Json(UserResumo {
        id: user.id,
        nome: user.nome,
        email: user.email,
        is_admin: user.is_admin,
        cliente_id: user.cliente_id,
        restaurantes: restaurantes
            .into_iter()
            .map(|t| RestauranteResumo {
                id: t.id,
                nome: t.nome,
                slug: t.slug,
            })
            .collect(),
    }))
}

/// POST /api/auth/refresh — token novo com o conjunto atual de restaurantes
pub async fn refresh(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<AuthResponse>, AppError> {
    let resposta = state.auth_service.refresh(&user).await?;
    Ok(Json(resposta))
}

/// POST /api/auth/logout — o JWT é stateless: limpa o cookie e registra a
/// saída na trilha
pub async fn logout(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    info: RequestInfo,
) -> Result<(StatusCode, AppendHeaders<[(header::HeaderName, String); 1]>), AppError> {
    state
        .audit_service
        .registrar(
            Some(user.id),
            None,
            "logout",
            "auth",
            Some(user.id),
            None,
            &info,
        )
        .await?;
    let cookie = cookie_de_sessao("", 0, state.settings.cookie_secure);
    Ok((
        StatusCode::NO_CONTENT,
        AppendHeaders([(header::SET_COOKIE, cookie)]),
    ))
}

fn cookie_de_sessao(token: &str, max_age_segundos: i64, secure: bool) -> String {
    let mut cookie = format!(
        "access_token={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_segundos}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_de_logout_expira_imediatamente() {
        let cookie = cookie_de_sessao("", 0, false);
        assert!(cookie.starts_with("access_token=;"));
        assert!(cookie.contains("Max-Age=0"));
        assert!(!cookie.contains("Secure"));
    }

    #[test]
    fn cookie_seguro_so_atras_de_https() {
        let cookie = cookie_de_sessao("abc", 3600, true);
        assert!(cookie.contains("access_token=abc"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.ends_with("; Secure"));
    }
}
