// src/middleware/auth.rs

use axum::{
    extract::{ConnectInfo, FromRequestParts, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;

use crate::{
    common::error::AppError,
    config::AppState,
    models::{audit::RequestInfo, auth::User},
};

// O middleware em si: valida o token (Bearer ou cookie de sessão) e injeta
// o usuário na requisição
pub async fn auth_guard(
    State(app_state): State<AppState>,
    mut request: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = extrair_token(request.headers()).ok_or(AppError::InvalidToken)?;
    let (user, claims) = app_state.auth_service.validate_token(&token).await?;

    // Insere usuário e claims nos "extensions" da requisição
    request.extensions_mut().insert(user);
    request.extensions_mut().insert(std::sync::Arc::new(claims));
    Ok(next.run(request).await)
}

/// Bearer no Authorization tem prioridade; o cookie `access_token` cobre os
/// clientes de navegador.
fn extrair_token(headers: &axum::http::HeaderMap) -> Option<String> {
    if let Some(auth) = headers.get("Authorization").and_then(|v| v.to_str().ok()) {
        if let Some(token) = auth.strip_prefix("Bearer ") {
            return Some(token.to_string());
        }
    }

    headers
        .get("Cookie")
        .and_then(|v| v.to_str().ok())?
        .split(';')
        .map(str::trim)
        .find_map(|par| par.strip_prefix("access_token="))
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
}

// Extrator para obter o usuário autenticado diretamente nos handlers
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<User>()
            .cloned()
            .map(AuthenticatedUser)
            .ok_or(AppError::InvalidToken)
    }
}

/// Extrator do usuário que exige admin do SaaS (painel administrativo).
pub struct SaasAdmin(pub User);

impl<S> FromRequestParts<S> for SaasAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(user) = AuthenticatedUser::from_request_parts(parts, state).await?;
        if !user.is_admin {
            return Err(AppError::Forbidden(
                "Acesso restrito ao painel administrativo".to_string(),
            ));
        }
        Ok(SaasAdmin(user))
    }
}

// Extrator de IP e User-Agent para a trilha de auditoria
impl<S> FromRequestParts<S> for RequestInfo
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Atrás de proxy o IP real vem no X-Forwarded-For (primeiro da lista)
        let forwarded = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string());

        let ip = match forwarded {
            Some(ip) => Some(ip),
            None => parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ci| ci.0.ip().to_string()),
        };

        let user_agent = parts
            .headers
            .get("user-agent")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());

        Ok(RequestInfo { ip, user_agent })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue};

    #[test]
    fn bearer_tem_prioridade_sobre_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", HeaderValue::from_static("Bearer abc"));
        headers.insert("Cookie", HeaderValue::from_static("access_token=xyz"));
        assert_eq!(extrair_token(&headers).as_deref(), Some("abc"));
    }

    #[test]
    fn cookie_de_sessao_e_lido_entre_outros_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Cookie",
            HeaderValue::from_static("tema=escuro; access_token=xyz; lang=pt"),
        );
        assert_eq!(extrair_token(&headers).as_deref(), Some("xyz"));
    }

    #[test]
    fn cookie_vazio_ou_ausente_nao_autentica() {
        let mut headers = HeaderMap::new();
        assert!(extrair_token(&headers).is_none());
        headers.insert("Cookie", HeaderValue::from_static("access_token="));
        assert!(extrair_token(&headers).is_none());
    }
}
