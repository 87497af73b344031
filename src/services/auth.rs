// src/services/auth.rs

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::{
    common::error::AppError,
    db::{AuditRepository, UserRepository},
    models::auth::{AuthResponse, Claims, LoginPayload, RestauranteResumo, User, UserResumo},
    services::access::AccessService,
};

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    access: AccessService,
    audit_repo: AuditRepository,
    jwt_secret: String,
    jwt_expiration_minutes: i64,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        access: AccessService,
        audit_repo: AuditRepository,
        jwt_secret: String,
        jwt_expiration_minutes: i64,
    ) -> Self {
        Self {
            user_repo,
            access,
            audit_repo,
            jwt_secret,
            jwt_expiration_minutes,
        }
    }

    /// Autentica e-mail + senha e emite o token com os restaurantes ativos.
    ///
    /// Falha de credencial é sempre o MESMO erro, exista o e-mail ou não,
    /// para não vazar quais contas existem. Conta ou cliente desativado
    /// responde 403 com o motivo.
    pub async fn login(
        &self,
        payload: &LoginPayload,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<AuthResponse, AppError> {
        let user = match self.user_repo.find_by_email(&payload.email).await? {
            Some(u) => u,
            None => {
                // Custo de bcrypt mesmo sem usuário, para igualar o tempo de resposta
                let senha = payload.senha.clone();
                let _ = tokio::task::spawn_blocking(move || {
                    bcrypt::verify(&senha, "$2b$12$C6UzMDM.H6dfI/f/IKcEeO7ZX5PVbXMEGdWWmHssKRnBQkVg0l4lC")
                })
                .await
                .map_err(|e| AppError::InternalServerError(e.into()))?;
                return Err(AppError::InvalidCredentials);
            }
        };

        // bcrypt é CPU-bound; sai do executor async
        let senha = payload.senha.clone();
        let hash = user.senha_hash.clone();
        let senha_valida = tokio::task::spawn_blocking(move || bcrypt::verify(&senha, &hash))
            .await
            .map_err(|e| AppError::InternalServerError(e.into()))??;

        if !senha_valida {
            return Err(AppError::InvalidCredentials);
        }
        if !user.ativo {
            return Err(AppError::Forbidden("Usuário inativo".to_string()));
        }

        let resposta = self.emitir_resposta(&user).await?;

        self.audit_repo
            .insert(
                self.audit_repo.pool(),
                Some(user.id),
                None,
                "login",
                "auth",
                Some(user.id),
                None,
                ip_address,
                user_agent,
            )
            .await?;

        Ok(resposta)
    }

    /// Reemite um token para o usuário autenticado, recalculando o conjunto
    /// de restaurantes ativos (associações mudam sem derrubar a sessão).
    pub async fn refresh(&self, user: &User) -> Result<AuthResponse, AppError> {
        if !user.ativo {
            return Err(AppError::Forbidden("Usuário inativo".to_string()));
        }
        self.emitir_resposta(user).await
    }

    async fn emitir_resposta(&self, user: &User) -> Result<AuthResponse, AppError> {
        let restaurantes = self.access.tenants_para_token(user).await?;
        let tenant_ids = restaurantes.iter().map(|t| t.id).collect::<Vec<_>>();

        let token = criar_token(
            user,
            tenant_ids,
            &self.jwt_secret,
            self.jwt_expiration_minutes,
        )?;

        Ok(AuthResponse {
            access_token: token,
            token_type: "Bearer".to_string(),
            user: UserResumo {
                id: user.id,
                nome: user.nome.clone(),
                email: user.email.clone(),
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
            },
        })
    }

    /// Decodifica o token e recarrega o usuário do banco. Token de usuário
    /// desativado deixa de valer imediatamente, mesmo antes do `exp`.
    pub async fn validate_token(&self, token: &str) -> Result<(User, Claims), AppError> {
        let claims = decodificar_token(token, &self.jwt_secret)?;

        let user = self
            .user_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)?;

        if !user.ativo {
            return Err(AppError::InvalidToken);
        }

        Ok((user, claims))
    }
}

/// Hash de senha para cadastro/troca. bcrypt é CPU-bound; sai do executor
/// async.
pub async fn hash_senha(senha: String) -> Result<String, AppError> {
    let hash = tokio::task::spawn_blocking(move || bcrypt::hash(&senha, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| AppError::InternalServerError(e.into()))??;
    Ok(hash)
}

/// Gera o JWT (HS256) com os claims do usuário.
pub fn criar_token(
    user: &User,
    tenant_ids: Vec<uuid::Uuid>,
    secret: &str,
    expiration_minutes: i64,
) -> Result<String, AppError> {
    let agora = Utc::now();
    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        cliente_id: user.cliente_id,
        tenant_ids,
        is_admin: user.is_admin,
        exp: (agora + Duration::minutes(expiration_minutes)).timestamp() as usize,
        iat: agora.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

pub fn decodificar_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::InvalidToken)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn usuario_teste() -> User {
        User {
            id: Uuid::new_v4(),
            cliente_id: Uuid::new_v4(),
            nome: "Maria Souza".to_string(),
            email: "maria@restaurante.com.br".to_string(),
            senha_hash: "irrelevante".to_string(),
            is_admin: false,
            ativo: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn token_emitido_decodifica_com_os_mesmos_claims() {
        let user = usuario_teste();
        let tenants = vec![Uuid::new_v4(), Uuid::new_v4()];
        let token = criar_token(&user, tenants.clone(), "segredo-de-teste", 60)
            .expect("token deve ser emitido");

        let claims = decodificar_token(&token, "segredo-de-teste")
            .expect("token deve decodificar");

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.cliente_id, user.cliente_id);
        assert_eq!(claims.tenant_ids, tenants);
        assert!(!claims.is_admin);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_com_segredo_errado_e_rejeitado() {
        let user = usuario_teste();
        let token = criar_token(&user, vec![], "segredo-a", 60).expect("token deve ser emitido");

        let resultado = decodificar_token(&token, "segredo-b");
        assert!(matches!(resultado, Err(AppError::InvalidToken)));
    }

    #[test]
    fn token_expirado_e_rejeitado() {
        let user = usuario_teste();
        // Expiração negativa: o token nasce vencido
        let token = criar_token(&user, vec![], "segredo", -5).expect("token deve ser emitido");

        let resultado = decodificar_token(&token, "segredo");
        assert!(matches!(resultado, Err(AppError::InvalidToken)));
    }
}
