// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{RbacRepository, UserRepository},
    middleware::auth::AuthenticatedUser,
    models::auth::{
        AuthResponse, Claims, LoginContext, LoginUserPayload, ProfileResponse,
        RegisterUserPayload, User,
    },
};

// Hashing fora do runtime assíncrono (bcrypt é caro de propósito)
pub(crate) async fn hash_password(password: &str) -> Result<String, AppError> {
    let password_clone = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

pub(crate) fn encode_token(secret: &str, user_id: i64, ttl_hours: i64) -> Result<String, AppError> {
    let now = Utc::now();
    let expires_at = now + Duration::hours(ttl_hours);

    let claims = Claims {
        sub: user_id,
        jti: Uuid::new_v4(),
        exp: expires_at.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )?)
}

// Assinatura errada, token malformado ou expirado viram 401.
// Sem tolerância no `exp`: a lista de revogados é limpa assim que o token expira.
pub(crate) fn decode_token(secret: &str, token: &str) -> Result<Claims, AppError> {
    let mut validation = Validation::default();
    validation.leeway = 0;
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &validation,
    )
    .map_err(|_| AppError::InvalidToken)?;
    Ok(token_data.claims)
}

// Coordenadas com a mesma precisão da coluna NUMERIC(10, 7)
fn to_coordinate(value: Option<f64>) -> Option<Decimal> {
    value
        .and_then(Decimal::from_f64_retain)
        .map(|d| d.round_dp(7))
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    rbac_repo: RbacRepository,
    jwt_secret: String,
    jwt_ttl_hours: i64,
    guard: String,
    pool: PgPool,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        rbac_repo: RbacRepository,
        jwt_secret: String,
        jwt_ttl_hours: i64,
        guard: String,
        pool: PgPool,
    ) -> Self {
        Self {
            user_repo,
            rbac_repo,
            jwt_secret,
            jwt_ttl_hours,
            guard,
            pool,
        }
    }

    pub async fn register_user(&self, payload: &RegisterUserPayload) -> Result<AuthResponse, AppError> {
        if self.user_repo.email_taken(&payload.email, None).await? {
            return Err(AppError::field("email", "taken"));
        }

        // 1. Hashing
        let hashed_password = hash_password(&payload.password).await?;

        // 2. Cria Usuário
        let user = self
            .user_repo
            .create_user(&self.pool, &payload.name, &payload.email, &hashed_password)
            .await?;

        tracing::info!(user_id = user.id, "novo usuário registrado");

        // 3. Gera o token
        let token = self.create_token(user.id)?;
        Ok(AuthResponse { user, token })
    }

    pub async fn login_user(
        &self,
        payload: &LoginUserPayload,
        context: LoginContext,
    ) -> Result<AuthResponse, AppError> {
        let user = self
            .user_repo
            .find_by_email(&payload.email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = payload.password.clone();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid =
            tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash_clone))
                .await
                .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            tracing::warn!(user_id = user.id, "tentativa de login com senha incorreta");
            return Err(AppError::InvalidCredentials);
        }

        // O histórico de acessos não pode derrubar o login
        if let Err(e) = self
            .user_repo
            .record_login_location(
                user.id,
                to_coordinate(payload.latitude),
                to_coordinate(payload.longitude),
                context.ip_address.as_deref(),
                context.user_agent.as_deref(),
            )
            .await
        {
            tracing::error!("Falha ao registrar local de login: {:?}", e);
        }

        let token = self.create_token(user.id)?;
        Ok(AuthResponse { user, token })
    }

    pub async fn logout(&self, current: &AuthenticatedUser) -> Result<(), AppError> {
        self.user_repo
            .revoke_token(current.token_id, current.user.id, current.expires_at)
            .await?;
        tracing::info!(user_id = current.user.id, "logout");
        Ok(())
    }

    pub async fn profile(&self, user: User) -> Result<ProfileResponse, AppError> {
        let roles = self.rbac_repo.role_names_for_user(user.id, &self.guard).await?;
        let permissions = self
            .rbac_repo
            .permission_names_for_user(user.id, &self.guard)
            .await?;
        Ok(ProfileResponse {
            user,
            roles,
            permissions,
        })
    }

    // Token -> usuário. Usado pelo `auth_guard` em toda rota protegida.
    pub async fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        let claims = decode_token(&self.jwt_secret, token)?;

        if self.user_repo.is_token_revoked(claims.jti).await? {
            return Err(AppError::InvalidToken);
        }

        // Usuário apagado depois de emitir o token
        let user = self
            .user_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)?;

        let expires_at = DateTime::<Utc>::from_timestamp(claims.exp as i64, 0)
            .ok_or(AppError::InvalidToken)?;

        Ok(AuthenticatedUser {
            user,
            token_id: claims.jti,
            expires_at,
        })
    }

    fn create_token(&self, user_id: i64) -> Result<String, AppError> {
        encode_token(&self.jwt_secret, user_id, self.jwt_ttl_hours)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "segredo-de-teste";

    #[test]
    fn issued_tokens_decode_back_to_the_user() {
        let token = encode_token(SECRET, 42, 1).unwrap();
        let claims = decode_token(SECRET, &token).unwrap();
        assert_eq!(claims.sub, 42);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn every_token_gets_its_own_id() {
        let first = decode_token(SECRET, &encode_token(SECRET, 1, 1).unwrap()).unwrap();
        let second = decode_token(SECRET, &encode_token(SECRET, 1, 1).unwrap()).unwrap();
        assert_ne!(first.jti, second.jti);
    }

    #[test]
    fn tokens_signed_with_another_secret_are_rejected() {
        let token = encode_token("outro-segredo", 1, 1).unwrap();
        assert!(matches!(decode_token(SECRET, &token), Err(AppError::InvalidToken)));
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let token = encode_token(SECRET, 1, -2).unwrap();
        assert!(matches!(decode_token(SECRET, &token), Err(AppError::InvalidToken)));
    }

    #[test]
    fn token_expired_seconds_ago_is_already_rejected() {
        let now = Utc::now();
        let claims = Claims {
            sub: 1,
            jti: Uuid::new_v4(),
            exp: (now - Duration::seconds(5)).timestamp() as usize,
            iat: (now - Duration::hours(1)).timestamp() as usize,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_ref()),
        )
        .unwrap();
        assert!(matches!(decode_token(SECRET, &token), Err(AppError::InvalidToken)));
    }

    #[test]
    fn garbage_is_not_a_token() {
        assert!(matches!(decode_token(SECRET, "abc.def.ghi"), Err(AppError::InvalidToken)));
    }

    #[test]
    fn coordinates_are_rounded_to_seven_places() {
        let value = to_coordinate(Some(3.451_234_567_89)).unwrap();
        assert_eq!(value.to_string(), "3.4512346");
        assert_eq!(to_coordinate(None), None);
    }

    #[tokio::test]
    async fn hashed_passwords_verify() {
        let hashed = hash_password("Secreto123").await.unwrap();
        assert!(verify("Secreto123", &hashed).unwrap());
        assert!(!verify("otra", &hashed).unwrap());
    }
}
