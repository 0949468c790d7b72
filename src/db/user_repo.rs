// src/db/user_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{
        error::{map_unique_violation, AppError},
        query::PageRequest,
    },
    models::auth::{LoginLocation, User, UserSummary},
};

const USER_COLUMNS: &str = "id, name, email, password_hash, created_at, updated_at";

// Constraint do Postgres -> campo do payload
const UNIQUE_KEYS: &[(&str, &'static str)] = &[("users_email_key", "email")];

// O repositório de usuários: tabelas users, login_locations e revoked_tokens
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Busca um usuário pelo seu e-mail
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let maybe_user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(maybe_user)
    }

    // Busca um usuário pelo seu ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let maybe_user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(maybe_user)
    }

    pub async fn exists(&self, id: i64) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    // `except_id` ignora o próprio registro no update
    pub async fn email_taken(&self, email: &str, except_id: Option<i64>) -> Result<bool, AppError> {
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE email = $1 AND ($2::BIGINT IS NULL OR id <> $2))",
        )
        .bind(email)
        .bind(except_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    pub async fn list(&self, page: PageRequest) -> Result<(Vec<User>, i64), AppError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2",
            USER_COLUMNS
        ))
        .bind(page.per_page)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok((users, total))
    }

    // Carrega vários usuários resumidos de uma vez (relação dos empregados)
    pub async fn find_summaries(&self, ids: &[i64]) -> Result<Vec<UserSummary>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let users = sqlx::query_as::<_, UserSummary>(
            "SELECT id, name, email FROM users WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    // Cria um novo usuário no banco de dados
    pub async fn create_user<'e, E>(
        &self,
        executor: E,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, email, password_hash) VALUES ($1, $2, $3) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_violation(e, UNIQUE_KEYS))?;

        Ok(user)
    }

    // Grava a linha inteira (o merge do PUT parcial já foi feito no serviço)
    pub async fn update_user(&self, user: &User) -> Result<User, AppError> {
        let updated = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET name = $2, email = $3, password_hash = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, UNIQUE_KEYS))?;

        Ok(updated)
    }

    pub async fn delete_user(&self, id: i64) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    // ---
    // Histórico de acessos
    // ---

    pub async fn record_login_location(
        &self,
        user_id: i64,
        latitude: Option<Decimal>,
        longitude: Option<Decimal>,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<LoginLocation, AppError> {
        let location = sqlx::query_as::<_, LoginLocation>(
            r#"
            INSERT INTO login_locations (user_id, latitude, longitude, ip_address, user_agent)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, latitude, longitude, ip_address, user_agent, login_at
            "#,
        )
        .bind(user_id)
        .bind(latitude)
        .bind(longitude)
        .bind(ip_address)
        .bind(user_agent)
        .fetch_one(&self.pool)
        .await?;
        Ok(location)
    }

    pub async fn list_login_locations(
        &self,
        user_id: i64,
        page: PageRequest,
    ) -> Result<(Vec<LoginLocation>, i64), AppError> {
        let locations = sqlx::query_as::<_, LoginLocation>(
            r#"
            SELECT id, user_id, latitude, longitude, ip_address, user_agent, login_at
            FROM login_locations
            WHERE user_id = $1
            ORDER BY login_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(page.per_page)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM login_locations WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((locations, total))
    }

    // ---
    // Tokens revogados (logout)
    // ---

    pub async fn revoke_token(
        &self,
        jti: Uuid,
        user_id: i64,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO revoked_tokens (jti, user_id, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (jti) DO NOTHING
            "#,
        )
        .bind(jti)
        .bind(user_id)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        // Tokens já expirados não precisam mais ficar na lista (margem para relógios desalinhados)
        sqlx::query("DELETE FROM revoked_tokens WHERE expires_at < NOW() - INTERVAL '2 minutes'")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn is_token_revoked(&self, jti: Uuid) -> Result<bool, AppError> {
        let revoked = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM revoked_tokens WHERE jti = $1)",
        )
        .bind(jti)
        .fetch_one(&self.pool)
        .await?;
        Ok(revoked)
    }
}
