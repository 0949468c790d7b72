// src/models/auth.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    pub password_hash: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Versão resumida, usada quando o usuário aparece como relação de outro recurso
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
}

// Dados para registro de um novo usuário
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterUserPayload {
    #[validate(length(min = 1, max = 255, message = "length"))]
    pub name: String,
    #[validate(
        email(message = "invalid_email"),
        length(max = 255, message = "too_long")
    )]
    pub email: String,
    #[validate(length(min = 8, message = "too_short"))]
    pub password: String,
}

// Dados para login. Latitude/longitude são opcionais e vão para o histórico de acessos.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginUserPayload {
    #[validate(email(message = "invalid_email"))]
    pub email: String,
    #[validate(length(min = 1, message = "required"))]
    pub password: String,
    #[validate(range(min = -90.0, max = 90.0, message = "invalid_coordinate"))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0, message = "invalid_coordinate"))]
    pub longitude: Option<f64>,
}

// Resposta de autenticação: usuário + token
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub user: User,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,   // Subject (ID do usuário)
    pub jti: Uuid,  // ID do token, usado no logout
    pub exp: usize, // Expiration time
    pub iat: usize, // Issued At
}

// Metadados do acesso, colhidos dos cabeçalhos da requisição de login
#[derive(Debug, Clone, Default)]
pub struct LoginContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LoginLocation {
    pub id: i64,
    pub user_id: i64,
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub login_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_requires_eight_character_password() {
        let payload = RegisterUserPayload {
            name: "Ana".into(),
            email: "ana@finca.co".into(),
            password: "corta".into(),
        };
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));
    }

    #[test]
    fn login_rejects_out_of_range_coordinates() {
        let payload = LoginUserPayload {
            email: "ana@finca.co".into(),
            password: "secreto123".into(),
            latitude: Some(91.0),
            longitude: Some(-76.53),
        };
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("latitude"));
        assert!(!errors.field_errors().contains_key("longitude"));
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let user = User {
            id: 1,
            name: "Ana".into(),
            email: "ana@finca.co".into(),
            password_hash: "$2b$12$segredo".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["email"], "ana@finca.co");
    }
}
