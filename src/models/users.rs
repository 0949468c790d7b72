// src/models/users.rs

use serde::Deserialize;
use validator::Validate;

use crate::common::validation::{validate_strong_password, PERSON_NAME};
use crate::models::auth::User;

// Criação de usuário pelo administrador: regras mais rígidas que o auto-registro
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserPayload {
    #[validate(
        length(min = 1, max = 255, message = "length"),
        regex(path = *PERSON_NAME, message = "invalid_name")
    )]
    pub name: String,

    #[validate(
        email(message = "invalid_email"),
        length(max = 255, message = "too_long")
    )]
    pub email: String,

    #[validate(
        length(min = 8, message = "too_short"),
        custom(function = "validate_strong_password")
    )]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserPayload {
    #[validate(length(min = 1, max = 255, message = "length"))]
    pub name: Option<String>,

    #[validate(
        email(message = "invalid_email"),
        length(max = 255, message = "too_long")
    )]
    pub email: Option<String>,

    #[validate(length(min = 8, message = "too_short"))]
    pub password: Option<String>,
}

impl UpdateUserPayload {
    // Aplica os campos presentes. A senha já deve chegar com hash.
    pub fn apply_to(&self, user: &mut User, password_hash: Option<String>) {
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if let Some(hash) = password_hash {
            user.password_hash = hash;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user() -> User {
        User {
            id: 7,
            name: "Ana Gómez".into(),
            email: "ana@finca.co".into(),
            password_hash: "hash".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn admin_created_users_need_letters_only_names_and_strong_passwords() {
        let payload = CreateUserPayload {
            name: "Ana 2".into(),
            email: "ana@finca.co".into(),
            password: "abcdefgh".into(),
        };
        let errors = payload.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("password"));
        assert!(!fields.contains_key("email"));
    }

    #[test]
    fn partial_update_keeps_missing_fields() {
        let mut target = user();
        let payload = UpdateUserPayload {
            name: None,
            email: Some("nueva@finca.co".into()),
            password: None,
        };
        payload.apply_to(&mut target, None);

        assert_eq!(target.name, "Ana Gómez");
        assert_eq!(target.email, "nueva@finca.co");
        assert_eq!(target.password_hash, "hash");
    }
}
