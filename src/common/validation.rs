// src/common/validation.rs

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use validator::{ValidationError, ValidationErrors};

use crate::common::error::AppError;

pub static HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("regex de cor válida"));

// Letras (com acentos e ñ) e espaços
pub static PERSON_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-ZáéíóúÁÉÍÓÚñÑ\s]+$").expect("regex de nome válida"));

// Regra de senha forte usada na criação de usuários pelo admin
pub fn validate_strong_password(password: &str) -> Result<(), ValidationError> {
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if has_upper && has_lower && has_digit {
        Ok(())
    } else {
        let mut err = ValidationError::new("password");
        err.message = Some("weak_password".into());
        Err(err)
    }
}

// Validação de campos `Option<Option<String>>` (PUT parcial com null explícito).
// Só valida quando vier um valor de fato.
pub fn check_nullable_length(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: &Option<Option<String>>,
    max: u64,
) {
    if let Some(Some(text)) = value {
        if text.chars().count() as u64 > max {
            let mut err = ValidationError::new("length");
            err.message = Some("too_long".into());
            err.add_param("max".into(), &max);
            errors.add(field, err);
        }
    }
}

// Junta o resultado do `validate()` derivado com checagens manuais
pub fn into_result(errors: ValidationErrors) -> Result<(), ValidationErrors> {
    if errors.errors().is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Acumula erros de regra de negócio (unicidade, referências) por campo,
/// para devolver todos de uma vez num único 422.
#[derive(Debug, Default)]
pub struct FieldCheck {
    errors: BTreeMap<&'static str, Vec<&'static str>>,
}

impl FieldCheck {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, code: &'static str) {
        self.errors.entry(field).or_default().push(code);
    }

    // Registra `code` quando a condição de erro for verdadeira
    pub fn fail_if(&mut self, failed: bool, field: &'static str, code: &'static str) {
        if failed {
            self.add(field, code);
        }
    }

    pub fn finish(self) -> Result<(), AppError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::FieldErrors(self.errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_color_requires_hash_and_six_digits() {
        assert!(HEX_COLOR.is_match("#0066CC"));
        assert!(HEX_COLOR.is_match("#a1b2c3"));
        assert!(!HEX_COLOR.is_match("0066CC"));
        assert!(!HEX_COLOR.is_match("#06C"));
        assert!(!HEX_COLOR.is_match("#GGGGGG"));
    }

    #[test]
    fn person_name_accepts_spanish_letters() {
        assert!(PERSON_NAME.is_match("José Muñoz"));
        assert!(!PERSON_NAME.is_match("R2D2"));
    }

    #[test]
    fn strong_password_needs_three_classes() {
        assert!(validate_strong_password("Secreto123").is_ok());
        assert!(validate_strong_password("secreto123").is_err());
        assert!(validate_strong_password("SECRETO123").is_err());
        assert!(validate_strong_password("SecretoSinNumero").is_err());
    }

    #[test]
    fn nullable_length_ignores_absent_and_null() {
        let mut errors = ValidationErrors::new();
        check_nullable_length(&mut errors, "photo", &None, 5);
        check_nullable_length(&mut errors, "photo", &Some(None), 5);
        assert!(into_result(errors).is_ok());

        let mut errors = ValidationErrors::new();
        check_nullable_length(&mut errors, "photo", &Some(Some("123456".into())), 5);
        assert!(into_result(errors).is_err());
    }

    #[test]
    fn field_check_collects_every_failure() {
        let mut check = FieldCheck::new();
        check.fail_if(true, "name", "taken");
        check.fail_if(false, "code", "taken");
        check.fail_if(true, "colorId", "not_found");

        match check.finish() {
            Err(AppError::FieldErrors(errors)) => {
                assert_eq!(errors.len(), 2);
                assert_eq!(errors["name"], vec!["taken"]);
            }
            other => panic!("esperava FieldErrors, veio {:?}", other),
        }
    }
}
