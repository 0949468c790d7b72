use std::collections::BTreeMap;

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::common::i18n::I18nStore;
use crate::middleware::i18n::Locale;

// Recursos expostos pela API. Usado para montar as chaves de mensagem ("employee.not_found").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    User,
    Role,
    Employee,
    Farm,
    Department,
    OrgStructure,
    ContractType,
    CostCenter,
    Color,
}

impl Resource {
    pub fn key(&self) -> &'static str {
        match self {
            Resource::User => "user",
            Resource::Role => "role",
            Resource::Employee => "employee",
            Resource::Farm => "farm",
            Resource::Department => "department",
            Resource::OrgStructure => "org_structure",
            Resource::ContractType => "contract_type",
            Resource::CostCenter => "cost_center",
            Resource::Color => "color",
        }
    }
}

// Nosso tipo de erro de domínio. Repositórios e serviços só conhecem este tipo;
// a tradução para HTTP acontece em `to_api_error`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // Erros de regra (unicidade, referência inexistente) por campo: campo -> códigos
    #[error("Erro de validação nos campos: {0:?}")]
    FieldErrors(BTreeMap<&'static str, Vec<&'static str>>),

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Permissão ausente: {0}")]
    MissingPermission(&'static str),

    #[error("Recurso não encontrado: {0:?}")]
    NotFound(Resource),

    // A exclusão foi bloqueada por registros dependentes. Carrega a chave da mensagem.
    #[error("Exclusão bloqueada: {0}")]
    HasDependents(&'static str),

    // Carrega o nome do campo que violou a chave única
    #[error("Violação de chave única: {0}")]
    UniqueConstraintViolation(&'static str),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    // Atalho para um único erro de campo
    pub fn field(field: &'static str, code: &'static str) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert(field, vec![code]);
        AppError::FieldErrors(errors)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::FieldErrors(_)
            | AppError::InvalidCredentials
            | AppError::UniqueConstraintViolation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::MissingPermission(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::HasDependents(_) => StatusCode::CONFLICT,
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converte o erro de domínio na resposta HTTP, traduzindo as mensagens
    /// para o idioma pedido pelo cliente.
    pub fn to_api_error(&self, locale: &Locale, store: &I18nStore) -> ApiError {
        let status = self.status();

        let (message, errors) = match self {
            AppError::ValidationError(validation) => {
                let mut details = BTreeMap::new();
                for (field, field_errors) in validation.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            let code = e.message.as_deref().unwrap_or(&*e.code);
                            let mut text = store.get(locale, &format!("validation.{}", code));
                            for (name, value) in &e.params {
                                if *name == "value" {
                                    continue;
                                }
                                text = text.replace(&format!("{{{}}}", name), &value.to_string());
                            }
                            text
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                (store.get(locale, "error.validation"), Some(details))
            }
            AppError::FieldErrors(fields) => {
                let details = fields
                    .iter()
                    .map(|(field, codes)| {
                        let messages = codes
                            .iter()
                            .map(|code| store.get(locale, &format!("validation.{}", code)))
                            .collect();
                        (field.to_string(), messages)
                    })
                    .collect();
                (store.get(locale, "error.validation"), Some(details))
            }
            AppError::UniqueConstraintViolation(field) => {
                let mut details = BTreeMap::new();
                details.insert(field.to_string(), vec![store.get(locale, "validation.taken")]);
                (store.get(locale, "error.validation"), Some(details))
            }
            AppError::InvalidCredentials => {
                let mut details = BTreeMap::new();
                details.insert(
                    "email".to_string(),
                    vec![store.get(locale, "error.invalid_credentials")],
                );
                (store.get(locale, "error.validation"), Some(details))
            }
            AppError::InvalidToken => (store.get(locale, "error.invalid_token"), None),
            AppError::MissingPermission(permission) => (
                store
                    .get(locale, "error.forbidden")
                    .replace("{permission}", permission),
                None,
            ),
            AppError::NotFound(resource) => (
                store.get(locale, &format!("{}.not_found", resource.key())),
                None,
            ),
            AppError::HasDependents(key) => (store.get(locale, key), None),

            // Todos os outros erros viram 500. O detalhe vai para o log, não para o cliente.
            e => {
                tracing::error!("Erro Interno do Servidor: {:?}", e);
                (store.get(locale, "error.internal"), None)
            }
        };

        ApiError {
            status,
            message,
            errors,
        }
    }
}

// Converte erro de chave única do Postgres no erro de campo correspondente.
// Quem chama informa qual constraint pertence a qual campo.
pub fn map_unique_violation(
    e: sqlx::Error,
    constraints: &[(&str, &'static str)],
) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            let field = db_err
                .constraint()
                .and_then(|c| constraints.iter().find(|(name, _)| *name == c))
                .map(|(_, field)| *field)
                .unwrap_or("name");
            return AppError::UniqueConstraintViolation(field);
        }
    }
    e.into()
}

// O erro já pronto para sair pela porta HTTP
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub errors: Option<BTreeMap<String, Vec<String>>>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    success: bool,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a BTreeMap<String, Vec<String>>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            success: false,
            message: &self.message,
            errors: self.errors.as_ref(),
        });
        (self.status, body).into_response()
    }
}

// Rejeições dos extratores do axum (JSON malformado, path/query inválidos).
// Nesse ponto ainda não temos o Locale, então a mensagem sai no idioma padrão.
// Corpo inutilizável (sintaxe, tipo, content-type) é erro de validação: 422.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: format!("Cuerpo JSON inválido: {}", rejection.body_text()),
            errors: None,
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError {
            status: StatusCode::NOT_FOUND,
            message: format!("Ruta inválida: {}", rejection.body_text()),
            errors: None,
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: format!("Parámetros de consulta inválidos: {}", rejection.body_text()),
            errors: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use validator::{ValidationError, ValidationErrors};

    fn spanish() -> Locale {
        Locale("es".to_string())
    }

    async fn body_json(error: ApiError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn status_codes_follow_the_error_contract() {
        assert_eq!(AppError::field("name", "taken").status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(AppError::NotFound(Resource::Farm).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::HasDependents("farm.has_employees").status(),
            StatusCode::CONFLICT
        );
        assert_eq!(AppError::InvalidToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::MissingPermission("ver fincas").status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::InternalServerError(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn not_found_is_localized() {
        let store = I18nStore::new();
        let error = AppError::NotFound(Resource::Employee).to_api_error(&spanish(), &store);
        let (status, body) = body_json(error).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Empleado no encontrado");
        assert!(body.get("errors").is_none());

        let english = AppError::NotFound(Resource::Employee)
            .to_api_error(&Locale("en".to_string()), &store);
        assert_eq!(english.message, "Employee not found");
    }

    #[tokio::test]
    async fn validation_errors_are_reported_per_field() {
        let store = I18nStore::new();
        let mut errors = ValidationErrors::new();
        let mut err = ValidationError::new("length");
        err.message = Some("too_long".into());
        err.add_param("max".into(), &100);
        errors.add("name", err);

        let api_error = AppError::ValidationError(errors).to_api_error(&spanish(), &store);
        let (status, body) = body_json(api_error).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["message"], "Error de validación");
        let message = body["errors"]["name"][0].as_str().unwrap();
        assert!(message.contains("100"), "mensagem sem o limite: {}", message);
    }

    #[tokio::test]
    async fn unique_violation_becomes_422_on_the_field() {
        let store = I18nStore::new();
        let api_error = AppError::UniqueConstraintViolation("code").to_api_error(&spanish(), &store);
        let (status, body) = body_json(api_error).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["errors"]["code"].is_array());
    }

    #[tokio::test]
    async fn internal_errors_do_not_leak_details() {
        let store = I18nStore::new();
        let api_error = AppError::InternalServerError(anyhow::anyhow!("senha do banco: 123"))
            .to_api_error(&spanish(), &store);
        let (status, body) = body_json(api_error).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body["message"].as_str().unwrap().contains("123"));
    }

    #[test]
    fn forbidden_names_the_missing_permission() {
        let store = I18nStore::new();
        let api_error =
            AppError::MissingPermission("eliminar fincas").to_api_error(&spanish(), &store);
        assert!(api_error.message.contains("eliminar fincas"));
    }
}
