pub mod auth;
pub mod catalog;
pub mod employees;
pub mod organization;
pub mod rbac;
pub mod users;

use crate::{config::AppState, middleware::i18n::Locale};

// Mensagem do envelope de sucesso no idioma do cliente
pub(crate) fn message(app_state: &AppState, locale: &Locale, key: &str) -> String {
    app_state.i18n_store.get(locale, key)
}
