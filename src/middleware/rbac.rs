// src/middleware/rbac.rs

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use std::marker::PhantomData;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
};

/// 1. O Trait que define o que é uma Permissão
pub trait PermissionDef: Send + Sync + 'static {
    fn slug() -> &'static str;
}

/// 2. O Extractor (Guardião). Deve vir depois do `auth_guard`.
pub struct RequirePermission<T>(pub PhantomData<T>);

// 3. Implementação do FromRequestParts
impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let locale = Locale::from_headers(&parts.headers);
        let store = &app_state.i18n_store;

        // A. Extrai Usuário
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or_else(|| AppError::InvalidToken.to_api_error(&locale, store))?;

        // B. Pega o slug da permissão
        let required_perm = T::slug();

        // C. Verifica no Banco
        let has_permission = app_state
            .rbac_repo
            .user_has_permission(user.user.id, required_perm, &app_state.settings.auth_guard)
            .await
            .map_err(|e| e.to_api_error(&locale, store))?;

        if !has_permission {
            tracing::debug!(
                user_id = user.user.id,
                permission = required_perm,
                "acesso negado"
            );
            return Err(AppError::MissingPermission(required_perm).to_api_error(&locale, store));
        }

        Ok(RequirePermission(PhantomData))
    }
}

// ---
// DEFINIÇÃO DAS PERMISSÕES (TIPOS)
// ---

macro_rules! permissions {
    ($($name:ident => $slug:literal),* $(,)?) => {
        $(
            pub struct $name;
            impl PermissionDef for $name {
                fn slug() -> &'static str { $slug }
            }
        )*
    };
}

permissions! {
    PermUsersRead => "ver usuarios",
    PermUsersCreate => "crear usuarios",
    PermUsersUpdate => "editar usuarios",
    PermUsersDelete => "eliminar usuarios",

    PermEmployeesRead => "ver empleados",
    PermEmployeesCreate => "crear empleados",
    PermEmployeesUpdate => "editar empleados",
    PermEmployeesDelete => "eliminar empleados",

    PermDepartmentsRead => "ver departamentos",
    PermDepartmentsCreate => "crear departamentos",
    PermDepartmentsUpdate => "editar departamentos",
    PermDepartmentsDelete => "eliminar departamentos",

    PermStructuresRead => "ver estructuras",
    PermStructuresCreate => "crear estructuras",
    PermStructuresUpdate => "editar estructuras",
    PermStructuresDelete => "eliminar estructuras",

    PermFarmsRead => "ver fincas",
    PermFarmsCreate => "crear fincas",
    PermFarmsUpdate => "editar fincas",
    PermFarmsDelete => "eliminar fincas",

    PermColorsRead => "ver colores",
    PermColorsCreate => "crear colores",
    PermColorsUpdate => "editar colores",
    PermColorsDelete => "eliminar colores",

    PermContractTypesRead => "ver tipos-contrato",
    PermContractTypesCreate => "crear tipos-contrato",
    PermContractTypesUpdate => "editar tipos-contrato",
    PermContractTypesDelete => "eliminar tipos-contrato",

    PermCostCentersRead => "ver centros-costo",
    PermCostCentersCreate => "crear centros-costo",
    PermCostCentersUpdate => "editar centros-costo",
    PermCostCentersDelete => "eliminar centros-costo",

    PermRolesRead => "ver roles",
    PermRolesCreate => "crear roles",
    PermRolesUpdate => "editar roles",
    PermRolesDelete => "eliminar roles",
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = include_str!("../../migrations/20250827000000_initial_schema.sql");

    fn all_slugs() -> Vec<&'static str> {
        vec![
            PermUsersRead::slug(), PermUsersCreate::slug(), PermUsersUpdate::slug(), PermUsersDelete::slug(),
            PermEmployeesRead::slug(), PermEmployeesCreate::slug(), PermEmployeesUpdate::slug(), PermEmployeesDelete::slug(),
            PermDepartmentsRead::slug(), PermDepartmentsCreate::slug(), PermDepartmentsUpdate::slug(), PermDepartmentsDelete::slug(),
            PermStructuresRead::slug(), PermStructuresCreate::slug(), PermStructuresUpdate::slug(), PermStructuresDelete::slug(),
            PermFarmsRead::slug(), PermFarmsCreate::slug(), PermFarmsUpdate::slug(), PermFarmsDelete::slug(),
            PermColorsRead::slug(), PermColorsCreate::slug(), PermColorsUpdate::slug(), PermColorsDelete::slug(),
            PermContractTypesRead::slug(), PermContractTypesCreate::slug(), PermContractTypesUpdate::slug(), PermContractTypesDelete::slug(),
            PermCostCentersRead::slug(), PermCostCentersCreate::slug(), PermCostCentersUpdate::slug(), PermCostCentersDelete::slug(),
            PermRolesRead::slug(), PermRolesCreate::slug(), PermRolesUpdate::slug(), PermRolesDelete::slug(),
        ]
    }

    #[test]
    fn every_permission_is_seeded_by_the_migration() {
        for slug in all_slugs() {
            let (action, resource) = slug.split_once(' ').unwrap();
            assert!(SCHEMA.contains(&format!("'{}'", action)), "ação ausente: {}", slug);
            assert!(SCHEMA.contains(&format!("'{}'", resource)), "recurso ausente: {}", slug);
        }
    }

    #[test]
    fn slugs_are_unique() {
        let mut slugs = all_slugs();
        let total = slugs.len();
        slugs.sort();
        slugs.dedup();
        assert_eq!(slugs.len(), total);
        assert_eq!(total, 36);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn permission_check_follows_seeded_roles_and_guard(pool: sqlx::PgPool) {
        use crate::services::fixtures;

        let user = fixtures::user(&pool, "gerente@finca.co").await;
        let gerente = fixtures::seeded_role(&pool, "gerente").await;
        fixtures::grant(&pool, user, gerente).await;
        let repo = fixtures::state(pool).rbac_repo;

        assert!(repo.user_has_permission(user, PermFarmsRead::slug(), "api").await.unwrap());
        assert!(!repo.user_has_permission(user, PermFarmsDelete::slug(), "api").await.unwrap());
        // Mesmo cargo, outro guard: nada vale
        assert!(!repo.user_has_permission(user, PermFarmsRead::slug(), "web").await.unwrap());
    }
}
