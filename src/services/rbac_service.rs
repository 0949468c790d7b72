// src/services/rbac_service.rs

use std::collections::HashMap;

use sqlx::PgPool;

use crate::common::db_utils::missing_ids;
use crate::common::error::{AppError, Resource};
use crate::common::query::{PageRequest, Paginated};
use crate::common::validation::FieldCheck;
use crate::db::{RbacRepository, UserRepository};
use crate::models::rbac::{
    AssignRolesPayload, AssignRolesResponse, AssignedUser, CreatePermissionPayload,
    CreateRolePayload, Permission, Role, RoleResponse, UpdateRolePayload, UserWithRoles,
};
use crate::services::group_by;

#[derive(Clone)]
pub struct RbacService {
    repo: RbacRepository,
    user_repo: UserRepository,
    guard: String,
    pool: PgPool,
}

impl RbacService {
    pub fn new(repo: RbacRepository, user_repo: UserRepository, guard: String, pool: PgPool) -> Self {
        Self {
            repo,
            user_repo,
            guard,
            pool,
        }
    }

    // Junta cada cargo com as suas permissões (uma consulta para todos)
    async fn with_permissions(&self, roles: Vec<Role>) -> Result<Vec<RoleResponse>, AppError> {
        let ids: Vec<i64> = roles.iter().map(|r| r.id).collect();
        let rows = self.repo.permissions_for_roles(&ids).await?;
        let mut by_role: HashMap<i64, Vec<Permission>> = group_by(rows, |row| row.role_id);

        Ok(roles
            .into_iter()
            .map(|role| RoleResponse {
                permissions: by_role.remove(&role.id).unwrap_or_default(),
                role,
            })
            .collect())
    }

    async fn check_permission_ids(&self, check: &mut FieldCheck, ids: &[i64]) -> Result<(), AppError> {
        let found = self.repo.existing_permission_ids(ids, &self.guard).await?;
        check.fail_if(!missing_ids(ids, &found).is_empty(), "permissions", "not_found");
        Ok(())
    }

    pub async fn list_roles(&self) -> Result<Vec<RoleResponse>, AppError> {
        let roles = self.repo.list_roles().await?;
        self.with_permissions(roles).await
    }

    pub async fn create_role(&self, payload: &CreateRolePayload) -> Result<RoleResponse, AppError> {
        let mut check = FieldCheck::new();
        check.fail_if(
            self.repo.role_name_taken(&payload.name, &self.guard, None).await?,
            "name",
            "taken",
        );
        if let Some(ids) = &payload.permissions {
            self.check_permission_ids(&mut check, ids).await?;
        }
        check.finish()?;

        // 1. Inicia Transação
        let mut tx = self.pool.begin().await?;

        // 2. Cria o Cargo
        let role = self.repo.create_role(&mut *tx, &payload.name, &self.guard).await?;

        // 3. Salva o Vínculo
        if let Some(ids) = &payload.permissions {
            self.repo.sync_role_permissions(&mut *tx, role.id, ids).await?;
        }

        // 4. Commit
        tx.commit().await?;

        tracing::info!(role_id = role.id, name = %role.name, "cargo criado");
        let mut created = self.with_permissions(vec![role]).await?;
        created.pop().ok_or(AppError::NotFound(Resource::Role))
    }

    pub async fn update_role(&self, id: i64, payload: &UpdateRolePayload) -> Result<RoleResponse, AppError> {
        let mut role = self
            .repo
            .find_role(id)
            .await?
            .ok_or(AppError::NotFound(Resource::Role))?;

        let mut check = FieldCheck::new();
        if let Some(name) = &payload.name {
            check.fail_if(
                self.repo.role_name_taken(name, &role.guard_name, Some(id)).await?,
                "name",
                "taken",
            );
        }
        if let Some(ids) = &payload.permissions {
            self.check_permission_ids(&mut check, ids).await?;
        }
        check.finish()?;

        let mut tx = self.pool.begin().await?;
        if let Some(name) = &payload.name {
            role = self.repo.rename_role(&mut *tx, id, name).await?;
        }
        if let Some(ids) = &payload.permissions {
            self.repo.sync_role_permissions(&mut *tx, id, ids).await?;
        }
        tx.commit().await?;

        let mut updated = self.with_permissions(vec![role]).await?;
        updated.pop().ok_or(AppError::NotFound(Resource::Role))
    }

    pub async fn delete_role(&self, id: i64) -> Result<(), AppError> {
        if self.repo.find_role(id).await?.is_none() {
            return Err(AppError::NotFound(Resource::Role));
        }
        if self.repo.role_has_users(id).await? {
            return Err(AppError::HasDependents("role.has_users"));
        }
        self.repo.delete_role(id).await?;
        tracing::info!(role_id = id, "cargo removido");
        Ok(())
    }

    pub async fn list_permissions(&self) -> Result<Vec<Permission>, AppError> {
        self.repo.list_all_permissions().await
    }

    pub async fn create_permission(&self, payload: &CreatePermissionPayload) -> Result<Permission, AppError> {
        if self.repo.permission_name_taken(&payload.name, &self.guard).await? {
            return Err(AppError::field("name", "taken"));
        }
        self.repo.create_permission(&payload.name, &self.guard).await
    }

    // Sincroniza: o usuário fica exatamente com os cargos informados
    pub async fn assign_roles(&self, payload: &AssignRolesPayload) -> Result<AssignRolesResponse, AppError> {
        let user = self.user_repo.find_by_id(payload.user_id).await?;

        let found = self.repo.existing_role_ids(&payload.roles, &self.guard).await?;
        let mut check = FieldCheck::new();
        check.fail_if(user.is_none(), "user_id", "not_found");
        check.fail_if(!missing_ids(&payload.roles, &found).is_empty(), "roles", "not_found");
        check.finish()?;
        let user = user.ok_or(AppError::NotFound(Resource::User))?;

        let mut tx = self.pool.begin().await?;
        self.repo.sync_user_roles(&mut *tx, user.id, &payload.roles, &self.guard).await?;
        tx.commit().await?;

        let roles = self.repo.role_names_for_user(user.id, &self.guard).await?;
        tracing::info!(user_id = user.id, ?roles, "cargos atribuídos");

        Ok(AssignRolesResponse {
            user: AssignedUser {
                id: user.id,
                name: user.name,
            },
            roles,
        })
    }

    pub async fn users_with_roles(&self, page: PageRequest) -> Result<Paginated<UserWithRoles>, AppError> {
        let (users, total) = self.repo.users_with_roles(page).await?;
        let ids: Vec<i64> = users.iter().map(|u| u.id).collect();
        let rows = self.repo.roles_for_users(&ids).await?;
        let mut by_user: HashMap<i64, Vec<Role>> = group_by(rows, |row| row.user_id);

        let data = users
            .into_iter()
            .map(|user| UserWithRoles {
                roles: by_user.remove(&user.id).unwrap_or_default(),
                user,
            })
            .collect();
        Ok(Paginated::new(data, page, total))
    }
}

#[cfg(test)]
mod tests {
    use sqlx::PgPool;

    use super::*;
    use crate::services::fixtures;

    async fn role_ids_of(pool: &PgPool, user_id: i64) -> Vec<i64> {
        sqlx::query_scalar::<_, i64>("SELECT role_id FROM user_roles WHERE user_id = $1 ORDER BY role_id")
            .bind(user_id)
            .fetch_all(pool)
            .await
            .unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn assigning_roles_replaces_the_previous_set(pool: PgPool) {
        let user = fixtures::user(&pool, "ana@finca.co").await;
        let admin = fixtures::seeded_role(&pool, "admin").await;
        let rrhh = fixtures::seeded_role(&pool, "rrhh").await;
        let visor = fixtures::seeded_role(&pool, "visor").await;
        fixtures::grant(&pool, user, admin).await;
        let service = fixtures::state(pool.clone()).rbac_service;

        let response = service
            .assign_roles(&AssignRolesPayload {
                user_id: user,
                roles: vec![rrhh, visor],
            })
            .await
            .unwrap();
        assert_eq!(response.roles, vec!["rrhh", "visor"]);

        let mut expected = vec![rrhh, visor];
        expected.sort_unstable();
        assert_eq!(role_ids_of(&pool, user).await, expected);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn roles_of_another_guard_survive_assignment(pool: PgPool) {
        let user = fixtures::user(&pool, "ana@finca.co").await;
        let web_role: i64 = sqlx::query_scalar(
            "INSERT INTO roles (name, guard_name) VALUES ('admin', 'web') RETURNING id",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        fixtures::grant(&pool, user, web_role).await;
        let visor = fixtures::seeded_role(&pool, "visor").await;
        let service = fixtures::state(pool.clone()).rbac_service;

        // Cargo de outro guard não é aceito na atribuição
        let error = service
            .assign_roles(&AssignRolesPayload {
                user_id: user,
                roles: vec![web_role],
            })
            .await
            .unwrap_err();
        assert_eq!(fixtures::field_errors(error)["roles"], vec!["not_found"]);

        service
            .assign_roles(&AssignRolesPayload {
                user_id: user,
                roles: vec![visor],
            })
            .await
            .unwrap();
        let mut expected = vec![web_role, visor];
        expected.sort_unstable();
        assert_eq!(role_ids_of(&pool, user).await, expected);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn role_in_use_cannot_be_deleted(pool: PgPool) {
        let user = fixtures::user(&pool, "ana@finca.co").await;
        let gerente = fixtures::seeded_role(&pool, "gerente").await;
        fixtures::grant(&pool, user, gerente).await;
        let service = fixtures::state(pool).rbac_service;

        let error = service.delete_role(gerente).await.unwrap_err();
        assert!(matches!(error, AppError::HasDependents("role.has_users")));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn role_names_are_unique_within_the_guard(pool: PgPool) {
        let service = fixtures::state(pool).rbac_service;

        let error = service
            .create_role(&CreateRolePayload {
                name: "admin".into(),
                permissions: None,
            })
            .await
            .unwrap_err();
        assert_eq!(fixtures::field_errors(error)["name"], vec!["taken"]);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn role_permissions_are_synced_on_update(pool: PgPool) {
        let service = fixtures::state(pool.clone()).rbac_service;
        let permissions = service.list_permissions().await.unwrap();
        let id_of = |name: &str| permissions.iter().find(|p| p.name == name).map(|p| p.id).unwrap();

        let created = service
            .create_role(&CreateRolePayload {
                name: "auditor".into(),
                permissions: Some(vec![id_of("ver fincas"), id_of("ver colores")]),
            })
            .await
            .unwrap();
        assert_eq!(created.permissions.len(), 2);

        let updated = service
            .update_role(
                created.role.id,
                &UpdateRolePayload {
                    name: None,
                    permissions: Some(vec![id_of("ver empleados")]),
                },
            )
            .await
            .unwrap();
        let names: Vec<&str> = updated.permissions.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["ver empleados"]);
    }
}
