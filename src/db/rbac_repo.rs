// src/db/rbac_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::common::db_utils::sync_pivot;
use crate::common::error::{map_unique_violation, AppError};
use crate::common::query::PageRequest;
use crate::models::auth::User;
use crate::models::rbac::{Permission, Role, RolePermissionRow, UserRoleRow};

const ROLE_KEYS: &[(&str, &'static str)] = &[("roles_name_guard_key", "name")];
const PERMISSION_KEYS: &[(&str, &'static str)] = &[("permissions_name_guard_key", "name")];

#[derive(Clone)]
pub struct RbacRepository {
    pool: PgPool,
}

impl RbacRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Cargos
    // ---

    pub async fn list_roles(&self) -> Result<Vec<Role>, AppError> {
        let roles = sqlx::query_as::<_, Role>(
            "SELECT id, name, guard_name, created_at, updated_at FROM roles ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(roles)
    }

    pub async fn find_role(&self, id: i64) -> Result<Option<Role>, AppError> {
        let role = sqlx::query_as::<_, Role>(
            "SELECT id, name, guard_name, created_at, updated_at FROM roles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(role)
    }

    pub async fn role_name_taken(
        &self,
        name: &str,
        guard: &str,
        except_id: Option<i64>,
    ) -> Result<bool, AppError> {
        let taken = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM roles
                WHERE name = $1 AND guard_name = $2 AND ($3::BIGINT IS NULL OR id <> $3)
            )
            "#,
        )
        .bind(name)
        .bind(guard)
        .bind(except_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    // 1. Criar o Cargo
    pub async fn create_role<'e, E>(&self, executor: E, name: &str, guard: &str) -> Result<Role, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let role = sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO roles (name, guard_name)
            VALUES ($1, $2)
            RETURNING id, name, guard_name, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(guard)
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_violation(e, ROLE_KEYS))?;

        Ok(role)
    }

    pub async fn rename_role<'e, E>(&self, executor: E, id: i64, name: &str) -> Result<Role, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let role = sqlx::query_as::<_, Role>(
            r#"
            UPDATE roles SET name = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, guard_name, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(name)
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_violation(e, ROLE_KEYS))?;

        Ok(role)
    }

    pub async fn delete_role(&self, id: i64) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn role_has_users(&self, role_id: i64) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM user_roles WHERE role_id = $1)",
        )
        .bind(role_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    // Quais dos IDs informados existem de fato (mesma guarda)
    pub async fn existing_role_ids(&self, ids: &[i64], guard: &str) -> Result<Vec<i64>, AppError> {
        let found = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM roles WHERE id = ANY($1) AND guard_name = $2",
        )
        .bind(ids)
        .bind(guard)
        .fetch_all(&self.pool)
        .await?;
        Ok(found)
    }

    // ---
    // Permissões
    // ---

    pub async fn list_all_permissions(&self) -> Result<Vec<Permission>, AppError> {
        let permissions = sqlx::query_as::<_, Permission>(
            "SELECT id, name, guard_name, created_at, updated_at FROM permissions ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(permissions)
    }

    pub async fn permission_name_taken(&self, name: &str, guard: &str) -> Result<bool, AppError> {
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM permissions WHERE name = $1 AND guard_name = $2)",
        )
        .bind(name)
        .bind(guard)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    pub async fn create_permission(&self, name: &str, guard: &str) -> Result<Permission, AppError> {
        let permission = sqlx::query_as::<_, Permission>(
            r#"
            INSERT INTO permissions (name, guard_name)
            VALUES ($1, $2)
            RETURNING id, name, guard_name, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(guard)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, PERMISSION_KEYS))?;
        Ok(permission)
    }

    pub async fn existing_permission_ids(
        &self,
        ids: &[i64],
        guard: &str,
    ) -> Result<Vec<i64>, AppError> {
        let found = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM permissions WHERE id = ANY($1) AND guard_name = $2",
        )
        .bind(ids)
        .bind(guard)
        .fetch_all(&self.pool)
        .await?;
        Ok(found)
    }

    // Substitui o conjunto de permissões do cargo
    pub async fn sync_role_permissions<'e, E>(
        &self,
        executor: E,
        role_id: i64,
        permission_ids: &[i64],
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sync_pivot(executor, "role_permissions", "role_id", "permission_id", role_id, permission_ids).await
    }

    // Carrega as permissões de vários cargos de uma vez
    pub async fn permissions_for_roles(&self, role_ids: &[i64]) -> Result<Vec<RolePermissionRow>, AppError> {
        if role_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, RolePermissionRow>(
            r#"
            SELECT rp.role_id, p.id, p.name, p.guard_name, p.created_at, p.updated_at
            FROM role_permissions rp
            JOIN permissions p ON p.id = rp.permission_id
            WHERE rp.role_id = ANY($1)
            ORDER BY p.name
            "#,
        )
        .bind(role_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // ---
    // Usuário <-> Cargo
    // ---

    // Substitui só os cargos do guard informado; cargos de outros guards ficam intactos
    pub async fn sync_user_roles<'e, E>(
        &self,
        executor: E,
        user_id: i64,
        role_ids: &[i64],
        guard: &str,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            WITH removed AS (
                DELETE FROM user_roles ur
                USING roles r
                WHERE r.id = ur.role_id
                  AND ur.user_id = $1
                  AND r.guard_name = $3
                  AND ur.role_id <> ALL($2::BIGINT[])
            )
            INSERT INTO user_roles (user_id, role_id)
            SELECT $1, unnest($2::BIGINT[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(role_ids)
        .bind(guard)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn roles_for_users(&self, user_ids: &[i64]) -> Result<Vec<UserRoleRow>, AppError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, UserRoleRow>(
            r#"
            SELECT ur.user_id, r.id, r.name, r.guard_name, r.created_at, r.updated_at
            FROM user_roles ur
            JOIN roles r ON r.id = ur.role_id
            WHERE ur.user_id = ANY($1)
            ORDER BY r.name
            "#,
        )
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // Usuários que têm ao menos um cargo
    pub async fn users_with_roles(
        &self,
        page: PageRequest,
    ) -> Result<(Vec<User>, i64), AppError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.name, u.email, u.password_hash, u.created_at, u.updated_at
            FROM users u
            WHERE EXISTS (SELECT 1 FROM user_roles ur WHERE ur.user_id = u.id)
            ORDER BY u.name, u.id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(page.per_page)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(DISTINCT user_id) FROM user_roles")
            .fetch_one(&self.pool)
            .await?;

        Ok((users, total))
    }

    pub async fn role_names_for_user(&self, user_id: i64, guard: &str) -> Result<Vec<String>, AppError> {
        let names = sqlx::query_scalar::<_, String>(
            r#"
            SELECT r.name
            FROM user_roles ur
            JOIN roles r ON r.id = ur.role_id
            WHERE ur.user_id = $1 AND r.guard_name = $2
            ORDER BY r.name
            "#,
        )
        .bind(user_id)
        .bind(guard)
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }

    pub async fn permission_names_for_user(
        &self,
        user_id: i64,
        guard: &str,
    ) -> Result<Vec<String>, AppError> {
        let names = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT p.name
            FROM user_roles ur
            JOIN roles r ON r.id = ur.role_id AND r.guard_name = $2
            JOIN role_permissions rp ON rp.role_id = r.id
            JOIN permissions p ON p.id = rp.permission_id AND p.guard_name = $2
            WHERE ur.user_id = $1
            ORDER BY p.name
            "#,
        )
        .bind(user_id)
        .bind(guard)
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }

    // Usado pelo extrator RequirePermission a cada requisição protegida
    pub async fn user_has_permission(
        &self,
        user_id: i64,
        permission_name: &str,
        guard: &str,
    ) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM user_roles ur
                JOIN roles r ON ur.role_id = r.id
                JOIN role_permissions rp ON r.id = rp.role_id
                JOIN permissions p ON rp.permission_id = p.id
                WHERE ur.user_id = $1
                  AND p.name = $2
                  AND r.guard_name = $3
                  AND p.guard_name = $3
            )
            "#,
        )
        .bind(user_id)
        .bind(permission_name)
        .bind(guard)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}
