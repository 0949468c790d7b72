// src/models/rbac.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::auth::User;

// O que sai do banco (Tabela roles)
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub guard_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// O que sai do banco (Tabela permissions)
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    pub id: i64,
    pub name: String,
    pub guard_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Linha do JOIN role_permissions -> permissions, para carregar em lote
#[derive(Debug, Clone, FromRow)]
pub struct RolePermissionRow {
    pub role_id: i64,
    pub id: i64,
    pub name: String,
    pub guard_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<RolePermissionRow> for Permission {
    fn from(row: RolePermissionRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            guard_name: row.guard_name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// Linha do JOIN user_roles -> roles
#[derive(Debug, Clone, FromRow)]
pub struct UserRoleRow {
    pub user_id: i64,
    pub id: i64,
    pub name: String,
    pub guard_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRoleRow> for Role {
    fn from(row: UserRoleRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            guard_name: row.guard_name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// Resposta completa (Cargo + Lista de Permissões)
#[derive(Debug, Serialize)]
pub struct RoleResponse {
    #[serde(flatten)]
    pub role: Role,
    pub permissions: Vec<Permission>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRolePayload {
    #[validate(length(min = 1, max = 255, message = "length"))]
    pub name: String,

    // IDs das permissões
    pub permissions: Option<Vec<i64>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRolePayload {
    #[validate(length(min = 1, max = 255, message = "length"))]
    pub name: Option<String>,

    // Se presente, substitui o conjunto de permissões
    pub permissions: Option<Vec<i64>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePermissionPayload {
    #[validate(length(min = 1, max = 255, message = "length"))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AssignRolesPayload {
    pub user_id: i64,
    pub roles: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct AssignedUser {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct AssignRolesResponse {
    pub user: AssignedUser,
    pub roles: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct UserWithRoles {
    #[serde(flatten)]
    pub user: User,
    pub roles: Vec<Role>,
}
