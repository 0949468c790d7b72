// src/db/organization_repo.rs

use sqlx::{Executor, PgPool, Postgres, QueryBuilder};

use crate::{
    common::{
        db_utils::{detach_pivot, existing_ids, is_referenced, row_exists, sync_pivot, value_taken},
        error::{map_unique_violation, AppError},
        query::PageRequest,
    },
    models::{
        catalog::Color,
        organization::{
            AccessDepartmentRow, Department, DepartmentFilters, OrgStructure, OrgStructureFilters,
        },
    },
};

const DEPARTMENT_COLUMNS: &str = "id, name, color_id, active, created_at, updated_at";
const ORG_STRUCTURE_COLUMNS: &str = "id, position, department_id, active, created_at, updated_at";

const DEPARTMENT_KEYS: &[(&str, &'static str)] = &[("departments_name_key", "name")];

fn push_department_filters(query: &mut QueryBuilder<'_, Postgres>, filters: &DepartmentFilters) {
    if let Some(active) = filters.active {
        query.push(" AND active = ").push_bind(active);
    }
}

fn push_org_structure_filters(query: &mut QueryBuilder<'_, Postgres>, filters: &OrgStructureFilters) {
    if let Some(active) = filters.active {
        query.push(" AND active = ").push_bind(active);
    }
    if let Some(department_id) = filters.department_id {
        query.push(" AND department_id = ").push_bind(department_id);
    }
}

// Departamentos, cargos e a tabela de acesso entre eles
#[derive(Clone)]
pub struct OrganizationRepository {
    pool: PgPool,
}

impl OrganizationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Departamentos
    // ---

    pub async fn list_departments(
        &self,
        filters: &DepartmentFilters,
        page: PageRequest,
    ) -> Result<(Vec<Department>, i64), AppError> {
        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM departments WHERE 1 = 1",
            DEPARTMENT_COLUMNS
        ));
        push_department_filters(&mut query, filters);
        query
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(page.per_page)
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows = query.build_query_as::<Department>().fetch_all(&self.pool).await?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM departments WHERE 1 = 1");
        push_department_filters(&mut count, filters);
        let total = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        Ok((rows, total))
    }

    pub async fn find_department(&self, id: i64) -> Result<Option<Department>, AppError> {
        let department = sqlx::query_as::<_, Department>(&format!(
            "SELECT {} FROM departments WHERE id = $1",
            DEPARTMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(department)
    }

    pub async fn find_departments(&self, ids: &[i64]) -> Result<Vec<Department>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let departments = sqlx::query_as::<_, Department>(&format!(
            "SELECT {} FROM departments WHERE id = ANY($1)",
            DEPARTMENT_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(departments)
    }

    pub async fn department_exists(&self, id: i64) -> Result<bool, AppError> {
        row_exists(&self.pool, "departments", id).await
    }

    pub async fn existing_department_ids(&self, ids: &[i64]) -> Result<Vec<i64>, AppError> {
        existing_ids(&self.pool, "departments", ids).await
    }

    pub async fn department_name_taken(&self, name: &str, except_id: Option<i64>) -> Result<bool, AppError> {
        value_taken(&self.pool, "departments", "name", name, except_id).await
    }

    pub async fn create_department(
        &self,
        name: &str,
        color_id: Option<i64>,
        active: bool,
    ) -> Result<Department, AppError> {
        let department = sqlx::query_as::<_, Department>(&format!(
            "INSERT INTO departments (name, color_id, active) VALUES ($1, $2, $3) RETURNING {}",
            DEPARTMENT_COLUMNS
        ))
        .bind(name)
        .bind(color_id)
        .bind(active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, DEPARTMENT_KEYS))?;
        Ok(department)
    }

    pub async fn update_department(&self, department: &Department) -> Result<Department, AppError> {
        let updated = sqlx::query_as::<_, Department>(&format!(
            r#"
            UPDATE departments SET name = $2, color_id = $3, active = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            DEPARTMENT_COLUMNS
        ))
        .bind(department.id)
        .bind(&department.name)
        .bind(department.color_id)
        .bind(department.active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, DEPARTMENT_KEYS))?;
        Ok(updated)
    }

    pub async fn delete_department(&self, id: i64) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM departments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn department_has_structures(&self, id: i64) -> Result<bool, AppError> {
        is_referenced(&self.pool, "org_structures", "department_id", id).await
    }

    // ---
    // Estrutura organizacional
    // ---

    pub async fn list_org_structures(
        &self,
        filters: &OrgStructureFilters,
        page: PageRequest,
    ) -> Result<(Vec<OrgStructure>, i64), AppError> {
        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM org_structures WHERE 1 = 1",
            ORG_STRUCTURE_COLUMNS
        ));
        push_org_structure_filters(&mut query, filters);
        query
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(page.per_page)
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows = query.build_query_as::<OrgStructure>().fetch_all(&self.pool).await?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM org_structures WHERE 1 = 1");
        push_org_structure_filters(&mut count, filters);
        let total = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        Ok((rows, total))
    }

    pub async fn find_org_structure(&self, id: i64) -> Result<Option<OrgStructure>, AppError> {
        let org_structure = sqlx::query_as::<_, OrgStructure>(&format!(
            "SELECT {} FROM org_structures WHERE id = $1",
            ORG_STRUCTURE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(org_structure)
    }

    pub async fn find_org_structures(&self, ids: &[i64]) -> Result<Vec<OrgStructure>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, OrgStructure>(&format!(
            "SELECT {} FROM org_structures WHERE id = ANY($1)",
            ORG_STRUCTURE_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // Cargos de vários departamentos de uma vez (?with_structures=1)
    pub async fn org_structures_for_departments(
        &self,
        department_ids: &[i64],
    ) -> Result<Vec<OrgStructure>, AppError> {
        if department_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, OrgStructure>(&format!(
            "SELECT {} FROM org_structures WHERE department_id = ANY($1) ORDER BY position",
            ORG_STRUCTURE_COLUMNS
        ))
        .bind(department_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn org_structure_exists(&self, id: i64) -> Result<bool, AppError> {
        row_exists(&self.pool, "org_structures", id).await
    }

    pub async fn create_org_structure<'e, E>(
        &self,
        executor: E,
        position: &str,
        department_id: i64,
        active: bool,
    ) -> Result<OrgStructure, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let org_structure = sqlx::query_as::<_, OrgStructure>(&format!(
            "INSERT INTO org_structures (position, department_id, active) VALUES ($1, $2, $3) RETURNING {}",
            ORG_STRUCTURE_COLUMNS
        ))
        .bind(position)
        .bind(department_id)
        .bind(active)
        .fetch_one(executor)
        .await?;
        Ok(org_structure)
    }

    pub async fn update_org_structure<'e, E>(
        &self,
        executor: E,
        org_structure: &OrgStructure,
    ) -> Result<OrgStructure, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let updated = sqlx::query_as::<_, OrgStructure>(&format!(
            r#"
            UPDATE org_structures SET position = $2, department_id = $3, active = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            ORG_STRUCTURE_COLUMNS
        ))
        .bind(org_structure.id)
        .bind(&org_structure.position)
        .bind(org_structure.department_id)
        .bind(org_structure.active)
        .fetch_one(executor)
        .await?;
        Ok(updated)
    }

    pub async fn delete_org_structure<'e, E>(&self, executor: E, id: i64) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM org_structures WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn org_structure_has_employees(&self, id: i64) -> Result<bool, AppError> {
        is_referenced(&self.pool, "employees", "org_structure_id", id).await
    }

    // ---
    // Acesso cargo -> departamentos
    // ---

    pub async fn sync_access<'e, E>(
        &self,
        executor: E,
        org_structure_id: i64,
        department_ids: &[i64],
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sync_pivot(
            executor,
            "org_structure_access",
            "org_structure_id",
            "department_id",
            org_structure_id,
            department_ids,
        )
        .await
    }

    pub async fn detach_access<'e, E>(&self, executor: E, org_structure_id: i64) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        detach_pivot(executor, "org_structure_access", "org_structure_id", org_structure_id).await
    }

    pub async fn access_departments_for(
        &self,
        org_structure_ids: &[i64],
    ) -> Result<Vec<AccessDepartmentRow>, AppError> {
        if org_structure_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, AccessDepartmentRow>(
            r#"
            SELECT a.org_structure_id, d.id, d.name, d.color_id, d.active, d.created_at, d.updated_at
            FROM org_structure_access a
            JOIN departments d ON d.id = a.department_id
            WHERE a.org_structure_id = ANY($1)
            ORDER BY d.name
            "#,
        )
        .bind(org_structure_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // Cores ativas (sem repetição) dos departamentos que o cargo acessa
    pub async fn badge_colors(&self, org_structure_id: i64) -> Result<Vec<Color>, AppError> {
        let colors = sqlx::query_as::<_, Color>(
            r#"
            SELECT DISTINCT c.id, c.name, c.code, c.active, c.created_at, c.updated_at
            FROM org_structure_access a
            JOIN departments d ON d.id = a.department_id
            JOIN colors c ON c.id = d.color_id
            WHERE a.org_structure_id = $1 AND c.active = TRUE
            ORDER BY c.name
            "#,
        )
        .bind(org_structure_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(colors)
    }
}
