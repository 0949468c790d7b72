// src/db/employee_repo.rs

use sqlx::{Executor, PgPool, Postgres, QueryBuilder};

use crate::{
    common::{
        db_utils::{detach_pivot, sync_pivot, value_taken},
        error::{map_unique_violation, AppError},
        query::PageRequest,
    },
    models::employee::{CreateEmployeePayload, Employee, EmployeeFarmRow, EmployeeFilters},
};

const EMPLOYEE_COLUMNS: &str = r#"
    id, as2_employee_id, hr_active, as2_active, first_name, last_name, birth_date,
    contact, disability, disability_percentage, as2_hire_date, as2_exit_date,
    as2_cost_structure, hr_hire_date, hr_exit_date, srv66_id, srv90_id, areas_id,
    biometric_user_type, profile_photo, user_id, contract_type_id, org_structure_id,
    created_at, updated_at
"#;

const EMPLOYEE_KEYS: &[(&str, &'static str)] = &[
    ("employees_as2_employee_id_key", "as2_employee_id"),
    ("employees_user_id_key", "user_id"),
];

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filters: &EmployeeFilters) {
    if let Some(hr_active) = filters.hr_active {
        query.push(" AND hr_active = ").push_bind(hr_active);
    }
    if let Some(as2_active) = filters.as2_active {
        query.push(" AND as2_active = ").push_bind(as2_active);
    }
    if let Some(contract_type_id) = filters.contract_type_id {
        query.push(" AND contract_type_id = ").push_bind(contract_type_id);
    }
    if let Some(org_structure_id) = filters.org_structure_id {
        query.push(" AND org_structure_id = ").push_bind(org_structure_id);
    }
}

#[derive(Clone)]
pub struct EmployeeRepository {
    pool: PgPool,
}

impl EmployeeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        filters: &EmployeeFilters,
        page: PageRequest,
    ) -> Result<(Vec<Employee>, i64), AppError> {
        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM employees WHERE 1 = 1",
            EMPLOYEE_COLUMNS
        ));
        push_filters(&mut query, filters);
        query
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(page.per_page)
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows = query.build_query_as::<Employee>().fetch_all(&self.pool).await?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM employees WHERE 1 = 1");
        push_filters(&mut count, filters);
        let total = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        Ok((rows, total))
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Employee>, AppError> {
        let employee = sqlx::query_as::<_, Employee>(&format!(
            "SELECT {} FROM employees WHERE id = $1",
            EMPLOYEE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(employee)
    }

    pub async fn as2_id_taken(&self, as2_employee_id: &str, except_id: Option<i64>) -> Result<bool, AppError> {
        value_taken(&self.pool, "employees", "as2_employee_id", as2_employee_id, except_id).await
    }

    // Um usuário só pode estar ligado a um empregado
    pub async fn user_linked(&self, user_id: i64, except_id: Option<i64>) -> Result<bool, AppError> {
        let linked = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM employees WHERE user_id = $1 AND ($2::BIGINT IS NULL OR id <> $2))",
        )
        .bind(user_id)
        .bind(except_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(linked)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        payload: &CreateEmployeePayload,
    ) -> Result<Employee, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let employee = sqlx::query_as::<_, Employee>(&format!(
            r#"
            INSERT INTO employees (
                as2_employee_id, hr_active, as2_active, first_name, last_name, birth_date,
                contact, disability, disability_percentage, as2_hire_date, as2_exit_date,
                as2_cost_structure, hr_hire_date, hr_exit_date, srv66_id, srv90_id, areas_id,
                biometric_user_type, profile_photo, user_id, contract_type_id, org_structure_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
                    $18, $19, $20, $21, $22)
            RETURNING {}
            "#,
            EMPLOYEE_COLUMNS
        ))
        .bind(&payload.as2_employee_id)
        .bind(payload.hr_active.unwrap_or(true))
        .bind(payload.as2_active.unwrap_or(true))
        .bind(&payload.first_name)
        .bind(&payload.last_name)
        .bind(payload.birth_date)
        .bind(&payload.contact)
        .bind(&payload.disability)
        .bind(payload.disability_percentage)
        .bind(payload.as2_hire_date)
        .bind(payload.as2_exit_date)
        .bind(&payload.as2_cost_structure)
        .bind(payload.hr_hire_date)
        .bind(payload.hr_exit_date)
        .bind(&payload.srv66_id)
        .bind(&payload.srv90_id)
        .bind(&payload.areas_id)
        .bind(&payload.biometric_user_type)
        .bind(&payload.profile_photo)
        .bind(payload.user_id)
        .bind(payload.contract_type_id)
        .bind(payload.org_structure_id)
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_violation(e, EMPLOYEE_KEYS))?;

        Ok(employee)
    }

    // Grava a linha inteira já mesclada
    pub async fn update<'e, E>(&self, executor: E, e: &Employee) -> Result<Employee, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let employee = sqlx::query_as::<_, Employee>(&format!(
            r#"
            UPDATE employees SET
                as2_employee_id = $2, hr_active = $3, as2_active = $4, first_name = $5,
                last_name = $6, birth_date = $7, contact = $8, disability = $9,
                disability_percentage = $10, as2_hire_date = $11, as2_exit_date = $12,
                as2_cost_structure = $13, hr_hire_date = $14, hr_exit_date = $15,
                srv66_id = $16, srv90_id = $17, areas_id = $18, biometric_user_type = $19,
                profile_photo = $20, user_id = $21, contract_type_id = $22,
                org_structure_id = $23, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            EMPLOYEE_COLUMNS
        ))
        .bind(e.id)
        .bind(&e.as2_employee_id)
        .bind(e.hr_active)
        .bind(e.as2_active)
        .bind(&e.first_name)
        .bind(&e.last_name)
        .bind(e.birth_date)
        .bind(&e.contact)
        .bind(&e.disability)
        .bind(e.disability_percentage)
        .bind(e.as2_hire_date)
        .bind(e.as2_exit_date)
        .bind(&e.as2_cost_structure)
        .bind(e.hr_hire_date)
        .bind(e.hr_exit_date)
        .bind(&e.srv66_id)
        .bind(&e.srv90_id)
        .bind(&e.areas_id)
        .bind(&e.biometric_user_type)
        .bind(&e.profile_photo)
        .bind(e.user_id)
        .bind(e.contract_type_id)
        .bind(e.org_structure_id)
        .fetch_one(executor)
        .await
        .map_err(|err| map_unique_violation(err, EMPLOYEE_KEYS))?;

        Ok(employee)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: i64) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM employees WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    // ---
    // Empregado <-> Finca
    // ---

    pub async fn sync_farms<'e, E>(&self, executor: E, employee_id: i64, farm_ids: &[i64]) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sync_pivot(executor, "employee_farms", "employee_id", "farm_id", employee_id, farm_ids).await
    }

    pub async fn detach_farms<'e, E>(&self, executor: E, employee_id: i64) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        detach_pivot(executor, "employee_farms", "employee_id", employee_id).await
    }

    pub async fn farms_for(&self, employee_ids: &[i64]) -> Result<Vec<EmployeeFarmRow>, AppError> {
        if employee_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, EmployeeFarmRow>(
            r#"
            SELECT ef.employee_id, f.id, f.name, f.active, f.created_at, f.updated_at
            FROM employee_farms ef
            JOIN farms f ON f.id = ef.farm_id
            WHERE ef.employee_id = ANY($1)
            ORDER BY f.name
            "#,
        )
        .bind(employee_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
