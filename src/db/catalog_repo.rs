// src/db/catalog_repo.rs

use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    common::{
        db_utils::{existing_ids, is_referenced, row_exists, value_taken},
        error::{map_unique_violation, AppError},
        query::PageRequest,
    },
    models::catalog::{
        ActiveFilter, Color, ContractType, CostCenter, CostCenterFilters, Farm,
    },
};

const COLOR_COLUMNS: &str = "id, name, code, active, created_at, updated_at";
const FARM_COLUMNS: &str = "id, name, active, created_at, updated_at";
const CONTRACT_TYPE_COLUMNS: &str = "id, name, active, created_at, updated_at";
const COST_CENTER_COLUMNS: &str =
    r#"id, name, active, "group", contract_type_id, created_at, updated_at"#;

const COLOR_KEYS: &[(&str, &'static str)] = &[("colors_name_key", "name"), ("colors_code_key", "code")];
const FARM_KEYS: &[(&str, &'static str)] = &[("farms_name_key", "name")];
const CONTRACT_TYPE_KEYS: &[(&str, &'static str)] = &[("contract_types_name_key", "name")];
const COST_CENTER_KEYS: &[(&str, &'static str)] = &[("cost_centers_name_key", "name")];

// Filtro `active` comum às listagens
fn push_active(query: &mut QueryBuilder<'_, Postgres>, active: Option<bool>) {
    if let Some(active) = active {
        query.push(" AND active = ").push_bind(active);
    }
}

fn push_cost_center_filters<'a>(query: &mut QueryBuilder<'a, Postgres>, filters: &'a CostCenterFilters) {
    push_active(query, filters.active);
    if let Some(group) = &filters.group {
        query.push(r#" AND "group" = "#).push_bind(group);
    }
}

// Cadastros simples: colors, farms, contract_types e cost_centers
#[derive(Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Listagem paginada de uma tabela simples, filtrando só por `active`
    async fn list_simple<T>(
        &self,
        table: &str,
        columns: &str,
        active: Option<bool>,
        page: PageRequest,
    ) -> Result<(Vec<T>, i64), AppError>
    where
        T: for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
    {
        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM {} WHERE 1 = 1", columns, table));
        push_active(&mut query, active);
        query
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(page.per_page)
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows = query.build_query_as::<T>().fetch_all(&self.pool).await?;

        let mut count = QueryBuilder::<Postgres>::new(format!("SELECT COUNT(*) FROM {} WHERE 1 = 1", table));
        push_active(&mut count, active);
        let total = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        Ok((rows, total))
    }

    // ---
    // Cores
    // ---

    pub async fn list_colors(&self, filters: &ActiveFilter, page: PageRequest) -> Result<(Vec<Color>, i64), AppError> {
        self.list_simple("colors", COLOR_COLUMNS, filters.active, page).await
    }

    pub async fn find_color(&self, id: i64) -> Result<Option<Color>, AppError> {
        let color = sqlx::query_as::<_, Color>(&format!("SELECT {} FROM colors WHERE id = $1", COLOR_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(color)
    }

    pub async fn find_colors(&self, ids: &[i64]) -> Result<Vec<Color>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let colors = sqlx::query_as::<_, Color>(&format!(
            "SELECT {} FROM colors WHERE id = ANY($1)",
            COLOR_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(colors)
    }

    pub async fn color_exists(&self, id: i64) -> Result<bool, AppError> {
        row_exists(&self.pool, "colors", id).await
    }

    pub async fn color_name_taken(&self, name: &str, except_id: Option<i64>) -> Result<bool, AppError> {
        value_taken(&self.pool, "colors", "name", name, except_id).await
    }

    pub async fn color_code_taken(&self, code: &str, except_id: Option<i64>) -> Result<bool, AppError> {
        value_taken(&self.pool, "colors", "code", code, except_id).await
    }

    pub async fn create_color(&self, name: &str, code: &str, active: bool) -> Result<Color, AppError> {
        let color = sqlx::query_as::<_, Color>(&format!(
            "INSERT INTO colors (name, code, active) VALUES ($1, $2, $3) RETURNING {}",
            COLOR_COLUMNS
        ))
        .bind(name)
        .bind(code)
        .bind(active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, COLOR_KEYS))?;
        Ok(color)
    }

    pub async fn update_color(&self, color: &Color) -> Result<Color, AppError> {
        let updated = sqlx::query_as::<_, Color>(&format!(
            r#"
            UPDATE colors SET name = $2, code = $3, active = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            COLOR_COLUMNS
        ))
        .bind(color.id)
        .bind(&color.name)
        .bind(&color.code)
        .bind(color.active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, COLOR_KEYS))?;
        Ok(updated)
    }

    pub async fn delete_color(&self, id: i64) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM colors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn color_in_use(&self, id: i64) -> Result<bool, AppError> {
        is_referenced(&self.pool, "departments", "color_id", id).await
    }

    // ---
    // Fincas
    // ---

    pub async fn list_farms(&self, filters: &ActiveFilter, page: PageRequest) -> Result<(Vec<Farm>, i64), AppError> {
        self.list_simple("farms", FARM_COLUMNS, filters.active, page).await
    }

    pub async fn find_farm(&self, id: i64) -> Result<Option<Farm>, AppError> {
        let farm = sqlx::query_as::<_, Farm>(&format!("SELECT {} FROM farms WHERE id = $1", FARM_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(farm)
    }

    pub async fn existing_farm_ids(&self, ids: &[i64]) -> Result<Vec<i64>, AppError> {
        existing_ids(&self.pool, "farms", ids).await
    }

    pub async fn farm_name_taken(&self, name: &str, except_id: Option<i64>) -> Result<bool, AppError> {
        value_taken(&self.pool, "farms", "name", name, except_id).await
    }

    pub async fn create_farm(&self, name: &str, active: bool) -> Result<Farm, AppError> {
        let farm = sqlx::query_as::<_, Farm>(&format!(
            "INSERT INTO farms (name, active) VALUES ($1, $2) RETURNING {}",
            FARM_COLUMNS
        ))
        .bind(name)
        .bind(active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, FARM_KEYS))?;
        Ok(farm)
    }

    pub async fn update_farm(&self, farm: &Farm) -> Result<Farm, AppError> {
        let updated = sqlx::query_as::<_, Farm>(&format!(
            "UPDATE farms SET name = $2, active = $3, updated_at = NOW() WHERE id = $1 RETURNING {}",
            FARM_COLUMNS
        ))
        .bind(farm.id)
        .bind(&farm.name)
        .bind(farm.active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, FARM_KEYS))?;
        Ok(updated)
    }

    pub async fn delete_farm(&self, id: i64) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM farms WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn farm_has_employees(&self, id: i64) -> Result<bool, AppError> {
        is_referenced(&self.pool, "employee_farms", "farm_id", id).await
    }

    // ---
    // Tipos de contrato
    // ---

    pub async fn list_contract_types(
        &self,
        filters: &ActiveFilter,
        page: PageRequest,
    ) -> Result<(Vec<ContractType>, i64), AppError> {
        self.list_simple("contract_types", CONTRACT_TYPE_COLUMNS, filters.active, page).await
    }

    pub async fn find_contract_type(&self, id: i64) -> Result<Option<ContractType>, AppError> {
        let contract_type = sqlx::query_as::<_, ContractType>(&format!(
            "SELECT {} FROM contract_types WHERE id = $1",
            CONTRACT_TYPE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(contract_type)
    }

    pub async fn find_contract_types(&self, ids: &[i64]) -> Result<Vec<ContractType>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let contract_types = sqlx::query_as::<_, ContractType>(&format!(
            "SELECT {} FROM contract_types WHERE id = ANY($1)",
            CONTRACT_TYPE_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(contract_types)
    }

    pub async fn contract_type_exists(&self, id: i64) -> Result<bool, AppError> {
        row_exists(&self.pool, "contract_types", id).await
    }

    pub async fn contract_type_name_taken(&self, name: &str, except_id: Option<i64>) -> Result<bool, AppError> {
        value_taken(&self.pool, "contract_types", "name", name, except_id).await
    }

    pub async fn create_contract_type(&self, name: &str, active: bool) -> Result<ContractType, AppError> {
        let contract_type = sqlx::query_as::<_, ContractType>(&format!(
            "INSERT INTO contract_types (name, active) VALUES ($1, $2) RETURNING {}",
            CONTRACT_TYPE_COLUMNS
        ))
        .bind(name)
        .bind(active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, CONTRACT_TYPE_KEYS))?;
        Ok(contract_type)
    }

    pub async fn update_contract_type(&self, contract_type: &ContractType) -> Result<ContractType, AppError> {
        let updated = sqlx::query_as::<_, ContractType>(&format!(
            "UPDATE contract_types SET name = $2, active = $3, updated_at = NOW() WHERE id = $1 RETURNING {}",
            CONTRACT_TYPE_COLUMNS
        ))
        .bind(contract_type.id)
        .bind(&contract_type.name)
        .bind(contract_type.active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, CONTRACT_TYPE_KEYS))?;
        Ok(updated)
    }

    pub async fn delete_contract_type(&self, id: i64) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM contract_types WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    // Empregados ou centros de custo apontando para o tipo
    pub async fn contract_type_in_use(&self, id: i64) -> Result<bool, AppError> {
        if is_referenced(&self.pool, "employees", "contract_type_id", id).await? {
            return Ok(true);
        }
        is_referenced(&self.pool, "cost_centers", "contract_type_id", id).await
    }

    // ---
    // Centros de custo (ordenados por nome)
    // ---

    pub async fn list_cost_centers(
        &self,
        filters: &CostCenterFilters,
        page: PageRequest,
    ) -> Result<(Vec<CostCenter>, i64), AppError> {
        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM cost_centers WHERE 1 = 1",
            COST_CENTER_COLUMNS
        ));
        push_cost_center_filters(&mut query, filters);
        query
            .push(" ORDER BY name ASC LIMIT ")
            .push_bind(page.per_page)
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows = query.build_query_as::<CostCenter>().fetch_all(&self.pool).await?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM cost_centers WHERE 1 = 1");
        push_cost_center_filters(&mut count, filters);
        let total = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        Ok((rows, total))
    }

    pub async fn find_cost_center(&self, id: i64) -> Result<Option<CostCenter>, AppError> {
        let cost_center = sqlx::query_as::<_, CostCenter>(&format!(
            "SELECT {} FROM cost_centers WHERE id = $1",
            COST_CENTER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(cost_center)
    }

    pub async fn cost_center_name_taken(&self, name: &str, except_id: Option<i64>) -> Result<bool, AppError> {
        value_taken(&self.pool, "cost_centers", "name", name, except_id).await
    }

    pub async fn create_cost_center(
        &self,
        name: &str,
        active: bool,
        group: Option<&str>,
        contract_type_id: i64,
    ) -> Result<CostCenter, AppError> {
        let cost_center = sqlx::query_as::<_, CostCenter>(&format!(
            r#"
            INSERT INTO cost_centers (name, active, "group", contract_type_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            COST_CENTER_COLUMNS
        ))
        .bind(name)
        .bind(active)
        .bind(group)
        .bind(contract_type_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, COST_CENTER_KEYS))?;
        Ok(cost_center)
    }

    pub async fn update_cost_center(&self, cost_center: &CostCenter) -> Result<CostCenter, AppError> {
        let updated = sqlx::query_as::<_, CostCenter>(&format!(
            r#"
            UPDATE cost_centers
            SET name = $2, active = $3, "group" = $4, contract_type_id = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            COST_CENTER_COLUMNS
        ))
        .bind(cost_center.id)
        .bind(&cost_center.name)
        .bind(cost_center.active)
        .bind(&cost_center.group)
        .bind(cost_center.contract_type_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, COST_CENTER_KEYS))?;
        Ok(updated)
    }

    pub async fn delete_cost_center(&self, id: i64) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM cost_centers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
