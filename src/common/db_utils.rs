// src/common/db_utils.rs
// Consultas repetidas entre os repositórios. Nomes de tabela/coluna vêm
// sempre de constantes do código, nunca da requisição.

use sqlx::{Executor, PgPool, Postgres};

use crate::common::error::AppError;

pub(crate) async fn row_exists(pool: &PgPool, table: &str, id: i64) -> Result<bool, AppError> {
    let exists = sqlx::query_scalar::<_, bool>(&format!(
        "SELECT EXISTS (SELECT 1 FROM {} WHERE id = $1)",
        table
    ))
    .bind(id)
    .fetch_one(pool)
    .await?;
    Ok(exists)
}

// Unicidade checada antes do INSERT/UPDATE. `except_id` ignora o próprio registro.
pub(crate) async fn value_taken(
    pool: &PgPool,
    table: &str,
    column: &str,
    value: &str,
    except_id: Option<i64>,
) -> Result<bool, AppError> {
    let taken = sqlx::query_scalar::<_, bool>(&format!(
        r#"SELECT EXISTS (SELECT 1 FROM {} WHERE "{}" = $1 AND ($2::BIGINT IS NULL OR id <> $2))"#,
        table, column
    ))
    .bind(value)
    .bind(except_id)
    .fetch_one(pool)
    .await?;
    Ok(taken)
}

// Existe alguma linha em `table` apontando para `id` via `column`?
pub(crate) async fn is_referenced(
    pool: &PgPool,
    table: &str,
    column: &str,
    id: i64,
) -> Result<bool, AppError> {
    let exists = sqlx::query_scalar::<_, bool>(&format!(
        "SELECT EXISTS (SELECT 1 FROM {} WHERE {} = $1)",
        table, column
    ))
    .bind(id)
    .fetch_one(pool)
    .await?;
    Ok(exists)
}

pub(crate) async fn existing_ids(pool: &PgPool, table: &str, ids: &[i64]) -> Result<Vec<i64>, AppError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let found = sqlx::query_scalar::<_, i64>(&format!(
        "SELECT id FROM {} WHERE id = ANY($1)",
        table
    ))
    .bind(ids)
    .fetch_all(pool)
    .await?;
    Ok(found)
}

// IDs pedidos que não vieram do banco
pub(crate) fn missing_ids(requested: &[i64], found: &[i64]) -> Vec<i64> {
    let mut missing: Vec<i64> = requested
        .iter()
        .copied()
        .filter(|id| !found.contains(id))
        .collect();
    missing.sort_unstable();
    missing.dedup();
    missing
}

// Substitui o conjunto de vínculos de `owner_id` numa tabela pivô
pub(crate) async fn sync_pivot<'e, E>(
    executor: E,
    table: &str,
    owner_column: &str,
    target_column: &str,
    owner_id: i64,
    target_ids: &[i64],
) -> Result<(), AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(&format!(
        r#"
        WITH removed AS (
            DELETE FROM {table}
            WHERE {owner} = $1 AND {target} <> ALL($2::BIGINT[])
        )
        INSERT INTO {table} ({owner}, {target})
        SELECT $1, unnest($2::BIGINT[])
        ON CONFLICT DO NOTHING
        "#,
        table = table,
        owner = owner_column,
        target = target_column,
    ))
    .bind(owner_id)
    .bind(target_ids)
    .execute(executor)
    .await?;

    Ok(())
}

// Remove todos os vínculos de `owner_id` (antes de apagar o dono)
pub(crate) async fn detach_pivot<'e, E>(
    executor: E,
    table: &str,
    owner_column: &str,
    owner_id: i64,
) -> Result<u64, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(&format!("DELETE FROM {} WHERE {} = $1", table, owner_column))
        .bind(owner_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}
