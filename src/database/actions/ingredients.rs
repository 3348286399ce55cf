use crate::{
    authentication::{jwt::RequestContext, permissions::ActionType},
    constants::INGREDIENT_COUNT_PER_PAGE,
    error::{ApiError, QueryError},
    pagination::PageContext,
    schema::{Ingredient, IngredientRow, Uuid},
};

use sqlx::{Pool, Postgres};

pub async fn create_ingredient(
    ctx: &RequestContext,
    name: &str,
    measurement_unit: &str,
    pool: &Pool<Postgres>,
) -> Result<Ingredient, ApiError> {
    ctx.authenticate(ActionType::ManageIngredients)?;

    let ingredient: Option<Ingredient> = sqlx::query_as(
        "
        INSERT INTO ingredients (name, measurement_unit)
        VALUES ($1, $2)
        ON CONFLICT DO NOTHING RETURNING *;
    ",
    )
    .bind(name)
    .bind(measurement_unit)
    .fetch_optional(pool)
    .await
    .map_err(QueryError::from)?;

    match ingredient {
        Some(ingredient) => Ok(ingredient),
        None => Err(ApiError::Conflict(String::from(
            "An ingredient with this name already exists",
        ))),
    }
}

pub async fn find_ingredient(name: &str, pool: &Pool<Postgres>) -> Result<Option<Uuid>, ApiError> {
    let row: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM ingredients WHERE LOWER(name) = LOWER($1)")
            .bind(name)
            .fetch_optional(pool)
            .await
            .map_err(QueryError::from)?;

    Ok(row.map(|r| r.0))
}

pub async fn get_ingredient(id: Uuid, pool: &Pool<Postgres>) -> Result<Option<Ingredient>, ApiError> {
    let row: Option<Ingredient> = sqlx::query_as("SELECT * FROM ingredients WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row)
}

pub async fn list_ingredients(pool: &Pool<Postgres>) -> Result<Vec<Ingredient>, ApiError> {
    let rows: Vec<Ingredient> = sqlx::query_as("SELECT * FROM ingredients ORDER BY name")
        .fetch_all(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(rows)
}

/// Name-prefix search, paged.
pub async fn fetch_ingredients(
    search: &str,
    offset: i64,
    pool: &Pool<Postgres>,
) -> Result<PageContext<IngredientRow>, ApiError> {
    let pattern = format!("{search}%");

    let rows: Vec<IngredientRow> = sqlx::query_as(
        "
        SELECT i.*, COUNT(*) OVER() AS count
        FROM ingredients i
        WHERE i.name ILIKE $1
        ORDER BY i.name
        LIMIT $2 OFFSET $3
    ",
    )
    .bind(pattern)
    .bind(INGREDIENT_COUNT_PER_PAGE)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    let total_count = rows.first().map(|row| row.count).unwrap_or(0);
    let page = PageContext::from_rows(rows, total_count, INGREDIENT_COUNT_PER_PAGE, offset);
    Ok(page)
}
