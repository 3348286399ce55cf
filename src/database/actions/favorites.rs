use crate::{
    constants::RECIPE_COUNT_PER_PAGE,
    error::{ApiError, QueryError},
    pagination::PageContext,
    schema::{RecipeRow, Uuid},
    views::RecipePreview,
};

use sqlx::{Pool, Postgres};

use super::recipes::get_recipe;

pub async fn is_favorite(
    id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<bool, ApiError> {
    let result: Option<(Uuid,)> = sqlx::query_as(
        "
        SELECT recipe_id FROM user_favorites WHERE recipe_id = $1 AND user_id = $2
    ",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(result.is_some())
}

/// Bookmarks a recipe. Adding twice is a conflict, reported off the
/// insert itself so concurrent requests cannot both succeed.
pub async fn add_to_favorites(
    id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<RecipePreview, ApiError> {
    let recipe = get_recipe(id, pool)
        .await?
        .ok_or_else(|| ApiError::NotFound(String::from("No recipe exists with specified id")))?;

    let result =
        sqlx::query("INSERT INTO user_favorites (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(user_id)
            .bind(id)
            .execute(pool)
            .await
            .map_err(QueryError::from)?;

    if result.rows_affected() == 0 {
        return Err(ApiError::Conflict(String::from(
            "Recipe is already in favorites",
        )));
    }

    Ok(RecipePreview::from(recipe))
}

pub async fn remove_from_favorites(
    id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    let result = sqlx::query("DELETE FROM user_favorites WHERE user_id = $1 AND recipe_id = $2")
        .bind(user_id)
        .bind(id)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(String::from(
            "Recipe is not in favorites",
        )));
    }

    Ok(())
}

pub async fn fetch_favorites(
    user_id: Uuid,
    offset: i64,
    pool: &Pool<Postgres>,
) -> Result<PageContext<RecipePreview>, ApiError> {
    let rows: Vec<RecipeRow> = sqlx::query_as(
        "
        SELECT r.*, COUNT(*) OVER() AS count
        FROM user_favorites f
        INNER JOIN recipes r ON r.id = f.recipe_id
        WHERE f.user_id = $1
        ORDER BY r.pub_date DESC
        LIMIT $2 OFFSET $3
    ",
    )
    .bind(user_id)
    .bind(RECIPE_COUNT_PER_PAGE)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    let total_count = rows.first().map(|row| row.count).unwrap_or(0);
    let page = PageContext::from_rows(rows, total_count, RECIPE_COUNT_PER_PAGE, offset);

    Ok(page.map(|row| RecipePreview {
        id: row.id,
        name: row.name,
        image: row.image,
        cooking_time: row.cooking_time,
    }))
}
