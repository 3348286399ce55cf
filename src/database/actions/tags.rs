use crate::{
    authentication::{jwt::RequestContext, permissions::ActionType},
    error::{ApiError, QueryError},
    schema::{Tag, Uuid},
    validate::validate_hex_color,
};

use sqlx::{Pool, Postgres};

pub async fn create_tag(
    ctx: &RequestContext,
    name: &str,
    color: &str,
    slug: &str,
    pool: &Pool<Postgres>,
) -> Result<Tag, ApiError> {
    ctx.authenticate(ActionType::ManageTags)?;
    validate_hex_color(color)?;

    let tag: Option<Tag> = sqlx::query_as(
        "
        INSERT INTO tags (name, color, slug)
        VALUES ($1, $2, $3)
        ON CONFLICT DO NOTHING RETURNING *;
    ",
    )
    .bind(name)
    .bind(color)
    .bind(slug)
    .fetch_optional(pool)
    .await
    .map_err(QueryError::from)?;

    match tag {
        Some(tag) => Ok(tag),
        None => Err(ApiError::Conflict(String::from(
            "A tag with this name or slug already exists",
        ))),
    }
}

pub async fn get_tag(id: Uuid, pool: &Pool<Postgres>) -> Result<Option<Tag>, ApiError> {
    let row: Option<Tag> = sqlx::query_as("SELECT * FROM tags WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row)
}

pub async fn find_tag(slug: &str, pool: &Pool<Postgres>) -> Result<Option<Uuid>, ApiError> {
    let row: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM tags WHERE slug = $1")
        .bind(slug)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row.map(|tag| tag.0))
}

pub async fn list_tags(pool: &Pool<Postgres>) -> Result<Vec<Tag>, ApiError> {
    let rows: Vec<Tag> = sqlx::query_as("SELECT * FROM tags ORDER BY name")
        .fetch_all(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(rows)
}
