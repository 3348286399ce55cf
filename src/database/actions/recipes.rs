use std::path::Path;

use crate::{
    authentication::{jwt::RequestContext, permissions::ActionType},
    constants::RECIPE_COUNT_PER_PAGE,
    error::{ApiError, QueryError},
    media::images::store_image,
    pagination::PageContext,
    schema::{NewRecipe, NewRecipePart, Recipe, RecipePart, RecipePatch, RecipeRow, Tag, Uuid},
    validate::{validate_cooking_time, validate_ingredient_list, validate_tag_list},
    views::{computed_flag, recipe_view, user_view, RecipeView},
};

use sqlx::{Pool, Postgres, QueryBuilder, Transaction};

use super::{
    cart::in_shopping_cart, favorites::is_favorite, ingredients::get_ingredient,
    subscriptions::is_subscribed, tags::get_tag, users::get_user_by_id,
};

pub async fn fetch_recipes(
    offset: i64,
    pool: &Pool<Postgres>,
) -> Result<PageContext<RecipeRow>, ApiError> {
    let rows: Vec<RecipeRow> = sqlx::query_as(
        "
        SELECT r.*, COUNT(*) OVER() AS count
        FROM recipes r
        ORDER BY r.pub_date DESC
        LIMIT $1 OFFSET $2
    ",
    )
    .bind(RECIPE_COUNT_PER_PAGE)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    let total_count = rows.first().map(|row| row.count).unwrap_or(0);
    let page = PageContext::from_rows(rows, total_count, RECIPE_COUNT_PER_PAGE, offset);
    Ok(page)
}

/// Paged listing rendered through the full read view for the given caller.
pub async fn fetch_recipe_views(
    ctx: &RequestContext,
    offset: i64,
    pool: &Pool<Postgres>,
) -> Result<PageContext<RecipeView>, ApiError> {
    let PageContext {
        rows,
        total_rows,
        offset,
        next_offset,
        prev_offset,
        page_count,
    } = fetch_recipes(offset, pool).await?;

    let mut views = Vec::with_capacity(rows.len());
    for row in rows {
        views.push(recipe_read_view(Recipe::from(row), ctx, pool).await?);
    }

    Ok(PageContext {
        rows: views,
        total_rows,
        offset,
        next_offset,
        prev_offset,
        page_count,
    })
}

pub async fn list_author_recipes(
    author_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Vec<Recipe>, ApiError> {
    let rows: Vec<Recipe> =
        sqlx::query_as("SELECT * FROM recipes WHERE author_id = $1 ORDER BY pub_date DESC")
            .bind(author_id)
            .fetch_all(pool)
            .await
            .map_err(QueryError::from)?;

    Ok(rows)
}

pub async fn get_recipe(id: Uuid, pool: &Pool<Postgres>) -> Result<Option<Recipe>, ApiError> {
    let row: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row)
}

/// Fetches a recipe for mutation: the caller must be its author, unless
/// their role grants managing all recipes.
pub async fn get_recipe_mut(
    id: Uuid,
    ctx: &RequestContext,
    pool: &Pool<Postgres>,
) -> Result<Recipe, ApiError> {
    let recipe = get_recipe(id, pool).await?;
    let user = ctx.authenticate(ActionType::ManageOwnRecipes)?;

    match recipe {
        Some(recipe) => {
            if ActionType::ManageAllRecipes.allowed_for(&user.role) || recipe.author_id == user.id {
                Ok(recipe)
            } else {
                Err(ApiError::PermissionDenied(String::from(
                    "Only the author can modify this recipe",
                )))
            }
        }
        None => Err(ApiError::NotFound(String::from(
            "No recipe exists with specified id",
        ))),
    }
}

pub async fn list_recipe_parts(
    pool: &Pool<Postgres>,
    recipe_id: Uuid,
) -> Result<Vec<RecipePart>, ApiError> {
    let rows: Vec<RecipePart> = sqlx::query_as("
        SELECT ri.recipe_id AS recipe_id, i.id AS ingredient_id, i.name AS name, i.measurement_unit AS measurement_unit, ri.amount AS amount
        FROM recipe_ingredients ri
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE ri.recipe_id = $1
    ")
    .bind(recipe_id)
    .fetch_all(pool).await.map_err(QueryError::from)?;

    Ok(rows)
}

pub async fn list_recipe_tags(
    pool: &Pool<Postgres>,
    recipe_id: Uuid,
) -> Result<Vec<Tag>, ApiError> {
    let rows: Vec<Tag> = sqlx::query_as(
        "
        SELECT t.*
        FROM recipe_tags rt
        INNER JOIN tags t ON t.id = rt.tag_id
        WHERE rt.recipe_id = $1
        ORDER BY t.name
    ",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(rows)
}

/// Assembles the full read view for one recipe. Both `is_*` flags resolve
/// to false for anonymous callers.
pub async fn recipe_read_view(
    recipe: Recipe,
    ctx: &RequestContext,
    pool: &Pool<Postgres>,
) -> Result<RecipeView, ApiError> {
    let author = get_user_by_id(pool, recipe.author_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(String::from("No user exists with specified id")))?;

    let author_subscribed =
        computed_flag(ctx, |user_id| is_subscribed(user_id, author.id, pool)).await?;
    let favorited = computed_flag(ctx, |user_id| is_favorite(recipe.id, user_id, pool)).await?;
    let in_cart = computed_flag(ctx, |user_id| in_shopping_cart(recipe.id, user_id, pool)).await?;

    let tags = list_recipe_tags(pool, recipe.id).await?;
    let parts = list_recipe_parts(pool, recipe.id).await?;

    Ok(recipe_view(
        recipe,
        user_view(&author, author_subscribed),
        tags,
        parts,
        favorited,
        in_cart,
    ))
}

async fn ensure_tags_exist(tags: &[Uuid], pool: &Pool<Postgres>) -> Result<(), ApiError> {
    for tag_id in tags {
        if get_tag(*tag_id, pool).await?.is_none() {
            return Err(ApiError::Validation(format!(
                "No tag exists with id {tag_id}"
            )));
        }
    }
    Ok(())
}

async fn ensure_ingredients_exist(
    parts: &[NewRecipePart],
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    for part in parts {
        if get_ingredient(part.id, pool).await?.is_none() {
            return Err(ApiError::Validation(format!(
                "No ingredient exists with id {}",
                part.id
            )));
        }
    }
    Ok(())
}

async fn insert_recipe_tags(
    tr: &mut Transaction<'_, Postgres>,
    recipe_id: Uuid,
    tags: &[Uuid],
) -> Result<(), ApiError> {
    if tags.is_empty() {
        return Ok(());
    }

    let mut query_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO recipe_tags (recipe_id, tag_id) ");
    query_builder.push_values(tags.iter(), |mut b, tag_id| {
        b.push_bind(recipe_id).push_bind(tag_id);
    });

    query_builder
        .build()
        .execute(&mut **tr)
        .await
        .map_err(QueryError::from)?;

    Ok(())
}

async fn insert_recipe_parts(
    tr: &mut Transaction<'_, Postgres>,
    recipe_id: Uuid,
    parts: &[NewRecipePart],
) -> Result<(), ApiError> {
    if parts.is_empty() {
        return Ok(());
    }

    let mut query_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) ");
    query_builder.push_values(parts.iter(), |mut b, part| {
        b.push_bind(recipe_id).push_bind(part.id).push_bind(part.amount);
    });

    query_builder
        .build()
        .execute(&mut **tr)
        .await
        .map_err(QueryError::from)?;

    Ok(())
}

/// Creates a recipe with its tag and ingredient associations in a single
/// transaction, then re-renders it through the read view.
pub async fn create_recipe(
    ctx: &RequestContext,
    form: NewRecipe,
    media_root: &Path,
    pool: &Pool<Postgres>,
) -> Result<RecipeView, ApiError> {
    let user = ctx.authenticate(ActionType::CreateRecipes)?;

    validate_cooking_time(form.cooking_time)?;
    validate_tag_list(&form.tags)?;
    validate_ingredient_list(&form.ingredients)?;
    ensure_tags_exist(&form.tags, pool).await?;
    ensure_ingredients_exist(&form.ingredients, pool).await?;

    let image = store_image(&form.image, media_root).await?;

    let mut tr = pool
        .begin()
        .await
        .map_err(|_| QueryError::new(String::from("Could not start transaction")))?;

    let recipe: Recipe = sqlx::query_as(
        "
        INSERT INTO recipes (author_id, name, image, text, cooking_time)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
    ",
    )
    .bind(user.id)
    .bind(&form.name)
    .bind(image)
    .bind(&form.text)
    .bind(form.cooking_time)
    .fetch_one(&mut *tr)
    .await
    .map_err(QueryError::from)?;

    insert_recipe_tags(&mut tr, recipe.id, &form.tags).await?;
    insert_recipe_parts(&mut tr, recipe.id, &form.ingredients).await?;

    tr.commit()
        .await
        .map_err(|_| QueryError::new(String::from("Could not commit transaction")))?;

    recipe_read_view(recipe, ctx, pool).await
}

/// Updates scalar fields and, where supplied, replaces the tag and
/// ingredient sets wholesale (delete-then-insert) in one transaction, so
/// concurrent readers never observe a half-updated recipe.
pub async fn update_recipe(
    ctx: &RequestContext,
    id: Uuid,
    patch: RecipePatch,
    media_root: &Path,
    pool: &Pool<Postgres>,
) -> Result<RecipeView, ApiError> {
    let recipe = get_recipe_mut(id, ctx, pool).await?;

    if let Some(cooking_time) = patch.cooking_time {
        validate_cooking_time(cooking_time)?;
    }
    if let Some(tags) = &patch.tags {
        validate_tag_list(tags)?;
        ensure_tags_exist(tags, pool).await?;
    }
    if let Some(parts) = &patch.ingredients {
        validate_ingredient_list(parts)?;
        ensure_ingredients_exist(parts, pool).await?;
    }

    let image = match &patch.image {
        Some(payload) => Some(store_image(payload, media_root).await?),
        None => None,
    };

    let mut tr = pool
        .begin()
        .await
        .map_err(|_| QueryError::new(String::from("Could not start transaction")))?;

    sqlx::query(
        "
        UPDATE recipes SET
        name = COALESCE($1, name),
        image = COALESCE($2, image),
        text = COALESCE($3, text),
        cooking_time = COALESCE($4, cooking_time)
        WHERE id = $5
    ",
    )
    .bind(patch.name)
    .bind(image)
    .bind(patch.text)
    .bind(patch.cooking_time)
    .bind(recipe.id)
    .execute(&mut *tr)
    .await
    .map_err(QueryError::from)?;

    if let Some(tags) = &patch.tags {
        sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
            .bind(recipe.id)
            .execute(&mut *tr)
            .await
            .map_err(QueryError::from)?;

        insert_recipe_tags(&mut tr, recipe.id, tags).await?;
    }

    if let Some(parts) = &patch.ingredients {
        sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
            .bind(recipe.id)
            .execute(&mut *tr)
            .await
            .map_err(QueryError::from)?;

        insert_recipe_parts(&mut tr, recipe.id, parts).await?;
    }

    tr.commit()
        .await
        .map_err(|_| QueryError::new(String::from("Could not commit transaction")))?;

    let updated = get_recipe(id, pool)
        .await?
        .ok_or_else(|| ApiError::NotFound(String::from("No recipe exists with specified id")))?;

    recipe_read_view(updated, ctx, pool).await
}

/// Deletes a recipe; association rows go with it via cascade.
pub async fn delete_recipe(
    ctx: &RequestContext,
    id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    let recipe = get_recipe_mut(id, ctx, pool).await?;

    sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(recipe.id)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(())
}
