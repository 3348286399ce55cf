use crate::{
    authentication::{
        cryptography::{hash_password, verify_password},
        jwt::{generate_jwt_session, JwtSessionData, RequestContext},
    },
    constants::{EMAIL_MAX_LENGTH, PROFILE_COUNT_PER_PAGE, STRING_MAX_LENGTH},
    error::{ApiError, QueryError},
    pagination::PageContext,
    schema::{NewUser, User, UserRow, Uuid},
    validate::validate_username,
    views::{computed_flag, profile_view, user_view, ProfileView, RecipePreview, UserView},
};

use sqlx::{Pool, Postgres};

use super::{recipes::list_author_recipes, subscriptions::is_subscribed};

pub async fn get_user(pool: &Pool<Postgres>, username: &str) -> Result<Option<User>, ApiError> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row)
}

pub async fn get_user_by_email(pool: &Pool<Postgres>, email: &str) -> Result<Option<User>, ApiError> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row)
}

pub async fn get_user_by_id(pool: &Pool<Postgres>, user_id: Uuid) -> Result<Option<User>, ApiError> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row)
}

/// Creates a user with a hashed password. The (email, username) pair is
/// protected by unique constraints; hitting one surfaces as a conflict.
pub async fn register_user(form: NewUser, pool: &Pool<Postgres>) -> Result<User, ApiError> {
    validate_username(&form.username)?;
    if form.email.len() > EMAIL_MAX_LENGTH || form.username.len() > STRING_MAX_LENGTH {
        return Err(ApiError::Validation(String::from("Field value is too long")));
    }

    let password = hash_password(&form.password)
        .map_err(|_| ApiError::Internal(String::from("Failed to hash password")))?;

    let row: Option<User> = sqlx::query_as(
        "
        INSERT INTO users (email, username, first_name, last_name, password)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT DO NOTHING RETURNING *;
    ",
    )
    .bind(&form.email)
    .bind(&form.username)
    .bind(&form.first_name)
    .bind(&form.last_name)
    .bind(password)
    .fetch_optional(pool)
    .await
    .map_err(QueryError::from)?;

    match row {
        Some(user) => Ok(user),
        None => Err(ApiError::Conflict(String::from(
            "A user with this email or username already exists",
        ))),
    }
}

pub async fn login_user(
    email: &str,
    password: &str,
    pool: &Pool<Postgres>,
) -> Result<String, ApiError> {
    let user = match get_user_by_email(pool, email).await? {
        Some(user) => user,
        None => return Err(ApiError::Validation(String::from("Invalid credentials"))),
    };

    let authenticated = verify_password(password, &user.password)
        .map_err(|_| ApiError::Validation(String::from("Invalid credentials")))?;
    if !authenticated {
        return Err(ApiError::Validation(String::from("Invalid credentials")));
    }

    generate_jwt_session(&user)
}

/// Turns a (possibly absent) verified session into the request context.
/// A session pointing at a deleted user degrades to anonymous.
pub async fn resolve_context(
    session: Option<JwtSessionData>,
    pool: &Pool<Postgres>,
) -> Result<RequestContext, ApiError> {
    match session {
        Some(session) => Ok(get_user_by_id(pool, session.user_id)
            .await?
            .map(RequestContext::for_user)
            .unwrap_or_else(RequestContext::anonymous)),
        None => Ok(RequestContext::anonymous()),
    }
}

pub fn get_me(ctx: &RequestContext) -> Result<UserView, ApiError> {
    let user = ctx.require_user()?;
    Ok(user_view(user, false))
}

pub async fn user_profile(
    author_id: Uuid,
    ctx: &RequestContext,
    recipes_limit: Option<i64>,
    pool: &Pool<Postgres>,
) -> Result<ProfileView, ApiError> {
    let author = get_user_by_id(pool, author_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(String::from("No user exists with specified id")))?;

    let subscribed = computed_flag(ctx, |user_id| is_subscribed(user_id, author.id, pool)).await?;
    let recipes: Vec<RecipePreview> = list_author_recipes(author_id, pool)
        .await?
        .into_iter()
        .map(RecipePreview::from)
        .collect();

    Ok(profile_view(&author, subscribed, recipes, recipes_limit))
}

/// Authors the current user follows, ordered by username, rendered as
/// profile views the way the subscription feed shows them.
pub async fn fetch_subscriptions(
    ctx: &RequestContext,
    recipes_limit: Option<i64>,
    offset: i64,
    pool: &Pool<Postgres>,
) -> Result<PageContext<ProfileView>, ApiError> {
    let user = ctx.require_user()?;

    let rows: Vec<UserRow> = sqlx::query_as(
        "
        SELECT u.*, COUNT(*) OVER() AS count
        FROM subscriptions s
        INNER JOIN users u ON u.id = s.author_id
        WHERE s.user_id = $1
        ORDER BY u.username
        LIMIT $2 OFFSET $3
    ",
    )
    .bind(user.id)
    .bind(PROFILE_COUNT_PER_PAGE)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    let total_count = rows.first().map(|row| row.count).unwrap_or(0);

    let mut profiles = Vec::with_capacity(rows.len());
    for row in rows {
        let author = User::from(row);
        let recipes: Vec<RecipePreview> = list_author_recipes(author.id, pool)
            .await?
            .into_iter()
            .map(RecipePreview::from)
            .collect();
        profiles.push(profile_view(&author, true, recipes, recipes_limit));
    }

    Ok(PageContext::from_rows(
        profiles,
        total_count,
        PROFILE_COUNT_PER_PAGE,
        offset,
    ))
}
