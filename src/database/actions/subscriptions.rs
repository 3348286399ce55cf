use crate::{
    authentication::{jwt::RequestContext, permissions::ActionType},
    error::{ApiError, QueryError},
    schema::Uuid,
    validate::validate_subscription,
    views::ProfileView,
};

use sqlx::{Pool, Postgres};

use super::users::{get_user_by_id, user_profile};

pub async fn is_subscribed(
    user_id: Uuid,
    author_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<bool, ApiError> {
    let result: Option<(Uuid,)> = sqlx::query_as(
        "
        SELECT author_id FROM subscriptions WHERE user_id = $1 AND author_id = $2
    ",
    )
    .bind(user_id)
    .bind(author_id)
    .fetch_optional(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(result.is_some())
}

/// Follows an author and returns their profile view. Self-follows are
/// rejected up front; a duplicate follow is a conflict.
pub async fn subscribe(
    ctx: &RequestContext,
    author_id: Uuid,
    recipes_limit: Option<i64>,
    pool: &Pool<Postgres>,
) -> Result<ProfileView, ApiError> {
    let user = ctx.authenticate(ActionType::ManageOwnSubscriptions)?;
    validate_subscription(user.id, author_id)?;

    if get_user_by_id(pool, author_id).await?.is_none() {
        return Err(ApiError::NotFound(String::from(
            "No user exists with specified id",
        )));
    }

    let result =
        sqlx::query("INSERT INTO subscriptions (user_id, author_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(user.id)
            .bind(author_id)
            .execute(pool)
            .await
            .map_err(QueryError::from)?;

    if result.rows_affected() == 0 {
        return Err(ApiError::Conflict(String::from(
            "Already subscribed to this author",
        )));
    }

    user_profile(author_id, ctx, recipes_limit, pool).await
}

pub async fn unsubscribe(
    ctx: &RequestContext,
    author_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    let user = ctx.authenticate(ActionType::ManageOwnSubscriptions)?;

    let result = sqlx::query("DELETE FROM subscriptions WHERE user_id = $1 AND author_id = $2")
        .bind(user.id)
        .bind(author_id)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(String::from(
            "Not subscribed to this author",
        )));
    }

    Ok(())
}
