use std::future::Future;

use serde::Serialize;

use crate::error::ApiError;
use crate::jwt::RequestContext;
use crate::schema::{Recipe, RecipePart, Tag, User, Uuid};

/// External user shape.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub email: String,
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

pub fn user_view(user: &User, is_subscribed: bool) -> UserView {
    UserView {
        email: user.email.to_owned(),
        id: user.id,
        username: user.username.to_owned(),
        first_name: user.first_name.to_owned(),
        last_name: user.last_name.to_owned(),
        is_subscribed,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipePartView {
    pub id: Uuid,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

impl From<RecipePart> for RecipePartView {
    fn from(part: RecipePart) -> Self {
        Self {
            id: part.ingredient_id,
            name: part.name,
            measurement_unit: part.measurement_unit,
            amount: part.amount,
        }
    }
}

/// Full read view; every write operation re-renders through this shape.
#[derive(Debug, Clone, Serialize)]
pub struct RecipeView {
    pub id: Uuid,
    pub tags: Vec<Tag>,
    pub author: UserView,
    pub ingredients: Vec<RecipePartView>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

pub fn recipe_view(
    recipe: Recipe,
    author: UserView,
    tags: Vec<Tag>,
    parts: Vec<RecipePart>,
    is_favorited: bool,
    is_in_shopping_cart: bool,
) -> RecipeView {
    RecipeView {
        id: recipe.id,
        tags,
        author,
        ingredients: parts.into_iter().map(RecipePartView::from).collect(),
        is_favorited,
        is_in_shopping_cart,
        name: recipe.name,
        image: recipe.image,
        text: recipe.text,
        cooking_time: recipe.cooking_time,
    }
}

/// Compact recipe shape used in favorite/cart replies and profile feeds.
#[derive(Debug, Clone, Serialize)]
pub struct RecipePreview {
    pub id: Uuid,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

impl From<Recipe> for RecipePreview {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name,
            image: recipe.image,
            cooking_time: recipe.cooking_time,
        }
    }
}

/// Author page: user fields plus their recipes. `recipes` honors the
/// caller-supplied limit, `recipes_count` always reports the total.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    pub email: String,
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
    pub recipes: Vec<RecipePreview>,
    pub recipes_count: i64,
}

pub fn profile_view(
    user: &User,
    is_subscribed: bool,
    recipes: Vec<RecipePreview>,
    recipes_limit: Option<i64>,
) -> ProfileView {
    let recipes_count = recipes.len() as i64;
    let recipes = match recipes_limit {
        Some(limit) if limit >= 0 => recipes.into_iter().take(limit as usize).collect(),
        _ => recipes,
    };

    ProfileView {
        email: user.email.to_owned(),
        id: user.id,
        username: user.username.to_owned(),
        first_name: user.first_name.to_owned(),
        last_name: user.last_name.to_owned(),
        is_subscribed,
        recipes,
        recipes_count,
    }
}

/// Resolves an `is_*` presentation flag: anonymous callers get `false`
/// instead of an error, authenticated callers get the membership check.
pub async fn computed_flag<F, Fut>(ctx: &RequestContext, check: F) -> Result<bool, ApiError>
where
    F: FnOnce(Uuid) -> Fut,
    Fut: Future<Output = Result<bool, ApiError>>,
{
    match ctx.user_id() {
        Some(user_id) => check(user_id).await,
        None => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::schema::UserRole;

    fn user(id: Uuid, username: &str) -> User {
        User {
            id,
            email: format!("{username}@example.com"),
            username: username.to_string(),
            first_name: String::from("Test"),
            last_name: String::from("User"),
            password: String::from("$argon2id$stub"),
            role: UserRole::User,
            created: Utc::now(),
        }
    }

    fn recipe(id: Uuid, name: &str) -> Recipe {
        Recipe {
            id,
            author_id: 1,
            name: name.to_string(),
            image: format!("recipes/images/{id}.png"),
            text: String::from("Mix and serve"),
            cooking_time: 15,
            pub_date: Utc::now(),
        }
    }

    #[test]
    fn test_user_view_never_exposes_password() {
        let view = user_view(&user(1, "anna"), true);
        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["is_subscribed"], true);
    }

    #[test]
    fn test_recipe_view_carries_flags_and_parts() {
        let parts = vec![RecipePart {
            recipe_id: 9,
            ingredient_id: 3,
            name: String::from("flour"),
            measurement_unit: String::from("g"),
            amount: 200,
        }];
        let view = recipe_view(
            recipe(9, "Pancakes"),
            user_view(&user(1, "anna"), false),
            vec![],
            parts,
            true,
            false,
        );
        assert!(view.is_favorited);
        assert!(!view.is_in_shopping_cart);
        assert_eq!(view.ingredients[0].id, 3);
        assert_eq!(view.ingredients[0].amount, 200);
    }

    #[test]
    fn test_profile_view_limit_does_not_affect_count() {
        let recipes: Vec<RecipePreview> = (1..=5)
            .map(|id| RecipePreview::from(recipe(id, "Soup")))
            .collect();
        let view = profile_view(&user(2, "boris"), false, recipes, Some(2));
        assert_eq!(view.recipes.len(), 2);
        assert_eq!(view.recipes_count, 5);

        let recipes: Vec<RecipePreview> = (1..=5)
            .map(|id| RecipePreview::from(recipe(id, "Soup")))
            .collect();
        let view = profile_view(&user(2, "boris"), false, recipes, None);
        assert_eq!(view.recipes.len(), 5);
        assert_eq!(view.recipes_count, 5);
    }

    #[tokio::test]
    async fn test_computed_flag_is_false_for_anonymous() {
        let ctx = RequestContext::anonymous();
        let flag = computed_flag(&ctx, |_| async { Ok(true) }).await.unwrap();
        assert!(!flag);
    }

    #[tokio::test]
    async fn test_computed_flag_runs_check_for_user() {
        let ctx = RequestContext::for_user(user(4, "dana"));
        let flag = computed_flag(&ctx, |user_id| async move { Ok(user_id == 4) })
            .await
            .unwrap();
        assert!(flag);
    }
}
