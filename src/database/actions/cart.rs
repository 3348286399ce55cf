use std::collections::BTreeMap;

use crate::{
    constants::{RECIPE_COUNT_PER_PAGE, SHOPPING_LIST_HEADER},
    error::{ApiError, QueryError},
    pagination::PageContext,
    schema::{CartIngredientRow, RecipeRow, ShoppingListItem, Uuid},
    views::RecipePreview,
};

use sqlx::{Pool, Postgres};

use super::recipes::get_recipe;

pub async fn in_shopping_cart(
    id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<bool, ApiError> {
    let result: Option<(Uuid,)> = sqlx::query_as(
        "
        SELECT recipe_id FROM shopping_cart WHERE recipe_id = $1 AND user_id = $2
    ",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(result.is_some())
}

pub async fn add_to_cart(
    id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<RecipePreview, ApiError> {
    let recipe = get_recipe(id, pool)
        .await?
        .ok_or_else(|| ApiError::NotFound(String::from("No recipe exists with specified id")))?;

    let result =
        sqlx::query("INSERT INTO shopping_cart (user_id, recipe_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(user_id)
            .bind(id)
            .execute(pool)
            .await
            .map_err(QueryError::from)?;

    if result.rows_affected() == 0 {
        return Err(ApiError::Conflict(String::from(
            "Recipe is already in the shopping cart",
        )));
    }

    Ok(RecipePreview::from(recipe))
}

pub async fn remove_from_cart(
    id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    let result = sqlx::query("DELETE FROM shopping_cart WHERE user_id = $1 AND recipe_id = $2")
        .bind(user_id)
        .bind(id)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound(String::from(
            "Recipe is not in the shopping cart",
        )));
    }

    Ok(())
}

pub async fn fetch_cart(
    user_id: Uuid,
    offset: i64,
    pool: &Pool<Postgres>,
) -> Result<PageContext<RecipePreview>, ApiError> {
    let rows: Vec<RecipeRow> = sqlx::query_as(
        "
        SELECT r.*, COUNT(*) OVER() AS count
        FROM shopping_cart sc
        INNER JOIN recipes r ON r.id = sc.recipe_id
        WHERE sc.user_id = $1
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

/// Sums ingredient amounts across every recipe in the user's cart,
/// grouped by (name, measurement unit) and sorted by name.
pub async fn build_shopping_list(
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Vec<ShoppingListItem>, ApiError> {
    let rows: Vec<CartIngredientRow> = sqlx::query_as(
        "
        SELECT i.name AS name, i.measurement_unit AS measurement_unit, ri.amount AS amount
        FROM shopping_cart sc
        INNER JOIN recipe_ingredients ri ON ri.recipe_id = sc.recipe_id
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE sc.user_id = $1
    ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(aggregate_shopping_list(rows))
}

pub fn aggregate_shopping_list(rows: Vec<CartIngredientRow>) -> Vec<ShoppingListItem> {
    let mut totals: BTreeMap<(String, String), i64> = BTreeMap::new();
    for row in rows {
        *totals
            .entry((row.name, row.measurement_unit))
            .or_insert(0) += i64::from(row.amount);
    }

    totals
        .into_iter()
        .map(|((name, measurement_unit), total)| ShoppingListItem {
            name,
            measurement_unit,
            total,
        })
        .collect()
}

/// Renders the aggregated list as the downloadable plain-text document.
pub fn render_shopping_list(items: &[ShoppingListItem]) -> String {
    let mut text = format!("{SHOPPING_LIST_HEADER}\n");
    for item in items {
        text += &format!("{}: {} {}\n", item.name, item.total, item.measurement_unit);
    }
    text
}

pub async fn export_shopping_list(user_id: Uuid, pool: &Pool<Postgres>) -> Result<String, ApiError> {
    let items = build_shopping_list(user_id, pool).await?;
    Ok(render_shopping_list(&items))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SHOPPING_LIST_FILENAME;

    fn row(name: &str, unit: &str, amount: i32) -> CartIngredientRow {
        CartIngredientRow {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
            amount,
        }
    }

    #[test]
    fn test_amounts_sum_across_recipes() {
        let items = aggregate_shopping_list(vec![
            row("sugar", "g", 100),
            row("flour", "g", 200),
            row("flour", "g", 50),
        ]);
        assert_eq!(
            items,
            vec![
                ShoppingListItem {
                    name: String::from("flour"),
                    measurement_unit: String::from("g"),
                    total: 250,
                },
                ShoppingListItem {
                    name: String::from("sugar"),
                    measurement_unit: String::from("g"),
                    total: 100,
                },
            ]
        );
    }

    #[test]
    fn test_sorted_by_name() {
        let items = aggregate_shopping_list(vec![
            row("salt", "g", 5),
            row("butter", "g", 30),
            row("milk", "ml", 200),
        ]);
        let names: Vec<&str> = items.iter().map(|item| item.name.as_str()).collect();
        assert_eq!(names, vec!["butter", "milk", "salt"]);
    }

    #[test]
    fn test_units_kept_separate() {
        let items = aggregate_shopping_list(vec![row("milk", "ml", 200), row("milk", "l", 1)]);
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_cart_scenario_export() {
        // recipe R: [(flour, 200), (sugar, 100)], in one cart
        let items = aggregate_shopping_list(vec![row("flour", "g", 200), row("sugar", "g", 100)]);
        assert_eq!(items[0].name, "flour");
        assert_eq!(items[0].total, 200);
        assert_eq!(items[1].name, "sugar");
        assert_eq!(items[1].total, 100);

        let text = render_shopping_list(&items);
        assert_eq!(text, "Список покупок: \nflour: 200 g\nsugar: 100 g\n");
        assert_eq!(SHOPPING_LIST_FILENAME, "shopping-list.txt");
    }

    #[test]
    fn test_empty_cart_renders_header_only() {
        let text = render_shopping_list(&[]);
        assert_eq!(text, "Список покупок: \n");
    }
}
