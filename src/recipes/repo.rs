use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{Recipe, RecipeInput};

/// Shared read shape. Author and category fall back to placeholders when the
/// joined row is missing; the average is 0 for unrated recipes.
const RECIPE_SELECT: &str = r#"
    SELECT r.id AS recipe_id, r.title, r.ingredients, r.steps, r.image_url,
           r.cooking_time, r.servings, r.user_id, r.category_id, r.views,
           r.created_at, r.updated_at,
           COALESCE(u.full_name, 'Unknown') AS author_name,
           COALESCE(c.name, 'Uncategorized') AS category_name,
           COALESCE((SELECT AVG(rt.rating_value) FROM ratings rt WHERE rt.recipe_id = r.id), 0)::FLOAT8
               AS average_rating
      FROM recipes r
      LEFT JOIN users u ON u.id = r.user_id
      LEFT JOIN categories c ON c.id = r.category_id
"#;

/// Escapes LIKE wildcards so user input only matches literally.
pub(crate) fn like_pattern(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len() + 2);
    out.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('%');
    out
}

impl Recipe {
    pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<Recipe>> {
        let rows = sqlx::query_as::<_, Recipe>(&format!(
            "{RECIPE_SELECT} ORDER BY r.created_at DESC"
        ))
        .fetch_all(db)
        .await
        .context("list recipes")?;
        Ok(rows)
    }

    pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Recipe>> {
        let rows = sqlx::query_as::<_, Recipe>(&format!(
            "{RECIPE_SELECT} WHERE r.user_id = $1 ORDER BY r.created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(db)
        .await
        .context("list recipes by user")?;
        Ok(rows)
    }

    pub async fn list_by_category(db: &PgPool, category_id: Uuid) -> anyhow::Result<Vec<Recipe>> {
        let rows = sqlx::query_as::<_, Recipe>(&format!(
            "{RECIPE_SELECT} WHERE r.category_id = $1 ORDER BY r.created_at DESC"
        ))
        .bind(category_id)
        .fetch_all(db)
        .await
        .context("list recipes by category")?;
        Ok(rows)
    }

    /// Case-insensitive substring match on the title.
    pub async fn search_title(db: &PgPool, needle: &str) -> anyhow::Result<Vec<Recipe>> {
        let rows = sqlx::query_as::<_, Recipe>(&format!(
            "{RECIPE_SELECT} WHERE r.title ILIKE $1 ESCAPE '\\' ORDER BY r.created_at DESC"
        ))
        .bind(like_pattern(needle))
        .fetch_all(db)
        .await
        .context("search recipes by title")?;
        Ok(rows)
    }

    /// Full-text match against the ingredients column.
    pub async fn search_ingredients(db: &PgPool, terms: &str) -> anyhow::Result<Vec<Recipe>> {
        let rows = sqlx::query_as::<_, Recipe>(&format!(
            r#"{RECIPE_SELECT}
             WHERE to_tsvector('english', r.ingredients) @@ plainto_tsquery('english', $1)
             ORDER BY r.created_at DESC"#
        ))
        .bind(terms)
        .fetch_all(db)
        .await
        .context("search recipes by ingredients")?;
        Ok(rows)
    }

    pub async fn most_viewed(db: &PgPool, limit: i64) -> anyhow::Result<Vec<Recipe>> {
        let rows = sqlx::query_as::<_, Recipe>(&format!(
            "{RECIPE_SELECT} ORDER BY r.views DESC, r.created_at DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(db)
        .await
        .context("most viewed recipes")?;
        Ok(rows)
    }

    pub async fn find(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Recipe>> {
        let row = sqlx::query_as::<_, Recipe>(&format!("{RECIPE_SELECT} WHERE r.id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await
            .context("get recipe")?;
        Ok(row)
    }

    /// Best-effort view counter; concurrent readers may under-count.
    pub async fn increment_views(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("UPDATE recipes SET views = views + 1 WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .context("increment views")?;
        Ok(())
    }

    /// Raw `sqlx::Error` so an unknown category (FK violation) can be told apart.
    pub async fn insert(db: &PgPool, user_id: Uuid, input: &RecipeInput) -> Result<Uuid, sqlx::Error> {
        let (id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO recipes (title, ingredients, steps, image_url, cooking_time, servings, user_id, category_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(&input.title)
        .bind(&input.ingredients)
        .bind(&input.steps)
        .bind(&input.image_url)
        .bind(input.cooking_time)
        .bind(input.servings)
        .bind(user_id)
        .bind(input.category_id)
        .fetch_one(db)
        .await?;
        Ok(id)
    }

    /// Updates the recipe only if `user_id` owns it. Ownership is part of the
    /// same statement; zero rows means "missing or not yours".
    pub async fn update_owned(
        db: &PgPool,
        id: Uuid,
        user_id: Uuid,
        input: &RecipeInput,
    ) -> Result<u64, sqlx::Error> {
        let res = sqlx::query(
            r#"
            UPDATE recipes
               SET title = $1, ingredients = $2, steps = $3, image_url = $4,
                   cooking_time = $5, servings = $6, category_id = $7, updated_at = now()
             WHERE id = $8 AND user_id = $9
            "#,
        )
        .bind(&input.title)
        .bind(&input.ingredients)
        .bind(&input.steps)
        .bind(&input.image_url)
        .bind(input.cooking_time)
        .bind(input.servings)
        .bind(input.category_id)
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?;
        Ok(res.rows_affected())
    }

    /// Same predicate as [`Recipe::update_owned`].
    pub async fn delete_owned(db: &PgPool, id: Uuid, user_id: Uuid) -> anyhow::Result<u64> {
        let res = sqlx::query("DELETE FROM recipes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(db)
            .await
            .context("delete own recipe")?;
        Ok(res.rows_affected())
    }

    /// Admin deletion, no ownership predicate.
    pub async fn delete_any(db: &PgPool, id: Uuid) -> anyhow::Result<u64> {
        let res = sqlx::query("DELETE FROM recipes WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .context("delete recipe")?;
        Ok(res.rows_affected())
    }
}
