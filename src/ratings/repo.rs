use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

/// Insert or overwrite the (recipe, user) rating in one statement.
pub async fn upsert_rating(
    db: &PgPool,
    recipe_id: Uuid,
    user_id: Uuid,
    value: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO ratings (recipe_id, user_id, rating_value)
        VALUES ($1, $2, $3)
        ON CONFLICT (recipe_id, user_id) DO UPDATE SET rating_value = EXCLUDED.rating_value
        "#,
    )
    .bind(recipe_id)
    .bind(user_id)
    .bind(value)
    .execute(db)
    .await?;
    Ok(())
}

/// Mean of all ratings, 0 when there are none.
pub async fn average_rating(db: &PgPool, recipe_id: Uuid) -> anyhow::Result<f64> {
    let (avg,): (f64,) = sqlx::query_as(
        "SELECT COALESCE(AVG(rating_value), 0)::FLOAT8 FROM ratings WHERE recipe_id = $1",
    )
    .bind(recipe_id)
    .fetch_one(db)
    .await
    .context("average rating")?;
    Ok(avg)
}

pub async fn user_rating(db: &PgPool, recipe_id: Uuid, user_id: Uuid) -> anyhow::Result<Option<i32>> {
    let row: Option<(i32,)> = sqlx::query_as(
        "SELECT rating_value FROM ratings WHERE recipe_id = $1 AND user_id = $2",
    )
    .bind(recipe_id)
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("user rating")?;
    Ok(row.map(|(v,)| v))
}
