use anyhow::Context;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub comment_id: Uuid,
    pub recipe_id: Uuid,
    pub user_id: Uuid,
    pub comment_text: String,
    pub user_name: String, // joined from users
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Comment {
    pub async fn list_for_recipe(db: &PgPool, recipe_id: Uuid) -> anyhow::Result<Vec<Comment>> {
        let rows = sqlx::query_as::<_, Comment>(
            r#"
            SELECT co.id AS comment_id, co.recipe_id, co.user_id, co.comment_text,
                   u.full_name AS user_name, co.created_at
              FROM comments co
              JOIN users u ON u.id = co.user_id
             WHERE co.recipe_id = $1
             ORDER BY co.created_at DESC
            "#,
        )
        .bind(recipe_id)
        .fetch_all(db)
        .await
        .context("list comments")?;
        Ok(rows)
    }

    /// Inserts and reads back the joined shape in one round trip.
    pub async fn insert(
        db: &PgPool,
        recipe_id: Uuid,
        user_id: Uuid,
        text: &str,
    ) -> Result<Comment, sqlx::Error> {
        sqlx::query_as::<_, Comment>(
            r#"
            WITH inserted AS (
                INSERT INTO comments (recipe_id, user_id, comment_text)
                VALUES ($1, $2, $3)
                RETURNING id, recipe_id, user_id, comment_text, created_at
            )
            SELECT i.id AS comment_id, i.recipe_id, i.user_id, i.comment_text,
                   u.full_name AS user_name, i.created_at
              FROM inserted i
              JOIN users u ON u.id = i.user_id
            "#,
        )
        .bind(recipe_id)
        .bind(user_id)
        .bind(text)
        .fetch_one(db)
        .await
    }
}
