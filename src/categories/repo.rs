use anyhow::Context;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub category_id: Uuid,
    pub category_name: String,
    pub description: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Category {
    pub async fn list(db: &PgPool) -> anyhow::Result<Vec<Category>> {
        let rows = sqlx::query_as::<_, Category>(
            r#"
            SELECT id AS category_id, name AS category_name, description, created_at
              FROM categories
             ORDER BY name
            "#,
        )
        .fetch_all(db)
        .await
        .context("list categories")?;
        Ok(rows)
    }

    pub async fn find(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Category>> {
        let row = sqlx::query_as::<_, Category>(
            r#"
            SELECT id AS category_id, name AS category_name, description, created_at
              FROM categories
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
        .context("get category")?;
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[tokio::test]
    async fn seeded_categories_are_sorted() {
        let Some(db) = test_support::db().await else { return };
        let all = Category::list(&db).await.unwrap();
        assert!(all.len() >= 7);
        let names: Vec<_> = all.iter().map(|c| c.category_name.clone()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);

        let first = Category::find(&db, all[0].category_id).await.unwrap().unwrap();
        assert_eq!(first.category_name, all[0].category_name);
        assert!(Category::find(&db, Uuid::new_v4()).await.unwrap().is_none());
    }
}
