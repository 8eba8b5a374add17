use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Recipe as read back from the database, with author, category and rating
/// resolved by the query. This is also the JSON shape clients receive.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub recipe_id: Uuid,
    pub title: String,
    pub ingredients: String,
    pub steps: String,
    pub image_url: Option<String>,
    pub cooking_time: Option<i32>, // minutes
    pub servings: Option<i32>,
    pub user_id: Uuid,
    pub category_id: Uuid,
    pub author_name: String,
    pub category_name: String,
    pub average_rating: f64,
    pub views: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Validated, writable recipe fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeInput {
    pub title: String,
    pub ingredients: String,
    pub steps: String,
    pub image_url: Option<String>,
    pub cooking_time: Option<i32>,
    pub servings: Option<i32>,
    pub category_id: Uuid,
}
