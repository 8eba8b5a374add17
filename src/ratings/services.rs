use sqlx::PgPool;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use super::repo;
use crate::error::{violated_foreign_key, AppError};

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

const RECIPE_FK: &str = "ratings_recipe_id_fkey";
const RATER_FK: &str = "ratings_user_id_fkey";

#[derive(Debug, Error)]
pub enum RatingError {
    #[error("Rating must be between 1 and 5")]
    InvalidValue,
    #[error("Recipe not found")]
    RecipeNotFound,
    #[error("User not found")]
    UnknownRater,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<RatingError> for AppError {
    fn from(e: RatingError) -> Self {
        match e {
            RatingError::InvalidValue => AppError::Validation(e.to_string()),
            RatingError::RecipeNotFound => AppError::NotFound(e.to_string()),
            RatingError::UnknownRater => AppError::Unauthorized(e.to_string()),
            RatingError::Internal(inner) => AppError::Internal(inner),
        }
    }
}

pub fn check_rating_value(value: i32) -> Result<i32, RatingError> {
    if (MIN_RATING..=MAX_RATING).contains(&value) {
        Ok(value)
    } else {
        Err(RatingError::InvalidValue)
    }
}

/// Upserts the caller's rating and returns the recipe's new average.
pub async fn add_or_update_rating(
    db: &PgPool,
    recipe_id: Uuid,
    user_id: Uuid,
    value: i32,
) -> Result<f64, RatingError> {
    let value = check_rating_value(value)?;

    repo::upsert_rating(db, recipe_id, user_id, value)
        .await
        .map_err(|e| match violated_foreign_key(&e) {
            Some(RECIPE_FK) => RatingError::RecipeNotFound,
            Some(RATER_FK) => RatingError::UnknownRater,
            _ => RatingError::Internal(anyhow::Error::new(e).context("upsert rating")),
        })?;
    info!(%recipe_id, %user_id, value, "rating saved");

    Ok(repo::average_rating(db, recipe_id).await?)
}

pub async fn average_rating(db: &PgPool, recipe_id: Uuid) -> Result<f64, RatingError> {
    Ok(repo::average_rating(db, recipe_id).await?)
}

/// The caller's own rating, or 0 if they have not rated.
pub async fn user_rating(db: &PgPool, recipe_id: Uuid, user_id: Uuid) -> Result<i32, RatingError> {
    Ok(repo::user_rating(db, recipe_id, user_id).await?.unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::Role;
    use crate::recipes::{repo_types::RecipeInput, Recipe};
    use crate::test_support;

    #[test]
    fn rating_bounds() {
        for ok in 1..=5 {
            assert_eq!(check_rating_value(ok).unwrap(), ok);
        }
        for bad in [-1, 0, 6, 100] {
            assert!(matches!(check_rating_value(bad), Err(RatingError::InvalidValue)));
        }
    }

    #[tokio::test]
    async fn out_of_range_fails_before_touching_db() {
        // the lazy pool would fail to connect if it were used
        let state = crate::state::AppState::fake();
        let err = add_or_update_rating(&state.db, Uuid::new_v4(), Uuid::new_v4(), 6)
            .await
            .unwrap_err();
        assert!(matches!(err, RatingError::InvalidValue));
    }

    async fn seeded_recipe(db: &PgPool) -> (Uuid, Uuid) {
        let owner = test_support::user(db, Role::User).await;
        let input = RecipeInput {
            title: "Lemon tart".into(),
            ingredients: "lemons, butter, sugar".into(),
            steps: "bake".into(),
            image_url: None,
            cooking_time: None,
            servings: Some(4),
            category_id: test_support::any_category(db).await,
        };
        let id = Recipe::insert(db, owner.id, &input).await.unwrap();
        (id, owner.id)
    }

    #[tokio::test]
    async fn unrated_recipe_averages_zero() {
        let Some(db) = test_support::db().await else { return };
        let (recipe_id, _) = seeded_recipe(&db).await;
        assert_eq!(average_rating(&db, recipe_id).await.unwrap(), 0.0);
        assert_eq!(average_rating(&db, Uuid::new_v4()).await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn second_rating_overwrites_first() {
        let Some(db) = test_support::db().await else { return };
        let (recipe_id, _) = seeded_recipe(&db).await;
        let rater = test_support::user(&db, Role::User).await;

        assert_eq!(add_or_update_rating(&db, recipe_id, rater.id, 5).await.unwrap(), 5.0);
        assert_eq!(add_or_update_rating(&db, recipe_id, rater.id, 3).await.unwrap(), 3.0);

        let (rows,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM ratings WHERE recipe_id = $1 AND user_id = $2")
                .bind(recipe_id)
                .bind(rater.id)
                .fetch_one(&db)
                .await
                .unwrap();
        assert_eq!(rows, 1);
        assert_eq!(user_rating(&db, recipe_id, rater.id).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn invalid_rating_leaves_average_unchanged() {
        let Some(db) = test_support::db().await else { return };
        let (recipe_id, _) = seeded_recipe(&db).await;
        let a = test_support::user(&db, Role::User).await;
        let b = test_support::user(&db, Role::User).await;

        add_or_update_rating(&db, recipe_id, a.id, 4).await.unwrap();
        add_or_update_rating(&db, recipe_id, b.id, 1).await.unwrap();
        assert_eq!(average_rating(&db, recipe_id).await.unwrap(), 2.5);

        assert!(add_or_update_rating(&db, recipe_id, a.id, 0).await.is_err());
        assert_eq!(average_rating(&db, recipe_id).await.unwrap(), 2.5);
        assert_eq!(user_rating(&db, recipe_id, a.id).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn rating_unknown_recipe_is_not_found() {
        let Some(db) = test_support::db().await else { return };
        let rater = test_support::user(&db, Role::User).await;
        let err = add_or_update_rating(&db, Uuid::new_v4(), rater.id, 4).await.unwrap_err();
        assert!(matches!(err, RatingError::RecipeNotFound));
    }

    #[tokio::test]
    async fn deleted_rater_is_unauthorized() {
        let Some(db) = test_support::db().await else { return };
        let (recipe_id, _) = seeded_recipe(&db).await;
        let ghost = test_support::user(&db, Role::User).await;
        crate::admin::repo::delete_user(&db, ghost.id).await.unwrap();

        let err = add_or_update_rating(&db, recipe_id, ghost.id, 4).await.unwrap_err();
        assert!(matches!(err, RatingError::UnknownRater));
        assert_eq!(AppError::from(err).status(), axum::http::StatusCode::UNAUTHORIZED);
    }
}
