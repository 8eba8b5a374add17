use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::RecipeForm,
    repo_types::{Recipe, RecipeInput},
};
use crate::{
    error::{violated_foreign_key, AppError},
    state::AppState,
    uploads::services::{discard_image, store_image, StoredImage},
};

#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("{0}")]
    Validation(String),
    #[error("Unknown category")]
    UnknownCategory,
    /// The token's user was deleted after it was issued.
    #[error("User not found")]
    UnknownAuthor,
    #[error("Recipe not found")]
    NotFound,
    /// Covers both a missing recipe and one owned by someone else.
    #[error("Recipe not found or you don't have permission to {0} it")]
    NotFoundOrForbidden(&'static str),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<RecipeError> for AppError {
    fn from(e: RecipeError) -> Self {
        match e {
            RecipeError::Validation(msg) => AppError::Validation(msg),
            RecipeError::UnknownCategory => AppError::Validation(e.to_string()),
            RecipeError::UnknownAuthor => AppError::Unauthorized(e.to_string()),
            RecipeError::NotFound | RecipeError::NotFoundOrForbidden(_) => {
                AppError::NotFound(e.to_string())
            }
            RecipeError::Internal(inner) => AppError::Internal(inner),
        }
    }
}

impl From<crate::uploads::services::UploadError> for RecipeError {
    fn from(e: crate::uploads::services::UploadError) -> Self {
        use crate::uploads::services::UploadError;
        match e {
            UploadError::Internal(inner) => RecipeError::Internal(inner),
            other => RecipeError::Validation(other.to_string()),
        }
    }
}

const CATEGORY_FK: &str = "recipes_category_id_fkey";
const AUTHOR_FK: &str = "recipes_user_id_fkey";

fn classify_write(e: sqlx::Error) -> RecipeError {
    match violated_foreign_key(&e) {
        Some(CATEGORY_FK) => RecipeError::UnknownCategory,
        Some(AUTHOR_FK) => RecipeError::UnknownAuthor,
        _ => RecipeError::Internal(anyhow::Error::new(e).context("write recipe")),
    }
}

/// Reads one recipe and bumps its view counter.
pub async fn view_recipe(state: &AppState, id: Uuid) -> Result<Recipe, RecipeError> {
    let mut recipe = Recipe::find(&state.db, id).await?.ok_or(RecipeError::NotFound)?;
    // Separate statement; a failed bump never fails the read.
    match Recipe::increment_views(&state.db, id).await {
        Ok(()) => recipe.views += 1,
        Err(e) => warn!(error = %e, recipe_id = %id, "view increment failed"),
    }
    Ok(recipe)
}

/// Validates the form and stores the uploaded image, if any. The uploaded
/// image takes precedence over a submitted `imageUrl`.
async fn prepare(
    state: &AppState,
    form: RecipeForm,
) -> Result<(RecipeInput, Option<StoredImage>), RecipeError> {
    let mut input = form.validate()?;
    let stored = match form.image {
        Some(item) => Some(store_image(state.images.as_ref(), item).await?),
        None => None,
    };
    if let Some(img) = &stored {
        input.image_url = Some(img.url.clone());
    }
    Ok((input, stored))
}

async fn discard(state: &AppState, stored: Option<StoredImage>) {
    if let Some(img) = stored {
        discard_image(state.images.as_ref(), &img).await;
    }
}

pub async fn create_recipe(
    state: &AppState,
    user_id: Uuid,
    form: RecipeForm,
) -> Result<Recipe, RecipeError> {
    let (input, stored) = prepare(state, form).await?;

    let id = match Recipe::insert(&state.db, user_id, &input).await {
        Ok(id) => id,
        Err(e) => {
            discard(state, stored).await;
            return Err(classify_write(e));
        }
    };
    info!(recipe_id = %id, %user_id, "recipe created");

    Recipe::find(&state.db, id).await?.ok_or(RecipeError::NotFound)
}

/// Ownership-scoped update: succeeds only for the owner.
pub async fn update_recipe(
    state: &AppState,
    id: Uuid,
    user_id: Uuid,
    form: RecipeForm,
) -> Result<Recipe, RecipeError> {
    let (input, stored) = prepare(state, form).await?;

    match Recipe::update_owned(&state.db, id, user_id, &input).await {
        Ok(0) => {
            warn!(recipe_id = %id, %user_id, "update matched no owned recipe");
            discard(state, stored).await;
            return Err(RecipeError::NotFoundOrForbidden("edit"));
        }
        Ok(_) => {}
        Err(e) => {
            discard(state, stored).await;
            return Err(classify_write(e));
        }
    }
    info!(recipe_id = %id, %user_id, "recipe updated");

    Recipe::find(&state.db, id).await?.ok_or(RecipeError::NotFound)
}

/// Ownership-scoped delete.
pub async fn delete_recipe(state: &AppState, id: Uuid, user_id: Uuid) -> Result<(), RecipeError> {
    if Recipe::delete_owned(&state.db, id, user_id).await? == 0 {
        warn!(recipe_id = %id, %user_id, "delete matched no owned recipe");
        return Err(RecipeError::NotFoundOrForbidden("delete"));
    }
    info!(recipe_id = %id, %user_id, "recipe deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::Role;
    use crate::test_support;
    use axum::http::StatusCode;

    fn form(title: &str, category_id: Uuid) -> RecipeForm {
        let mut f = RecipeForm::default();
        f.set_text("title", title.into());
        f.set_text("ingredients", "tomato, basil, pasta".into());
        f.set_text("steps", "boil; toss".into());
        f.set_text("cookingTime", "20".into());
        f.set_text("categoryId", category_id.to_string());
        f
    }

    #[test]
    fn ownership_failures_are_not_found() {
        let err: AppError = RecipeError::NotFoundOrForbidden("delete").into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            err.to_string(),
            "Recipe not found or you don't have permission to delete it"
        );
        assert_eq!(AppError::from(RecipeError::UnknownCategory).status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn invalid_form_fails_before_any_io() {
        let state = AppState::fake();
        let mut f = RecipeForm::default();
        f.set_text("title", "No category".into());
        let err = create_recipe(&state, Uuid::new_v4(), f).await.unwrap_err();
        assert!(matches!(err, RecipeError::Validation(_)));
    }

    #[tokio::test]
    async fn non_owner_cannot_update_or_delete() {
        let Some(db) = test_support::db().await else { return };
        let state = AppState::fake_with_db(db.clone());
        let alice = test_support::user(&db, Role::User).await;
        let bob = test_support::user(&db, Role::User).await;
        let category = test_support::any_category(&db).await;

        let recipe = create_recipe(&state, alice.id, form("Pasta", category)).await.unwrap();
        assert_eq!(recipe.author_name, "Test Cook");
        assert_eq!(recipe.average_rating, 0.0);

        let err = update_recipe(&state, recipe.recipe_id, bob.id, form("Hijacked", category))
            .await
            .unwrap_err();
        assert!(matches!(err, RecipeError::NotFoundOrForbidden("edit")));

        let err = delete_recipe(&state, recipe.recipe_id, bob.id).await.unwrap_err();
        assert!(matches!(err, RecipeError::NotFoundOrForbidden("delete")));

        let after = Recipe::find(&db, recipe.recipe_id).await.unwrap().unwrap();
        assert_eq!(after.title, "Pasta");
        assert_eq!(after.ingredients, recipe.ingredients);
        assert_eq!(after.steps, recipe.steps);
        assert_eq!(after.cooking_time, recipe.cooking_time);
        assert_eq!(after.updated_at, recipe.updated_at);

        let updated = update_recipe(&state, recipe.recipe_id, alice.id, form("Better pasta", category))
            .await
            .unwrap();
        assert_eq!(updated.title, "Better pasta");

        delete_recipe(&state, recipe.recipe_id, alice.id).await.unwrap();
        assert!(Recipe::find(&db, recipe.recipe_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_recipe_is_indistinguishable() {
        let Some(db) = test_support::db().await else { return };
        let state = AppState::fake_with_db(db.clone());
        let alice = test_support::user(&db, Role::User).await;
        let err = delete_recipe(&state, Uuid::new_v4(), alice.id).await.unwrap_err();
        assert!(matches!(err, RecipeError::NotFoundOrForbidden(_)));
    }

    #[tokio::test]
    async fn unknown_category_is_rejected() {
        let Some(db) = test_support::db().await else { return };
        let state = AppState::fake_with_db(db.clone());
        let alice = test_support::user(&db, Role::User).await;
        let err = create_recipe(&state, alice.id, form("Ghost", Uuid::new_v4())).await.unwrap_err();
        assert!(matches!(err, RecipeError::UnknownCategory));
    }

    #[tokio::test]
    async fn deleted_author_cannot_create() {
        let Some(db) = test_support::db().await else { return };
        let state = AppState::fake_with_db(db.clone());
        let ghost = test_support::user(&db, Role::User).await;
        let category = test_support::any_category(&db).await;
        crate::admin::repo::delete_user(&db, ghost.id).await.unwrap();

        let err = create_recipe(&state, ghost.id, form("Orphan", category)).await.unwrap_err();
        assert!(matches!(err, RecipeError::UnknownAuthor));
        assert_eq!(AppError::from(err).status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn viewing_counts() {
        let Some(db) = test_support::db().await else { return };
        let state = AppState::fake_with_db(db.clone());
        let alice = test_support::user(&db, Role::User).await;
        let category = test_support::any_category(&db).await;
        let recipe = create_recipe(&state, alice.id, form("Soup", category)).await.unwrap();

        assert_eq!(view_recipe(&state, recipe.recipe_id).await.unwrap().views, 1);
        assert_eq!(view_recipe(&state, recipe.recipe_id).await.unwrap().views, 2);
        assert!(matches!(view_recipe(&state, Uuid::new_v4()).await, Err(RecipeError::NotFound)));
    }
}
