use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, instrument};
use uuid::Uuid;

use super::repo::Comment;
use crate::{
    auth::extractors::AuthUser,
    error::{violated_foreign_key, AppError, AppResult},
    extract::{AppJson, AppPath},
    state::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRequest {
    #[serde(default)]
    pub comment_text: String,
}

#[derive(Debug, Error)]
pub enum CommentError {
    #[error("Comment text is required")]
    EmptyText,
    #[error("Recipe not found")]
    RecipeNotFound,
    #[error("User not found")]
    UnknownAuthor,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<CommentError> for AppError {
    fn from(e: CommentError) -> Self {
        match e {
            CommentError::EmptyText => AppError::Validation(e.to_string()),
            CommentError::RecipeNotFound => AppError::NotFound(e.to_string()),
            CommentError::UnknownAuthor => AppError::Unauthorized(e.to_string()),
            CommentError::Internal(inner) => AppError::Internal(inner),
        }
    }
}

const RECIPE_FK: &str = "comments_recipe_id_fkey";
const AUTHOR_FK: &str = "comments_user_id_fkey";

pub(crate) fn classify_insert(e: sqlx::Error) -> CommentError {
    match violated_foreign_key(&e) {
        Some(RECIPE_FK) => CommentError::RecipeNotFound,
        Some(AUTHOR_FK) => CommentError::UnknownAuthor,
        _ => CommentError::Internal(anyhow::Error::new(e).context("insert comment")),
    }
}

/// Comments have no route of their own, so `Location` names the recipe's
/// comment list.
pub(crate) fn comment_location(recipe_id: Uuid) -> String {
    format!("/api/comment/{recipe_id}")
}

pub fn comment_routes() -> Router<AppState> {
    Router::new().route("/comment/:recipe_id", get(list_comments).post(add_comment))
}

#[instrument(skip(state))]
pub async fn list_comments(
    State(state): State<AppState>,
    AppPath(recipe_id): AppPath<Uuid>,
) -> AppResult<Json<Vec<Comment>>> {
    Ok(Json(Comment::list_for_recipe(&state.db, recipe_id).await?))
}

pub(crate) fn comment_text(req: CommentRequest) -> Result<String, CommentError> {
    let text = req.comment_text.trim();
    if text.is_empty() {
        return Err(CommentError::EmptyText);
    }
    Ok(text.to_string())
}

#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn add_comment(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(recipe_id): AppPath<Uuid>,
    AppJson(body): AppJson<CommentRequest>,
) -> AppResult<impl IntoResponse> {
    let text = comment_text(body)?;
    let comment = Comment::insert(&state.db, recipe_id, user.id, &text)
        .await
        .map_err(classify_insert)?;
    info!(comment_id = %comment.comment_id, %recipe_id, "comment added");

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, comment_location(recipe_id))],
        Json(comment),
    ))
}
