use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::repo::Category;
use crate::{
    error::{AppError, AppResult},
    extract::AppPath,
    state::AppState,
};

pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/category", get(list_categories))
        .route("/category/:id", get(get_category))
}

#[instrument(skip(state))]
pub async fn list_categories(State(state): State<AppState>) -> AppResult<Json<Vec<Category>>> {
    Ok(Json(Category::list(&state.db).await?))
}

#[instrument(skip(state))]
pub async fn get_category(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<Category>> {
    Category::find(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Category not found".into()))
}
