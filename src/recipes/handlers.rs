use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{RecipeForm, SearchQuery},
    repo_types::Recipe,
    services,
};
use crate::{
    auth::extractors::AuthUser,
    error::{AppError, AppResult},
    extract::{AppPath, AppQuery},
    state::AppState,
    uploads::MAX_UPLOAD_BYTES,
};

pub fn recipe_routes() -> Router<AppState> {
    Router::new()
        .route("/recipe", get(list_recipes).post(create_recipe))
        .route(
            "/recipe/:id",
            get(get_recipe).put(update_recipe).delete(delete_recipe),
        )
        .route("/recipe/user/:user_id", get(list_by_user))
        .route("/recipe/search/title", get(search_by_title))
        .route("/recipe/search/ingredients", get(search_by_ingredients))
        .route("/recipe/search/category/:category_id", get(search_by_category))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

#[instrument(skip(state))]
pub async fn list_recipes(State(state): State<AppState>) -> AppResult<Json<Vec<Recipe>>> {
    Ok(Json(Recipe::list_all(&state.db).await?))
}

#[instrument(skip(state))]
pub async fn get_recipe(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<Recipe>> {
    Ok(Json(services::view_recipe(&state, id).await?))
}

#[instrument(skip(state))]
pub async fn list_by_user(
    State(state): State<AppState>,
    AppPath(user_id): AppPath<Uuid>,
) -> AppResult<Json<Vec<Recipe>>> {
    Ok(Json(Recipe::list_by_user(&state.db, user_id).await?))
}

fn required_query(q: SearchQuery) -> AppResult<String> {
    let query = q.query.trim();
    if query.is_empty() {
        return Err(AppError::Validation("query is required".into()));
    }
    Ok(query.to_string())
}

#[instrument(skip(state))]
pub async fn search_by_title(
    State(state): State<AppState>,
    AppQuery(q): AppQuery<SearchQuery>,
) -> AppResult<Json<Vec<Recipe>>> {
    let query = required_query(q)?;
    Ok(Json(Recipe::search_title(&state.db, &query).await?))
}

#[instrument(skip(state))]
pub async fn search_by_ingredients(
    State(state): State<AppState>,
    AppQuery(q): AppQuery<SearchQuery>,
) -> AppResult<Json<Vec<Recipe>>> {
    let query = required_query(q)?;
    Ok(Json(Recipe::search_ingredients(&state.db, &query).await?))
}

#[instrument(skip(state))]
pub async fn search_by_category(
    State(state): State<AppState>,
    AppPath(category_id): AppPath<Uuid>,
) -> AppResult<Json<Vec<Recipe>>> {
    Ok(Json(Recipe::list_by_category(&state.db, category_id).await?))
}

/// POST /recipe (multipart)
#[instrument(skip(state, user, mp), fields(user_id = %user.id))]
pub async fn create_recipe(
    State(state): State<AppState>,
    user: AuthUser,
    mp: Result<Multipart, MultipartRejection>,
) -> AppResult<impl IntoResponse> {
    let form = RecipeForm::from_multipart(mp?).await?;
    let recipe = services::create_recipe(&state, user.id, form).await?;
    let location = format!("/api/recipe/{}", recipe.recipe_id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(recipe)))
}

/// PUT /recipe/:id (multipart), owner only
#[instrument(skip(state, user, mp), fields(user_id = %user.id))]
pub async fn update_recipe(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
    mp: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<Recipe>> {
    let form = RecipeForm::from_multipart(mp?).await?;
    Ok(Json(services::update_recipe(&state, id, user.id, form).await?))
}

/// DELETE /recipe/:id, owner only
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<StatusCode> {
    services::delete_recipe(&state, id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
