use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use super::repo::{self, DateCount, MOST_VIEWED_LIMIT};
use crate::{
    auth::{extractors::AdminUser, PublicUser},
    error::{AppError, AppResult},
    extract::AppPath,
    recipes::Recipe,
    state::AppState,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    pub total_users: i64,
    pub total_recipes: i64,
    pub active_users: i64,
    pub inactive_users: i64,
    pub most_viewed_recipes: Vec<Recipe>,
    pub user_registration_stats: Vec<DateCount>,
    pub recipe_creation_stats: Vec<DateCount>,
    pub login_activity_stats: Vec<DateCount>,
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(list_users))
        .route("/admin/recipes", get(list_recipes))
        .route("/admin/analytics", get(analytics))
        .route("/admin/user/:id", delete(delete_user))
        .route("/admin/recipe/:id", delete(delete_recipe))
}

#[instrument(skip(state, _admin))]
pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> AppResult<Json<Vec<PublicUser>>> {
    let users = repo::list_users(&state.db).await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

#[instrument(skip(state, _admin))]
pub async fn list_recipes(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> AppResult<Json<Vec<Recipe>>> {
    Ok(Json(Recipe::list_all(&state.db).await?))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.0.id))]
pub async fn delete_user(
    State(state): State<AppState>,
    admin: AdminUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<StatusCode> {
    if repo::delete_user(&state.db, id).await? == 0 {
        return Err(AppError::NotFound("User not found".into()));
    }
    info!(user_id = %id, "user deleted by admin");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, admin), fields(admin_id = %admin.0.id))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    admin: AdminUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<StatusCode> {
    if Recipe::delete_any(&state.db, id).await? == 0 {
        return Err(AppError::NotFound("Recipe not found".into()));
    }
    info!(recipe_id = %id, "recipe deleted by admin");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn build_analytics(db: &sqlx::PgPool) -> anyhow::Result<Analytics> {
    let users = repo::user_counts(db).await?;
    Ok(Analytics {
        total_users: users.total,
        total_recipes: repo::recipe_count(db).await?,
        active_users: users.active,
        inactive_users: users.inactive,
        most_viewed_recipes: Recipe::most_viewed(db, MOST_VIEWED_LIMIT).await?,
        user_registration_stats: repo::registrations_per_day(db).await?,
        recipe_creation_stats: repo::recipes_per_day(db).await?,
        login_activity_stats: repo::logins_per_day(db).await?,
    })
}

#[instrument(skip(state, _admin))]
pub async fn analytics(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> AppResult<Json<Analytics>> {
    Ok(Json(build_analytics(&state.db).await?))
}
