use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use super::services;
use crate::{
    auth::extractors::AuthUser,
    error::AppResult,
    extract::{AppJson, AppPath},
    state::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingRequest {
    pub rating_value: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSubmitted {
    pub message: &'static str,
    pub average_rating: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AverageRating {
    pub average_rating: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRating {
    pub rating_value: i32,
}

pub fn rating_routes() -> Router<AppState> {
    Router::new()
        .route("/rating/:recipe_id", post(rate_recipe))
        .route("/rating/:recipe_id/average", get(get_average))
        .route("/rating/:recipe_id/user", get(get_user_rating))
}

#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn rate_recipe(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(recipe_id): AppPath<Uuid>,
    AppJson(body): AppJson<RatingRequest>,
) -> AppResult<Json<RatingSubmitted>> {
    let average_rating =
        services::add_or_update_rating(&state.db, recipe_id, user.id, body.rating_value).await?;
    Ok(Json(RatingSubmitted {
        message: "Rating submitted successfully",
        average_rating,
    }))
}

#[instrument(skip(state))]
pub async fn get_average(
    State(state): State<AppState>,
    AppPath(recipe_id): AppPath<Uuid>,
) -> AppResult<Json<AverageRating>> {
    let average_rating = services::average_rating(&state.db, recipe_id).await?;
    Ok(Json(AverageRating { average_rating }))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn get_user_rating(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(recipe_id): AppPath<Uuid>,
) -> AppResult<Json<UserRating>> {
    let rating_value = services::user_rating(&state.db, recipe_id, user.id).await?;
    Ok(Json(UserRating { rating_value }))
}
