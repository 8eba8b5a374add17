use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use tracing::{info, instrument};

use super::services::{store_image, UploadError, UploadItem};
use crate::{
    auth::extractors::AuthUser,
    error::{AppError, AppResult},
    state::AppState,
};

pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}

pub fn upload_routes() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload_image))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

/// POST /upload, multipart field `file`.
#[instrument(skip(state, user, mp), fields(user_id = %user.id))]
pub async fn upload_image(
    State(state): State<AppState>,
    user: AuthUser,
    mp: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<UploadResponse>> {
    let mut mp = mp?;
    let mut file = None;
    while let Some(field) = mp
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.body_text()))?
    {
        if field.name() == Some("file") {
            let file_name = field.file_name().map(|s| s.to_string());
            let body = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(e.body_text()))?;
            file = Some(UploadItem { file_name, body });
        }
    }
    let file = file.ok_or(UploadError::Empty)?;

    let stored = store_image(state.images.as_ref(), file).await?;
    info!(name = %stored.name, "image uploaded");
    Ok(Json(UploadResponse { url: stored.url }))
}
