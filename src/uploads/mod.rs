mod handlers;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub use handlers::MAX_UPLOAD_BYTES;

pub fn router() -> Router<AppState> {
    handlers::upload_routes()
}
