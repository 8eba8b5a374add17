mod dto;
mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub use repo_types::Recipe;

pub fn router() -> Router<AppState> {
    handlers::recipe_routes()
}
