use crate::state::AppState;
use axum::Router;

pub mod claims;
mod dto;
pub mod extractors;
mod handlers;
pub mod jwt;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod services;

pub use dto::PublicUser;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
