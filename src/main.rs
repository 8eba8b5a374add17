mod admin;
mod app;
mod auth;
mod categories;
mod comments;
mod config;
mod error;
mod extract;
mod ratings;
mod recipes;
mod state;
mod storage;
mod uploads;

#[cfg(test)]
mod test_support;

use anyhow::Context;

use crate::auth::repo_types::User;
use crate::config::AppConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "recipeshare=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    let app_state = AppState::init(config).await?;

    sqlx::migrate!("./migrations")
        .run(&app_state.db)
        .await
        .context("run migrations")?;

    if !app_state.config.admin_emails.is_empty() {
        let promoted = User::promote_admins(&app_state.db, &app_state.config.admin_emails).await?;
        tracing::info!(promoted, "admin roles applied from ADMIN_EMAILS");
    }

    let config = app_state.config.clone();
    app::serve(app::build_app(app_state), &config).await
}
