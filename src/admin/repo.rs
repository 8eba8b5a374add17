use anyhow::Context;
use serde::Serialize;
use sqlx::{FromRow, PgExecutor, PgPool};
use uuid::Uuid;

use crate::auth::repo_types::User;

/// Users who logged in within this many days count as active.
pub const ACTIVE_WINDOW_DAYS: i32 = 30;
/// Length of the per-day activity series.
pub const STATS_WINDOW_DAYS: i32 = 7;
pub const MOST_VIEWED_LIMIT: i64 = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromRow)]
pub struct UserCounts {
    pub total: i64,
    pub active: i64,
    pub inactive: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct DateCount {
    pub date: String, // YYYY-MM-DD
    pub count: i64,
}

pub async fn list_users(db: &PgPool) -> anyhow::Result<Vec<User>> {
    let rows = sqlx::query_as::<_, User>(
        r#"
        SELECT id, full_name, email, password_hash, role, created_at, last_login
          FROM users
         ORDER BY created_at DESC
        "#,
    )
    .fetch_all(db)
    .await
    .context("list users")?;
    Ok(rows)
}

/// Owned recipes, comments and ratings go with the user (ON DELETE CASCADE).
pub async fn delete_user(db: &PgPool, id: Uuid) -> anyhow::Result<u64> {
    let res = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(db)
        .await
        .context("delete user")?;
    Ok(res.rows_affected())
}

pub async fn user_counts<'e>(db: impl PgExecutor<'e>) -> anyhow::Result<UserCounts> {
    let counts = sqlx::query_as::<_, UserCounts>(
        r#"
        SELECT COUNT(*) AS total,
               COUNT(*) FILTER (WHERE last_login >= now() - make_interval(days => $1)) AS active,
               COUNT(*) FILTER (WHERE last_login IS NULL OR last_login < now() - make_interval(days => $1)) AS inactive
          FROM users
        "#,
    )
    .bind(ACTIVE_WINDOW_DAYS)
    .fetch_one(db)
    .await
    .context("count users")?;
    Ok(counts)
}

pub async fn recipe_count<'e>(db: impl PgExecutor<'e>) -> anyhow::Result<i64> {
    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM recipes")
        .fetch_one(db)
        .await
        .context("count recipes")?;
    Ok(n)
}

/// Per-day counts of a timestamp column over the recent window, oldest first.
/// `table` and `column` are fixed identifiers, never user input.
async fn daily_counts<'e>(
    db: impl PgExecutor<'e>,
    table: &str,
    column: &str,
) -> anyhow::Result<Vec<DateCount>> {
    let sql = format!(
        r#"
        SELECT to_char(({column} AT TIME ZONE 'UTC')::date, 'YYYY-MM-DD') AS date, COUNT(*) AS count
          FROM {table}
         WHERE {column} >= (now() AT TIME ZONE 'UTC')::date - $1
         GROUP BY 1
         ORDER BY 1
        "#
    );
    let rows = sqlx::query_as::<_, DateCount>(&sql)
        .bind(STATS_WINDOW_DAYS)
        .fetch_all(db)
        .await
        .with_context(|| format!("daily counts for {table}.{column}"))?;
    Ok(rows)
}

pub async fn registrations_per_day<'e>(db: impl PgExecutor<'e>) -> anyhow::Result<Vec<DateCount>> {
    daily_counts(db, "users", "created_at").await
}

pub async fn recipes_per_day<'e>(db: impl PgExecutor<'e>) -> anyhow::Result<Vec<DateCount>> {
    daily_counts(db, "recipes", "created_at").await
}

/// Based on each user's latest login only.
pub async fn logins_per_day<'e>(db: impl PgExecutor<'e>) -> anyhow::Result<Vec<DateCount>> {
    daily_counts(db, "users", "last_login").await
}
