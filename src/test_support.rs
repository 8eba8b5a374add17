//! Helpers for tests that need a real Postgres. They are skipped (the test
//! returns early) unless `TEST_DATABASE_URL` points at a scratch database.

use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use crate::auth::{claims::Role, password::hash_password, repo_types::User};

pub async fn db() -> Option<PgPool> {
    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set; skipping database test");
        return None;
    };
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("connect to TEST_DATABASE_URL");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("run migrations");
    Some(pool)
}

/// Inserts a throwaway user with a unique email.
pub async fn user(db: &PgPool, role: Role) -> User {
    let email = format!("user-{}@example.com", Uuid::new_v4());
    let hash = hash_password("pw123456").unwrap();
    let user = User::create(db, "Test Cook", &email, &hash).await.unwrap();
    if role == Role::Admin {
        User::promote_admins(db, &[email.clone()]).await.unwrap();
        return User::find_by_email(db, &email).await.unwrap().unwrap();
    }
    user
}

pub async fn any_category(db: &PgPool) -> Uuid {
    let (id,): (Uuid,) = sqlx::query_as("SELECT id FROM categories ORDER BY name LIMIT 1")
        .fetch_one(db)
        .await
        .unwrap();
    id
}
