use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::repo_types::User;

const USER_COLUMNS: &str =
    "id, full_name, email, password_hash, role, created_at, last_login";

impl User {
    /// Find a user by (already normalized) email.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    /// Inserts a new `User`-role account. The raw `sqlx::Error` is returned so
    /// callers can tell a duplicate email apart.
    pub async fn create(
        db: &PgPool,
        full_name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (full_name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(full_name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(db)
        .await
    }

    /// Stamps `last_login` with the current time and returns the fresh row.
    pub async fn touch_last_login(db: &PgPool, id: Uuid) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET last_login = now() WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .fetch_one(db)
        .await
        .context("update last_login")?;
        Ok(user)
    }

    /// Promotes the listed accounts to `Admin`; returns how many changed.
    pub async fn promote_admins(db: &PgPool, emails: &[String]) -> anyhow::Result<u64> {
        if emails.is_empty() {
            return Ok(0);
        }
        let res = sqlx::query(
            "UPDATE users SET role = 'Admin' WHERE email = ANY($1) AND role <> 'Admin'",
        )
        .bind(emails)
        .execute(db)
        .await
        .context("promote admins")?;
        Ok(res.rows_affected())
    }
}
