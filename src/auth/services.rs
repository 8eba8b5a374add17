use lazy_static::lazy_static;
use regex::Regex;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, warn};

use super::{
    dto::{AuthResponse, LoginRequest, RegisterRequest},
    jwt::JwtKeys,
    password::{hash_password, verify_password},
    repo_types::User,
};
use crate::error::{is_unique_violation, AppError};

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(&'static str),
    #[error("Email already registered")]
    EmailAlreadyRegistered,
    /// Same outcome for unknown email and wrong password.
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Validation(msg) => AppError::Validation(msg.into()),
            AuthError::EmailAlreadyRegistered => AppError::Conflict(e.to_string()),
            AuthError::InvalidCredentials => AppError::Unauthorized(e.to_string()),
            AuthError::Internal(inner) => AppError::Internal(inner),
        }
    }
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Burns the same Argon2 work a real password check costs, so unknown emails
/// answer as slowly as wrong passwords.
pub(crate) fn verify_against_dummy(password: &str) {
    lazy_static! {
        static ref DUMMY_HASH: Option<String> = hash_password("recipeshare-dummy").ok();
    }
    if let Some(hash) = DUMMY_HASH.as_deref() {
        let _ = verify_password(password, hash);
    }
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Checks a registration payload and returns it normalized.
pub(crate) fn validate_registration(mut req: RegisterRequest) -> Result<RegisterRequest, AuthError> {
    req.email = normalize_email(&req.email);
    req.full_name = req.full_name.trim().to_string();

    if !is_valid_email(&req.email) {
        return Err(AuthError::Validation("Invalid email"));
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation("Password must be at least 8 characters"));
    }
    if req.full_name.is_empty() {
        return Err(AuthError::Validation("Full name is required"));
    }
    Ok(req)
}

pub async fn register(
    db: &PgPool,
    keys: &JwtKeys,
    req: RegisterRequest,
) -> Result<AuthResponse, AuthError> {
    let req = validate_registration(req)?;

    if User::find_by_email(db, &req.email).await?.is_some() {
        warn!(email = %req.email, "email already registered");
        return Err(AuthError::EmailAlreadyRegistered);
    }

    let hash = hash_password(&req.password)?;

    // A concurrent registration can still win between the check and the insert.
    let user = match User::create(db, &req.full_name, &req.email, &hash).await {
        Ok(u) => u,
        Err(e) if is_unique_violation(&e) => {
            warn!(email = %req.email, "email registered concurrently");
            return Err(AuthError::EmailAlreadyRegistered);
        }
        Err(e) => return Err(anyhow::Error::new(e).context("create user").into()),
    };

    let token = keys.sign(&user)?;
    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(AuthResponse::new(token, user))
}

pub async fn login(
    db: &PgPool,
    keys: &JwtKeys,
    req: LoginRequest,
) -> Result<AuthResponse, AuthError> {
    let email = normalize_email(&req.email);

    let Some(user) = User::find_by_email(db, &email).await? else {
        verify_against_dummy(&req.password);
        warn!(email = %email, "login unknown email");
        return Err(AuthError::InvalidCredentials);
    };

    if !verify_password(&req.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AuthError::InvalidCredentials);
    }

    let user = User::touch_last_login(db, user.id).await?;
    let token = keys.sign(&user)?;
    info!(user_id = %user.id, "user logged in");
    Ok(AuthResponse::new(token, user))
}
