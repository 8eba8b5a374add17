use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;
use uuid::Uuid;

use super::{
    claims::Role,
    jwt::{JwtKeys, TokenError},
};
use crate::error::AppError;

/// Identity decoded from a valid bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

        // Expect "Bearer <token>"
        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or_else(|| AppError::Unauthorized("Invalid Authorization header".into()))?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token.trim()).map_err(|e| {
            warn!(error = %e, "rejected bearer token");
            match e {
                TokenError::Expired => AppError::Unauthorized("Token expired".into()),
                TokenError::Invalid => AppError::Unauthorized("Invalid token".into()),
            }
        })?;

        Ok(AuthUser {
            id: claims.sub,
            email: claims.email,
            name: claims.name,
            role: claims.role,
        })
    }
}

/// An authenticated caller holding the `Admin` role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != Role::Admin {
            warn!(user_id = %user.id, role = %user.role, "admin route denied");
            return Err(AppError::Forbidden("Admin role required".into()));
        }
        Ok(AdminUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::tests::{test_config, test_user};
    use axum::http::{header::AUTHORIZATION, Request, StatusCode};

    #[derive(Clone)]
    struct KeysOnly(JwtKeys);

    impl FromRef<KeysOnly> for JwtKeys {
        fn from_ref(s: &KeysOnly) -> Self {
            s.0.clone()
        }
    }

    fn state() -> KeysOnly {
        KeysOnly(JwtKeys::new(&test_config("secret", "iss", "aud")))
    }

    fn parts(auth: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(v) = auth {
            builder = builder.header(AUTHORIZATION, v);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized() {
        let err = AuthUser::from_request_parts(&mut parts(None), &state()).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn wrong_scheme_is_unauthorized() {
        let err = AuthUser::from_request_parts(&mut parts(Some("Basic abc")), &state())
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn valid_token_yields_identity() {
        let st = state();
        let user = test_user(Role::User);
        let token = st.0.sign(&user).unwrap();
        let header = format!("Bearer {token}");
        let auth = AuthUser::from_request_parts(&mut parts(Some(&header)), &st).await.unwrap();
        assert_eq!(auth.id, user.id);
        assert_eq!(auth.name, "Alice Baker");
        assert_eq!(auth.role, Role::User);
    }

    #[tokio::test]
    async fn admin_gate_checks_role() {
        let st = state();
        let header = format!("Bearer {}", st.0.sign(&test_user(Role::User)).unwrap());
        let err = AdminUser::from_request_parts(&mut parts(Some(&header)), &st).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);

        let header = format!("Bearer {}", st.0.sign(&test_user(Role::Admin)).unwrap());
        let AdminUser(admin) = AdminUser::from_request_parts(&mut parts(Some(&header)), &st)
            .await
            .unwrap();
        assert_eq!(admin.role, Role::Admin);
    }

    #[tokio::test]
    async fn admin_gate_without_token_is_unauthorized() {
        let err = AdminUser::from_request_parts(&mut parts(None), &state()).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }
}
