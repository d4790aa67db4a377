use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::request::Parts;

use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt;

/// Authenticated user extracted from the `Authorization: Bearer <token>` header.
///
/// Add this as a handler parameter to require authentication, or take
/// `Option<AuthUser>` on routes where signing in is optional. Ownership checks
/// happen in the handler body by filtering on `user_id`.
pub struct AuthUser {
    pub user_id: i32,
    pub username: String,
}

impl AuthUser {
    fn from_header(parts: &Parts, secret: &str) -> Result<Option<Self>, AppError> {
        let Some(auth_header) = parts.headers.get("Authorization") else {
            return Ok(None);
        };

        let token = auth_header
            .to_str()
            .ok()
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(AppError::TokenInvalid)?;

        let claims = jwt::verify(token, secret).map_err(|_| AppError::TokenInvalid)?;

        Ok(Some(AuthUser {
            user_id: claims.uid,
            username: claims.sub,
        }))
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        AuthUser::from_header(parts, &state.config.auth.jwt_secret)?.ok_or(AppError::TokenMissing)
    }
}

/// A missing header means an anonymous caller; a present but bad token is
/// still rejected.
impl OptionalFromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        AuthUser::from_header(parts, &state.config.auth.jwt_secret)
    }
}
