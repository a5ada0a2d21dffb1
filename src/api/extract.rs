//! Bearer-token extractors

use super::AppState;
use crate::core::Actor;
use crate::error::ClinicError;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

/// Raw token from `Authorization: Bearer <token>`
pub struct BearerToken(pub String);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for BearerToken {
    type Rejection = ClinicError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| Self(token.to_string()))
            .ok_or(ClinicError::MissingToken)
    }
}

/// Any signed-in staff member
pub struct AuthUser(pub Actor);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ClinicError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;
        state.context.auth.authenticate(&token).map(Self)
    }
}

/// A signed-in administrator
pub struct AdminUser(pub Actor);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ClinicError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(actor) = AuthUser::from_request_parts(parts, state).await?;
        if !actor.is_admin() {
            return Err(ClinicError::Forbidden(
                "Access denied. Admin privileges required.".to_string(),
            ));
        }
        Ok(Self(actor))
    }
}
