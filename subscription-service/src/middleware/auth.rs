use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;

use crate::{models::User, AppState};

const NOT_LOGGED_IN: &str = "You are not logged in! Please log in to get access.";

/// Requires a valid bearer token whose subject still exists. The stored user,
/// not the token claims, is what handlers see, so role changes apply on the
/// next request.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!(NOT_LOGGED_IN)))?;

    let claims = state.auth.jwt().validate_access_token(token)?;

    let user = state
        .users
        .find_by_id(&claims.sub)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| {
            AppError::Unauthorized(anyhow::anyhow!(
                "The user belonging to this token no longer exists."
            ))
        })?;

    tracing::Span::current().record("user_id", user.id.as_str());
    req.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(req).await)
}

/// The authenticated user, placed in request extensions by [`auth_middleware`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!(NOT_LOGGED_IN)))
    }
}

/// An authenticated user with the `admin` role; anyone else gets 403.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        if !user.is_admin() {
            tracing::warn!(user_id = %user.id, "Non-admin attempted an admin action");
            return Err(AppError::Forbidden(anyhow::anyhow!(
                "You do not have permission to perform this action"
            )));
        }

        Ok(AdminUser(user))
    }
}
