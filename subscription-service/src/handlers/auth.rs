use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use service_core::error::AppError;

use crate::dtos::auth::{AuthPayload, LoginRequest, RegisterRequest};
use crate::dtos::ApiResponse;
use crate::services::Session;
use crate::utils::ValidatedJson;
use crate::AppState;

fn session_response(session: Session) -> ApiResponse<AuthPayload> {
    ApiResponse::with_token(
        AuthPayload {
            user: session.user.into(),
        },
        session.token,
    )
}

pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = state.auth.register(req).await?;
    Ok((StatusCode::CREATED, Json(session_response(session))))
}

pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = state.auth.login(req).await?;
    Ok(Json(session_response(session)))
}
