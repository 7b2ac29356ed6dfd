use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use std::collections::HashMap;

use crate::dtos::users::{CreateUserRequest, UpdateUserRequest, UserResponse};
use crate::dtos::{document_to_json, ApiResponse};
use crate::middleware::{AdminUser, CurrentUser};
use crate::utils::ValidatedJson;
use crate::AppState;

pub async fn list_users(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let page = state.users.list(&params).await?;
    let data: Vec<_> = page.items.into_iter().map(document_to_json).collect();
    Ok(Json(ApiResponse::list(data, page.total)))
}

pub async fn get_user(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.users.get(&id).await?;
    Ok(Json(ApiResponse::success(UserResponse::from(user))))
}

pub async fn create_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ValidatedJson(req): ValidatedJson<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.users.create_from(req).await?;
    tracing::info!(admin_id = %admin.id, user_id = %user.id, "Admin created user");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(UserResponse::from(user))),
    ))
}

pub async fn update_user(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.users.update(&id, req).await?;
    Ok(Json(ApiResponse::success(UserResponse::from(user))))
}

pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.users.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
