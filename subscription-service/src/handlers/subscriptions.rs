use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use std::collections::HashMap;

use crate::dtos::subscriptions::{CreateSubscriptionRequest, UpdateSubscriptionRequest};
use crate::dtos::{document_to_json, ApiResponse};
use crate::middleware::{AdminUser, CurrentUser};
use crate::utils::ValidatedJson;
use crate::AppState;

pub async fn list_subscriptions(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let page = state.subscriptions.list(&params).await?;
    let data: Vec<_> = page.items.into_iter().map(document_to_json).collect();
    Ok(Json(ApiResponse::list(data, page.total)))
}

pub async fn get_subscription(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let subscription = state.subscriptions.get(&id).await?;
    Ok(Json(ApiResponse::success(subscription)))
}

pub async fn create_subscription(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    ValidatedJson(req): ValidatedJson<CreateSubscriptionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let subscription = state.subscriptions.create(req).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(subscription))))
}

pub async fn update_subscription(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateSubscriptionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let subscription = state.subscriptions.update(&id, req).await?;
    Ok(Json(ApiResponse::success(subscription)))
}

pub async fn delete_subscription(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.subscriptions.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
