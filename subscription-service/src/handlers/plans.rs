use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use std::collections::HashMap;

use crate::dtos::plans::{CreatePlanRequest, PlanResponse, UpdatePlanRequest};
use crate::dtos::{document_to_json, ApiResponse};
use crate::middleware::{AdminUser, CurrentUser};
use crate::utils::ValidatedJson;
use crate::AppState;

pub async fn list_plans(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let page = state.plans.list(&params).await?;
    let data: Vec<_> = page.items.into_iter().map(document_to_json).collect();
    Ok(Json(ApiResponse::list(data, page.total)))
}

pub async fn get_plan(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let plan = state.plans.get(&id).await?;
    Ok(Json(ApiResponse::success(PlanResponse::from(plan))))
}

pub async fn create_plan(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    ValidatedJson(req): ValidatedJson<CreatePlanRequest>,
) -> Result<impl IntoResponse, AppError> {
    let plan = state.plans.create(req).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(PlanResponse::from(plan))),
    ))
}

pub async fn update_plan(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdatePlanRequest>,
) -> Result<impl IntoResponse, AppError> {
    let plan = state.plans.update(&id, req).await?;
    Ok(Json(ApiResponse::success(PlanResponse::from(plan))))
}

pub async fn delete_plan(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.plans.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
