// src/web/dashboard_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::dashboard::DashboardStats,
    services::{dashboard_service, user_service},
    state::AppState,
    web::extract::{optional_text, parse_id},
};
use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DashboardQuery {
    clerk_id: Option<String>,
    user_id: Option<String>,
}

/// GET /api/dashboard?clerkId=… or ?userId=…
pub async fn dashboard_handler(
    State(state): State<AppState>,
    Query(params): Query<DashboardQuery>,
) -> AppResult<Json<DashboardStats>> {
    let found = if let Some(clerk_id) = optional_text(params.clerk_id.as_deref()) {
        user_service::find_user_by_clerk_id(&state.db_pool, &clerk_id).await?
    } else if let Some(raw_id) = optional_text(params.user_id.as_deref()) {
        user_service::find_user_by_id(&state.db_pool, parse_id(&raw_id)?).await?
    } else {
        return Err(AppError::validation("MISSING_USER", "clerkId or userId is required"));
    };
    let user = found.ok_or_else(|| AppError::not_found("USER_NOT_FOUND", "User not found"))?;

    let stats = dashboard_service::stats_for(&state.db_pool, &user, Utc::now().date_naive()).await?;
    Ok(Json(stats))
}
