// src/web/user_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        pagination::Pagination,
        user::{NewUser, Role, User, UserChanges, UserFilter},
    },
    services::{code_service, qr_service, user_service},
    state::AppState,
    web::extract::{
        double_option, is_valid_email, non_blank, nullable_text, optional_text, parse_id, required_text,
        search_term, ApiJson,
    },
};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 100;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UserListQuery {
    clerk_id: Option<String>,
    limit: Option<String>,
    offset: Option<String>,
    search: Option<String>,
    role: Option<String>,
}

#[derive(Serialize)]
pub struct UserPage {
    data: Vec<User>,
    pagination: PageInfo,
}

#[derive(Serialize)]
pub struct PageInfo {
    limit: i64,
    offset: i64,
    total: i64,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserBody {
    email: Option<String>,
    full_name: Option<String>,
    role: Option<String>,
    clerk_id: Option<String>,
    qr_code: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserBody {
    email: Option<String>,
    full_name: Option<String>,
    role: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    clerk_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    qr_code: Option<Option<String>>,
}

fn parse_role(raw: &str) -> AppResult<Role> {
    raw.parse::<Role>().map_err(|_| {
        AppError::validation("INVALID_ROLE", "Invalid role. Must be 'principal', 'teacher', or 'student'")
    })
}

fn normalize_email(raw: &str) -> AppResult<String> {
    let email = raw.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(AppError::validation("INVALID_EMAIL_FORMAT", "Invalid email format"));
    }
    Ok(email)
}

fn user_not_found() -> AppError {
    AppError::not_found("USER_NOT_FOUND", "User not found")
}

/// GET /api/users — paginated list, or a single user with `?clerkId=`.
pub async fn list_users_handler(
    State(state): State<AppState>,
    Query(params): Query<UserListQuery>,
) -> AppResult<Response> {
    if let Some(clerk_id) = optional_text(params.clerk_id.as_deref()) {
        let user = user_service::find_user_by_clerk_id(&state.db_pool, &clerk_id)
            .await?
            .ok_or_else(user_not_found)?;
        return Ok(Json(user).into_response());
    }

    let page = Pagination::parse(params.limit.as_deref(), params.offset.as_deref(), DEFAULT_LIMIT, MAX_LIMIT);
    let filter = UserFilter {
        search: search_term(params.search.as_deref()),
        role: optional_text(params.role.as_deref()).map(|r| parse_role(&r)).transpose()?,
    };

    let (data, total) = user_service::list_users(&state.db_pool, &filter, page).await?;
    Ok(Json(UserPage {
        data,
        pagination: PageInfo { limit: page.limit, offset: page.offset, total },
    })
    .into_response())
}

/// GET /api/users/{id}
pub async fn get_user_handler(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<Json<User>> {
    let user_id = parse_id(&id)?;
    let user = user_service::find_user_by_id(&state.db_pool, user_id)
        .await?
        .ok_or_else(user_not_found)?;
    Ok(Json(user))
}

/// POST /api/users
pub async fn create_user_handler(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateUserBody>,
) -> AppResult<(StatusCode, Json<User>)> {
    let email = body
        .email
        .as_deref()
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| AppError::validation("MISSING_EMAIL", "Email is required"))?;
    let full_name = required_text(
        body.full_name.as_deref(),
        "MISSING_FULL_NAME",
        "Full name is required and cannot be empty",
    )?;
    let role = optional_text(body.role.as_deref())
        .ok_or_else(|| AppError::validation("MISSING_ROLE", "Role is required"))?;

    let new_user = NewUser {
        email: normalize_email(email)?,
        full_name,
        role: parse_role(&role)?,
        clerk_id: optional_text(body.clerk_id.as_deref()),
        qr_code: optional_text(body.qr_code.as_deref()),
    };

    let user = user_service::create_user(&state.db_pool, &new_user).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// PUT /api/users/{id}
pub async fn update_user_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateUserBody>,
) -> AppResult<Json<User>> {
    let user_id = parse_id(&id)?;

    let changes = UserChanges {
        email: body.email.as_deref().map(normalize_email).transpose()?,
        full_name: non_blank(body.full_name.as_deref(), "INVALID_FULL_NAME", "Full name cannot be empty")?,
        role: body.role.as_deref().map(parse_role).transpose()?,
        clerk_id: nullable_text(&body.clerk_id),
        qr_code: nullable_text(&body.qr_code),
    };

    let user = user_service::update_user(&state.db_pool, user_id, &changes).await?;
    Ok(Json(user))
}

/// DELETE /api/users/{id}
pub async fn delete_user_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let user_id = parse_id(&id)?;
    let user = user_service::delete_user(&state.db_pool, user_id).await?;
    Ok(Json(json!({ "message": "User deleted successfully", "user": user })))
}

/// GET /api/users/{id}/qr-code — the student's scan code as SVG.
pub async fn user_qr_code_handler(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<Response> {
    let user_id = parse_id(&id)?;
    let user = user_service::find_user_by_id(&state.db_pool, user_id)
        .await?
        .ok_or_else(user_not_found)?;
    let student = code_service::ensure_scan_code(&state.db_pool, user).await?;
    let code = student.qr_code.ok_or(AppError::InternalServerError)?;

    let svg = qr_service::render_svg(&code)?;
    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response())
}
