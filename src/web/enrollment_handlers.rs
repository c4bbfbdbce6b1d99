// src/web/enrollment_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        enrollment::{Enrollment, EnrollmentChanges, EnrollmentDetails, EnrollmentFilter},
        pagination::Pagination,
    },
    services::enrollment_service,
    state::AppState,
    web::extract::{lenient_filter_id, optional_id, parse_id, required_id, ApiJson, IdField},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentListQuery {
    limit: Option<String>,
    offset: Option<String>,
    student_id: Option<String>,
    class_id: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentBody {
    student_id: Option<IdField>,
    class_id: Option<IdField>,
}

pub async fn list_enrollments_handler(
    State(state): State<AppState>,
    Query(params): Query<EnrollmentListQuery>,
) -> AppResult<Json<Vec<EnrollmentDetails>>> {
    let page = Pagination::parse(params.limit.as_deref(), params.offset.as_deref(), 100, 500);
    let filter = EnrollmentFilter {
        student_id: lenient_filter_id(params.student_id.as_deref()),
        class_id: lenient_filter_id(params.class_id.as_deref()),
    };
    Ok(Json(enrollment_service::list_enrollments(&state.db_pool, &filter, page).await?))
}

pub async fn get_enrollment_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<EnrollmentDetails>> {
    let enrollment_id = parse_id(&id)?;
    let enrollment = enrollment_service::find_enrollment_details(&state.db_pool, enrollment_id)
        .await?
        .ok_or_else(|| AppError::not_found("NOT_FOUND", "Enrollment not found"))?;
    Ok(Json(enrollment))
}

pub async fn create_enrollment_handler(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<EnrollmentBody>,
) -> AppResult<(StatusCode, Json<Enrollment>)> {
    let student_id = required_id(body.student_id.as_ref(), "MISSING_STUDENT_ID", "INVALID_STUDENT_ID", "studentId")?;
    let class_id = required_id(body.class_id.as_ref(), "MISSING_CLASS_ID", "INVALID_CLASS_ID", "classId")?;

    let enrollment = enrollment_service::enroll_student(&state.db_pool, student_id, class_id).await?;
    Ok((StatusCode::CREATED, Json(enrollment)))
}

pub async fn update_enrollment_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<EnrollmentBody>,
) -> AppResult<Json<Enrollment>> {
    let enrollment_id = parse_id(&id)?;
    let changes = EnrollmentChanges {
        student_id: optional_id(body.student_id.as_ref(), "INVALID_STUDENT_ID", "studentId")?,
        class_id: optional_id(body.class_id.as_ref(), "INVALID_CLASS_ID", "classId")?,
    };
    Ok(Json(enrollment_service::update_enrollment(&state.db_pool, enrollment_id, &changes).await?))
}

pub async fn delete_enrollment_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let enrollment_id = parse_id(&id)?;
    let enrollment = enrollment_service::delete_enrollment(&state.db_pool, enrollment_id).await?;
    Ok(Json(json!({ "message": "Enrollment deleted successfully", "enrollment": enrollment })))
}
