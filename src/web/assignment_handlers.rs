// src/web/assignment_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        assignment::{Assignment, AssignmentChanges, AssignmentFilter, NewAssignment},
        attendance::parse_date,
        pagination::Pagination,
    },
    services::assignment_service,
    state::AppState,
    web::extract::{
        double_option, non_blank, nullable_id, nullable_text, optional_id, optional_text, parse_id, required_text,
        search_term, strict_filter_id, ApiJson, IdField,
    },
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentListQuery {
    limit: Option<String>,
    offset: Option<String>,
    search: Option<String>,
    subject_id: Option<String>,
    teacher_id: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssignmentBody {
    title: Option<String>,
    description: Option<String>,
    subject_id: Option<IdField>,
    teacher_id: Option<IdField>,
    due_date: Option<String>,
    total_points: Option<IdField>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAssignmentBody {
    title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    subject_id: Option<Option<IdField>>,
    #[serde(default, deserialize_with = "double_option")]
    teacher_id: Option<Option<IdField>>,
    due_date: Option<String>,
    total_points: Option<IdField>,
}

/// Accepts an RFC 3339 timestamp or a bare date (midnight UTC) and returns
/// the canonical UTC form.
fn parse_due_date(raw: &str) -> AppResult<String> {
    let raw = raw.trim();
    let parsed = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| parse_date(raw).and_then(|d| d.and_hms_opt(0, 0, 0)).map(|dt| dt.and_utc()));
    parsed
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .ok_or_else(|| AppError::validation("INVALID_DUE_DATE", "Due date must be a valid ISO timestamp"))
}

fn total_points(field: &IdField) -> AppResult<i64> {
    field
        .as_id()
        .filter(|p| *p > 0)
        .ok_or_else(|| AppError::validation("INVALID_TOTAL_POINTS", "Total points must be a positive integer"))
}

pub async fn list_assignments_handler(
    State(state): State<AppState>,
    Query(params): Query<AssignmentListQuery>,
) -> AppResult<Json<Vec<Assignment>>> {
    let page = Pagination::parse(params.limit.as_deref(), params.offset.as_deref(), 50, 100);
    let filter = AssignmentFilter {
        search: search_term(params.search.as_deref()),
        subject_id: strict_filter_id(params.subject_id.as_deref(), "INVALID_SUBJECT_ID", "subject ID")?,
        teacher_id: strict_filter_id(params.teacher_id.as_deref(), "INVALID_TEACHER_ID", "teacher ID")?,
    };
    Ok(Json(assignment_service::list_assignments(&state.db_pool, &filter, page).await?))
}

pub async fn get_assignment_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Assignment>> {
    let assignment_id = parse_id(&id)?;
    let assignment = assignment_service::find_assignment_by_id(&state.db_pool, assignment_id)
        .await?
        .ok_or_else(|| AppError::not_found("NOT_FOUND", "Assignment not found"))?;
    Ok(Json(assignment))
}

pub async fn create_assignment_handler(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateAssignmentBody>,
) -> AppResult<(StatusCode, Json<Assignment>)> {
    let title = required_text(body.title.as_deref(), "MISSING_TITLE", "Title is required and cannot be empty")?;
    let due_date = optional_text(body.due_date.as_deref())
        .ok_or_else(|| AppError::validation("MISSING_DUE_DATE", "Due date is required"))?;
    let points = body
        .total_points
        .as_ref()
        .ok_or_else(|| AppError::validation("MISSING_TOTAL_POINTS", "Total points is required"))?;

    let new_assignment = NewAssignment {
        title,
        description: optional_text(body.description.as_deref()),
        due_date: parse_due_date(&due_date)?,
        total_points: total_points(points)?,
        subject_id: optional_id(body.subject_id.as_ref(), "INVALID_SUBJECT_ID", "Subject ID")?,
        teacher_id: optional_id(body.teacher_id.as_ref(), "INVALID_TEACHER_ID", "Teacher ID")?,
    };
    let assignment = assignment_service::create_assignment(&state.db_pool, &new_assignment).await?;
    Ok((StatusCode::CREATED, Json(assignment)))
}

pub async fn update_assignment_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateAssignmentBody>,
) -> AppResult<Json<Assignment>> {
    let assignment_id = parse_id(&id)?;
    let changes = AssignmentChanges {
        title: non_blank(body.title.as_deref(), "INVALID_TITLE", "Title cannot be empty")?,
        description: nullable_text(&body.description),
        subject_id: nullable_id(&body.subject_id, "INVALID_SUBJECT_ID", "Subject ID")?,
        teacher_id: nullable_id(&body.teacher_id, "INVALID_TEACHER_ID", "Teacher ID")?,
        due_date: body.due_date.as_deref().map(parse_due_date).transpose()?,
        total_points: body.total_points.as_ref().map(total_points).transpose()?,
    };
    Ok(Json(assignment_service::update_assignment(&state.db_pool, assignment_id, &changes).await?))
}

pub async fn delete_assignment_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let assignment_id = parse_id(&id)?;
    let assignment = assignment_service::delete_assignment(&state.db_pool, assignment_id).await?;
    Ok(Json(json!({ "message": "Assignment deleted successfully", "assignment": assignment })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_dates_are_normalised_to_utc() {
        assert_eq!(parse_due_date("2024-05-01").unwrap(), "2024-05-01T00:00:00.000Z");
        assert_eq!(parse_due_date("2024-05-01T10:30:00+02:00").unwrap(), "2024-05-01T08:30:00.000Z");
        assert_eq!(parse_due_date("next friday").unwrap_err().code(), "INVALID_DUE_DATE");
    }
}
