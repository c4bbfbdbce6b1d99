// src/web/submission_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        pagination::Pagination,
        submission::{NewSubmission, Submission, SubmissionChanges, SubmissionFilter},
    },
    services::submission_service,
    state::AppState,
    web::extract::{
        double_option, nullable_text, optional_text, parse_id, required_id, strict_filter_id, ApiJson, IdField,
    },
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
pub struct SubmissionListQuery {
    limit: Option<String>,
    offset: Option<String>,
    assignment_id: Option<String>,
    student_id: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubmissionBody {
    assignment_id: Option<IdField>,
    student_id: Option<IdField>,
    content: Option<String>,
    file_url: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubmissionBody {
    #[serde(default, deserialize_with = "double_option")]
    content: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    file_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    grade: Option<Option<IdField>>,
    #[serde(default, deserialize_with = "double_option")]
    feedback: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    graded_at: Option<Option<String>>,
}

fn grade(field: &Option<Option<IdField>>) -> AppResult<Option<Option<i64>>> {
    match field {
        None => Ok(None),
        Some(None) => Ok(Some(None)),
        Some(Some(raw)) => raw
            .as_id()
            .filter(|g| *g >= 0)
            .map(|g| Some(Some(g)))
            .ok_or_else(|| AppError::validation("INVALID_GRADE", "Grade must be a non-negative integer")),
    }
}

pub async fn list_submissions_handler(
    State(state): State<AppState>,
    Query(params): Query<SubmissionListQuery>,
) -> AppResult<Json<Vec<Submission>>> {
    let page = Pagination::parse(params.limit.as_deref(), params.offset.as_deref(), 50, 100);
    let filter = SubmissionFilter {
        assignment_id: strict_filter_id(params.assignment_id.as_deref(), "INVALID_ASSIGNMENT_ID", "assignmentId")?,
        student_id: strict_filter_id(params.student_id.as_deref(), "INVALID_STUDENT_ID", "studentId")?,
    };
    Ok(Json(submission_service::list_submissions(&state.db_pool, &filter, page).await?))
}

pub async fn get_submission_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Submission>> {
    let submission_id = parse_id(&id)?;
    let submission = submission_service::find_submission_by_id(&state.db_pool, submission_id)
        .await?
        .ok_or_else(|| AppError::not_found("NOT_FOUND", "Submission not found"))?;
    Ok(Json(submission))
}

pub async fn create_submission_handler(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateSubmissionBody>,
) -> AppResult<(StatusCode, Json<Submission>)> {
    let assignment_id = required_id(
        body.assignment_id.as_ref(),
        "MISSING_ASSIGNMENT_ID",
        "INVALID_ASSIGNMENT_ID",
        "assignmentId",
    )?;
    let student_id = required_id(body.student_id.as_ref(), "MISSING_STUDENT_ID", "INVALID_STUDENT_ID", "studentId")?;
    let content = optional_text(body.content.as_deref());
    let file_url = optional_text(body.file_url.as_deref());
    if content.is_none() && file_url.is_none() {
        return Err(AppError::validation(
            "MISSING_SUBMISSION_DATA",
            "At least one of content or fileUrl must be provided",
        ));
    }

    let new_submission = NewSubmission { assignment_id, student_id, content, file_url };
    let submission = submission_service::create_submission(&state.db_pool, &new_submission).await?;
    Ok((StatusCode::CREATED, Json(submission)))
}

pub async fn update_submission_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateSubmissionBody>,
) -> AppResult<Json<Submission>> {
    let submission_id = parse_id(&id)?;
    let changes = SubmissionChanges {
        content: nullable_text(&body.content),
        file_url: nullable_text(&body.file_url),
        grade: grade(&body.grade)?,
        feedback: nullable_text(&body.feedback),
        graded_at: nullable_text(&body.graded_at),
    };
    Ok(Json(submission_service::update_submission(&state.db_pool, submission_id, &changes).await?))
}

pub async fn delete_submission_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let submission_id = parse_id(&id)?;
    let submission = submission_service::delete_submission(&state.db_pool, submission_id).await?;
    Ok(Json(json!({ "message": "Submission deleted successfully", "submission": submission })))
}
