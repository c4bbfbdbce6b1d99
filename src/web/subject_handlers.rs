// src/web/subject_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        pagination::Pagination,
        subject::{NewSubject, Subject, SubjectChanges, SubjectFilter},
    },
    services::subject_service,
    state::AppState,
    web::extract::{
        double_option, lenient_filter_id, non_blank, nullable_id, nullable_text, optional_id, optional_text,
        parse_id, required_text, search_term, ApiJson, IdField,
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
pub struct SubjectListQuery {
    limit: Option<String>,
    offset: Option<String>,
    search: Option<String>,
    class_id: Option<String>,
    teacher_id: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubjectBody {
    name: Option<String>,
    description: Option<String>,
    class_id: Option<IdField>,
    teacher_id: Option<IdField>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubjectBody {
    name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    class_id: Option<Option<IdField>>,
    #[serde(default, deserialize_with = "double_option")]
    teacher_id: Option<Option<IdField>>,
}

pub async fn list_subjects_handler(
    State(state): State<AppState>,
    Query(params): Query<SubjectListQuery>,
) -> AppResult<Json<Vec<Subject>>> {
    let page = Pagination::parse(params.limit.as_deref(), params.offset.as_deref(), 50, 100);
    let filter = SubjectFilter {
        search: search_term(params.search.as_deref()),
        class_id: lenient_filter_id(params.class_id.as_deref()),
        teacher_id: lenient_filter_id(params.teacher_id.as_deref()),
    };
    Ok(Json(subject_service::list_subjects(&state.db_pool, &filter, page).await?))
}

pub async fn get_subject_handler(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<Json<Subject>> {
    let subject_id = parse_id(&id)?;
    let subject = subject_service::find_subject_by_id(&state.db_pool, subject_id)
        .await?
        .ok_or_else(|| AppError::not_found("SUBJECT_NOT_FOUND", "Subject not found"))?;
    Ok(Json(subject))
}

pub async fn create_subject_handler(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateSubjectBody>,
) -> AppResult<(StatusCode, Json<Subject>)> {
    let new_subject = NewSubject {
        name: required_text(body.name.as_deref(), "MISSING_NAME", "Name is required and cannot be empty")?,
        description: optional_text(body.description.as_deref()),
        class_id: optional_id(body.class_id.as_ref(), "INVALID_CLASS_ID", "classId")?,
        teacher_id: optional_id(body.teacher_id.as_ref(), "INVALID_TEACHER_ID", "teacherId")?,
    };
    let subject = subject_service::create_subject(&state.db_pool, &new_subject).await?;
    Ok((StatusCode::CREATED, Json(subject)))
}

pub async fn update_subject_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateSubjectBody>,
) -> AppResult<Json<Subject>> {
    let subject_id = parse_id(&id)?;
    let changes = SubjectChanges {
        name: non_blank(body.name.as_deref(), "INVALID_NAME", "Name cannot be empty")?,
        description: nullable_text(&body.description),
        class_id: nullable_id(&body.class_id, "INVALID_CLASS_ID", "classId")?,
        teacher_id: nullable_id(&body.teacher_id, "INVALID_TEACHER_ID", "teacherId")?,
    };
    Ok(Json(subject_service::update_subject(&state.db_pool, subject_id, &changes).await?))
}

pub async fn delete_subject_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let subject_id = parse_id(&id)?;
    let subject = subject_service::delete_subject(&state.db_pool, subject_id).await?;
    Ok(Json(json!({ "message": "Subject deleted successfully", "subject": subject })))
}
