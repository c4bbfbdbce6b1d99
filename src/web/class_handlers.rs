// src/web/class_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        class::{Class, ClassChanges, ClassFilter, ClassWithTeacher, NewClass, MAX_GRADE_LEVEL, MIN_GRADE_LEVEL},
        pagination::Pagination,
    },
    services::class_service,
    state::AppState,
    web::extract::{
        double_option, lenient_filter_id, non_blank, nullable_id, optional_id, parse_id, required_text, search_term,
        ApiJson, IdField,
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
pub struct ClassListQuery {
    limit: Option<String>,
    offset: Option<String>,
    search: Option<String>,
    grade_level: Option<String>,
    teacher_id: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateClassBody {
    name: Option<String>,
    grade_level: Option<IdField>,
    teacher_id: Option<IdField>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClassBody {
    name: Option<String>,
    grade_level: Option<IdField>,
    #[serde(default, deserialize_with = "double_option")]
    teacher_id: Option<Option<IdField>>,
}

fn grade_level(field: &IdField) -> AppResult<i64> {
    field
        .as_id()
        .filter(|g| (MIN_GRADE_LEVEL..=MAX_GRADE_LEVEL).contains(g))
        .ok_or_else(|| AppError::validation("INVALID_GRADE_LEVEL", "Grade level must be between 1 and 12"))
}

pub async fn list_classes_handler(
    State(state): State<AppState>,
    Query(params): Query<ClassListQuery>,
) -> AppResult<Json<Vec<ClassWithTeacher>>> {
    let page = Pagination::parse(params.limit.as_deref(), params.offset.as_deref(), 50, 100);
    let filter = ClassFilter {
        search: search_term(params.search.as_deref()),
        grade_level: lenient_filter_id(params.grade_level.as_deref()),
        teacher_id: lenient_filter_id(params.teacher_id.as_deref()),
    };
    Ok(Json(class_service::list_classes(&state.db_pool, &filter, page).await?))
}

pub async fn get_class_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ClassWithTeacher>> {
    let class_id = parse_id(&id)?;
    let class = class_service::find_class_by_id(&state.db_pool, class_id)
        .await?
        .ok_or_else(|| AppError::not_found("CLASS_NOT_FOUND", "Class not found"))?;
    Ok(Json(class))
}

pub async fn create_class_handler(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateClassBody>,
) -> AppResult<(StatusCode, Json<Class>)> {
    let name = required_text(body.name.as_deref(), "MISSING_NAME", "Name is required and cannot be empty")?;
    let grade_level = body
        .grade_level
        .as_ref()
        .ok_or_else(|| AppError::validation("MISSING_GRADE_LEVEL", "Grade level is required"))
        .and_then(grade_level)?;
    let teacher_id = optional_id(body.teacher_id.as_ref(), "INVALID_TEACHER_ID", "teacherId")?;

    let class = class_service::create_class(&state.db_pool, &NewClass { name, grade_level, teacher_id }).await?;
    Ok((StatusCode::CREATED, Json(class)))
}

pub async fn update_class_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateClassBody>,
) -> AppResult<Json<Class>> {
    let class_id = parse_id(&id)?;
    let changes = ClassChanges {
        name: non_blank(body.name.as_deref(), "INVALID_NAME", "Name cannot be empty")?,
        grade_level: body.grade_level.as_ref().map(grade_level).transpose()?,
        teacher_id: nullable_id(&body.teacher_id, "INVALID_TEACHER_ID", "teacherId")?,
    };
    Ok(Json(class_service::update_class(&state.db_pool, class_id, &changes).await?))
}

pub async fn delete_class_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let class_id = parse_id(&id)?;
    let class = class_service::delete_class(&state.db_pool, class_id).await?;
    Ok(Json(json!({ "message": "Class deleted successfully", "class": class })))
}
