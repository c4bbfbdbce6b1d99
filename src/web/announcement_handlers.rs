// src/web/announcement_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        announcement::{Announcement, AnnouncementChanges, AnnouncementFilter, Audience, NewAnnouncement},
        pagination::Pagination,
    },
    services::announcement_service,
    state::AppState,
    web::extract::{
        double_option, lenient_filter_id, non_blank, nullable_id, optional_id, optional_text, parse_id,
        required_text, search_term, ApiJson, IdField,
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
pub struct AnnouncementListQuery {
    limit: Option<String>,
    offset: Option<String>,
    search: Option<String>,
    target_audience: Option<String>,
    author_id: Option<String>,
    class_id: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateAnnouncementBody {
    title: Option<String>,
    content: Option<String>,
    author_id: Option<IdField>,
    target_audience: Option<IdField>,
    class_id: Option<IdField>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAnnouncementBody {
    title: Option<String>,
    content: Option<String>,
    target_audience: Option<IdField>,
    #[serde(default, deserialize_with = "double_option")]
    class_id: Option<Option<IdField>>,
}

// Audience arrives as a group name or a class id, as text or number
fn parse_audience(field: &IdField) -> AppResult<(String, Audience)> {
    let raw = match field {
        IdField::Int(n) => n.to_string(),
        IdField::Text(s) => s.trim().to_string(),
    };
    let audience = Audience::parse(&raw).ok_or_else(|| {
        AppError::validation(
            "INVALID_TARGET_AUDIENCE",
            "Target audience must be \"all\", \"teachers\", \"students\", or a valid class ID",
        )
    })?;
    Ok((raw, audience))
}

pub async fn list_announcements_handler(
    State(state): State<AppState>,
    Query(params): Query<AnnouncementListQuery>,
) -> AppResult<Json<Vec<Announcement>>> {
    let page = Pagination::parse(params.limit.as_deref(), params.offset.as_deref(), 50, 100);
    let filter = AnnouncementFilter {
        search: search_term(params.search.as_deref()),
        target_audience: optional_text(params.target_audience.as_deref()),
        author_id: lenient_filter_id(params.author_id.as_deref()),
        class_id: lenient_filter_id(params.class_id.as_deref()),
    };
    Ok(Json(announcement_service::list_announcements(&state.db_pool, &filter, page).await?))
}

pub async fn get_announcement_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Announcement>> {
    let announcement_id = parse_id(&id)?;
    let announcement = announcement_service::find_announcement_by_id(&state.db_pool, announcement_id)
        .await?
        .ok_or_else(|| AppError::not_found("NOT_FOUND", "Announcement not found"))?;
    Ok(Json(announcement))
}

pub async fn create_announcement_handler(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateAnnouncementBody>,
) -> AppResult<(StatusCode, Json<Announcement>)> {
    let title = required_text(body.title.as_deref(), "MISSING_TITLE", "Title is required")?;
    let content = required_text(body.content.as_deref(), "MISSING_CONTENT", "Content is required")?;
    let audience_field = body
        .target_audience
        .as_ref()
        .filter(|f| !matches!(f, IdField::Text(s) if s.trim().is_empty()))
        .ok_or_else(|| AppError::validation("MISSING_TARGET_AUDIENCE", "Target audience is required"))?;
    let (target_audience, audience) = parse_audience(audience_field)?;
    let author_id = optional_id(body.author_id.as_ref(), "INVALID_AUTHOR_ID", "Author ID")?;
    let class_id = optional_id(body.class_id.as_ref(), "INVALID_CLASS_ID", "Class ID")?;

    let new_announcement = NewAnnouncement {
        title,
        content,
        author_id,
        target_audience,
        // A class audience wins over an explicit classId
        class_id: audience.class_id().or(class_id),
    };
    let announcement = announcement_service::create_announcement(&state.db_pool, &new_announcement).await?;
    Ok((StatusCode::CREATED, Json(announcement)))
}

pub async fn update_announcement_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateAnnouncementBody>,
) -> AppResult<Json<Announcement>> {
    let announcement_id = parse_id(&id)?;

    let title = non_blank(body.title.as_deref(), "INVALID_TITLE", "Title cannot be empty")?;
    let content = non_blank(body.content.as_deref(), "INVALID_CONTENT", "Content cannot be empty")?;
    let audience = body.target_audience.as_ref().map(parse_audience).transpose()?;
    let mut class_id = nullable_id(&body.class_id, "INVALID_CLASS_ID", "Class ID")?;
    if let Some(audience_class) = audience.as_ref().and_then(|(_, a)| a.class_id()) {
        class_id = Some(Some(audience_class));
    }

    let changes = AnnouncementChanges {
        title,
        content,
        target_audience: audience.map(|(raw, _)| raw),
        class_id,
    };
    Ok(Json(announcement_service::update_announcement(&state.db_pool, announcement_id, &changes).await?))
}

pub async fn delete_announcement_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let announcement_id = parse_id(&id)?;
    let announcement = announcement_service::delete_announcement(&state.db_pool, announcement_id).await?;
    Ok(Json(json!({ "message": "Announcement deleted successfully", "announcement": announcement })))
}
