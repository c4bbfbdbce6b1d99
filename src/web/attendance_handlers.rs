// src/web/attendance_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        attendance::{
            parse_date, AttendanceChanges, AttendanceFilter, AttendanceRecord, AttendanceStatus, MarkAttendance,
            StudentRef,
        },
        pagination::Pagination,
    },
    scanner::session::record_and_broadcast,
    services::attendance_service,
    state::AppState,
    web::extract::{double_option, optional_text, parse_id, required_id, strict_filter_id, ApiJson, IdField},
};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{NaiveDate, Utc};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 500;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceListQuery {
    limit: Option<String>,
    offset: Option<String>,
    student_id: Option<String>,
    class_id: Option<String>,
    date: Option<String>,
    status: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct MarkAttendanceBody {
    student_id: Option<IdField>,
    class_id: Option<IdField>,
    date: Option<String>,
    status: Option<String>,
    marked_by: Option<IdField>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ScanBody {
    code: Option<String>,
    class_id: Option<IdField>,
    date: Option<String>,
    status: Option<String>,
    marked_by: Option<IdField>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAttendanceBody {
    status: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    marked_by: Option<Option<IdField>>,
}

fn date_field(raw: &str, code: &'static str, name: &str) -> AppResult<NaiveDate> {
    parse_date(raw).ok_or_else(|| AppError::validation(code, format!("{} must be in ISO format (YYYY-MM-DD)", name)))
}

fn status_field(raw: &str) -> AppResult<AttendanceStatus> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::validation("INVALID_STATUS", "status must be one of: present, absent, late"))
}

// A marker id that is not a number cannot name a teacher
fn marker_id(field: &IdField) -> AppResult<i64> {
    field
        .as_id()
        .ok_or_else(|| AppError::reference("TEACHER_NOT_FOUND", "Teacher not found"))
}

fn optional_filter<T>(raw: Option<&str>, parse: impl FnOnce(&str) -> AppResult<T>) -> AppResult<Option<T>> {
    optional_text(raw).as_deref().map(parse).transpose()
}

/// GET /api/attendance
pub async fn list_attendance_handler(
    State(state): State<AppState>,
    Query(params): Query<AttendanceListQuery>,
) -> AppResult<Json<Vec<AttendanceRecord>>> {
    let page = Pagination::parse(params.limit.as_deref(), params.offset.as_deref(), DEFAULT_LIMIT, MAX_LIMIT);
    let filter = AttendanceFilter {
        student_id: strict_filter_id(params.student_id.as_deref(), "INVALID_STUDENT_ID", "studentId")?,
        class_id: strict_filter_id(params.class_id.as_deref(), "INVALID_CLASS_ID", "classId")?,
        date: optional_filter(params.date.as_deref(), |d| date_field(d, "INVALID_DATE_FORMAT", "date"))?,
        status: optional_filter(params.status.as_deref(), status_field)?,
        start_date: optional_filter(params.start_date.as_deref(), |d| {
            date_field(d, "INVALID_START_DATE_FORMAT", "startDate")
        })?,
        end_date: optional_filter(params.end_date.as_deref(), |d| {
            date_field(d, "INVALID_END_DATE_FORMAT", "endDate")
        })?,
    };
    Ok(Json(attendance_service::list_attendance(&state.db_pool, &filter, page).await?))
}

/// GET /api/attendance/{id}
pub async fn get_attendance_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<AttendanceRecord>> {
    let attendance_id = parse_id(&id)?;
    let record = attendance_service::find_attendance_by_id(&state.db_pool, attendance_id)
        .await?
        .ok_or_else(|| AppError::not_found("NOT_FOUND", "Attendance record not found"))?;
    Ok(Json(record))
}

/// POST /api/attendance
pub async fn mark_attendance_handler(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<MarkAttendanceBody>,
) -> AppResult<(StatusCode, Json<AttendanceRecord>)> {
    let student_id = required_id(body.student_id.as_ref(), "MISSING_STUDENT_ID", "INVALID_STUDENT_ID", "studentId")?;
    let class_id = required_id(body.class_id.as_ref(), "MISSING_CLASS_ID", "INVALID_CLASS_ID", "classId")?;
    let date = optional_text(body.date.as_deref())
        .ok_or_else(|| AppError::validation("MISSING_DATE", "date is required"))?;
    let status = optional_text(body.status.as_deref())
        .ok_or_else(|| AppError::validation("MISSING_STATUS", "status is required"))?;

    let mark = MarkAttendance {
        student: StudentRef::Id(student_id),
        class_id,
        date: date_field(&date, "INVALID_DATE_FORMAT", "date")?,
        status: status_field(&status)?,
        marked_by: body.marked_by.as_ref().map(marker_id).transpose()?,
    };

    let record = record_and_broadcast(&state.db_pool, &state.attendance_feed, &mark).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// POST /api/attendance/scan — marks the owner of a decoded scan code.
pub async fn scan_attendance_handler(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ScanBody>,
) -> AppResult<(StatusCode, Json<AttendanceRecord>)> {
    let code = optional_text(body.code.as_deref())
        .ok_or_else(|| AppError::validation("MISSING_CODE", "code is required"))?;
    let class_id = required_id(body.class_id.as_ref(), "MISSING_CLASS_ID", "INVALID_CLASS_ID", "classId")?;

    let mark = MarkAttendance {
        student: StudentRef::ScanCode(code),
        class_id,
        date: optional_filter(body.date.as_deref(), |d| date_field(d, "INVALID_DATE_FORMAT", "date"))?
            .unwrap_or_else(|| Utc::now().date_naive()),
        status: optional_filter(body.status.as_deref(), status_field)?.unwrap_or(AttendanceStatus::Present),
        marked_by: body.marked_by.as_ref().map(marker_id).transpose()?,
    };

    let record = record_and_broadcast(&state.db_pool, &state.attendance_feed, &mark).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// PUT /api/attendance/{id} — only status and marker can change.
pub async fn update_attendance_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateAttendanceBody>,
) -> AppResult<Json<AttendanceRecord>> {
    let attendance_id = parse_id(&id)?;
    let changes = AttendanceChanges {
        status: optional_filter(body.status.as_deref(), status_field)?,
        marked_by: match &body.marked_by {
            None => None,
            Some(None) => Some(None),
            Some(Some(field)) => Some(Some(marker_id(field)?)),
        },
    };
    Ok(Json(attendance_service::update_attendance(&state.db_pool, attendance_id, &changes).await?))
}

/// DELETE /api/attendance/{id}
pub async fn delete_attendance_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let attendance_id = parse_id(&id)?;
    let record = attendance_service::delete_attendance(&state.db_pool, attendance_id).await?;
    Ok(Json(json!({ "message": "Attendance record deleted successfully", "attendance": record })))
}

// --- Live feed (GET /api/attendance/ws) ---

pub async fn attendance_feed_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_feed_socket(socket, state))
}

async fn handle_feed_socket(socket: WebSocket, state: AppState) {
    let feed = state.attendance_feed.clone();
    let (conn_id, mut rx) = feed.subscribe().await;
    tracing::info!("🔌 Attendance feed connection opened: {}", conn_id);

    let (mut ws_sender, mut ws_receiver) = socket.split();

    // Forward broadcast events to this client
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if ws_sender.send(msg).await.is_err() {
                tracing::warn!("Failed to send to feed client {}, closing.", conn_id);
                break;
            }
        }
    });

    // The feed is one-way; only watch for the client going away
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = ws_receiver.next().await {
            match msg {
                Message::Close(_) => {
                    tracing::debug!("Feed client {} sent Close.", conn_id);
                    break;
                }
                _ => tracing::trace!("Ignoring message from feed client {}", conn_id),
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    feed.unsubscribe(&conn_id).await;
    tracing::info!("🔌 Attendance feed connection {} closed.", conn_id);
}
