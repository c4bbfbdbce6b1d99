// src/web/page_handlers.rs
use crate::{
    error::{AppError, AppResult},
    services::{code_service, qr_service, user_service},
    state::AppState,
    templates::StudentQrPage,
    web::extract::parse_id,
};
use askama::Template;
use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse},
};

/// GET /students/{id}/qr-code — printable page with the student's code.
pub async fn student_qr_page_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let user_id = parse_id(&id)?;
    tracing::debug!("GET /students/{}/qr-code", user_id);

    let user = user_service::find_user_by_id(&state.db_pool, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("USER_NOT_FOUND", "User not found"))?;
    let student = code_service::ensure_scan_code(&state.db_pool, user).await?;
    let code = student.qr_code.as_deref().ok_or(AppError::InternalServerError)?;
    let svg = qr_service::render_svg(code)?;

    let template = StudentQrPage {
        full_name: &student.full_name,
        email: &student.email,
        code,
        svg: &svg,
    };
    match template.render() {
        Ok(html) => Ok(Html(html)),
        Err(e) => {
            tracing::error!("Failed to render StudentQrPage: {}", e);
            Err(AppError::TemplateError(e))
        }
    }
}
