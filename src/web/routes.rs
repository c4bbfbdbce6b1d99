// src/web/routes.rs
use crate::{
    state::AppState,
    web::{
        announcement_handlers, assignment_handlers, attendance_handlers, class_handlers, dashboard_handlers,
        enrollment_handlers, page_handlers, subject_handlers, submission_handlers, user_handlers,
    },
};
use axum::{
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub fn create_router(app_state: AppState) -> Router {
    // --- REST API ---
    let users = Router::new()
        .route("/", get(user_handlers::list_users_handler).post(user_handlers::create_user_handler))
        .route(
            "/{id}",
            get(user_handlers::get_user_handler)
                .put(user_handlers::update_user_handler)
                .delete(user_handlers::delete_user_handler),
        )
        .route("/{id}/qr-code", get(user_handlers::user_qr_code_handler));

    let classes = Router::new()
        .route("/", get(class_handlers::list_classes_handler).post(class_handlers::create_class_handler))
        .route(
            "/{id}",
            get(class_handlers::get_class_handler)
                .put(class_handlers::update_class_handler)
                .delete(class_handlers::delete_class_handler),
        );

    let subjects = Router::new()
        .route("/", get(subject_handlers::list_subjects_handler).post(subject_handlers::create_subject_handler))
        .route(
            "/{id}",
            get(subject_handlers::get_subject_handler)
                .put(subject_handlers::update_subject_handler)
                .delete(subject_handlers::delete_subject_handler),
        );

    let assignments = Router::new()
        .route(
            "/",
            get(assignment_handlers::list_assignments_handler).post(assignment_handlers::create_assignment_handler),
        )
        .route(
            "/{id}",
            get(assignment_handlers::get_assignment_handler)
                .put(assignment_handlers::update_assignment_handler)
                .delete(assignment_handlers::delete_assignment_handler),
        );

    let submissions = Router::new()
        .route(
            "/",
            get(submission_handlers::list_submissions_handler).post(submission_handlers::create_submission_handler),
        )
        .route(
            "/{id}",
            get(submission_handlers::get_submission_handler)
                .put(submission_handlers::update_submission_handler)
                .delete(submission_handlers::delete_submission_handler),
        );

    // Static segments (scan, ws) take precedence over /{id}
    let attendance = Router::new()
        .route(
            "/",
            get(attendance_handlers::list_attendance_handler).post(attendance_handlers::mark_attendance_handler),
        )
        .route("/scan", post(attendance_handlers::scan_attendance_handler))
        .route("/ws", get(attendance_handlers::attendance_feed_handler))
        .route(
            "/{id}",
            get(attendance_handlers::get_attendance_handler)
                .put(attendance_handlers::update_attendance_handler)
                .delete(attendance_handlers::delete_attendance_handler),
        );

    let announcements = Router::new()
        .route(
            "/",
            get(announcement_handlers::list_announcements_handler)
                .post(announcement_handlers::create_announcement_handler),
        )
        .route(
            "/{id}",
            get(announcement_handlers::get_announcement_handler)
                .put(announcement_handlers::update_announcement_handler)
                .delete(announcement_handlers::delete_announcement_handler),
        );

    let enrollments = Router::new()
        .route(
            "/",
            get(enrollment_handlers::list_enrollments_handler).post(enrollment_handlers::create_enrollment_handler),
        )
        .route(
            "/{id}",
            get(enrollment_handlers::get_enrollment_handler)
                .put(enrollment_handlers::update_enrollment_handler)
                .delete(enrollment_handlers::delete_enrollment_handler),
        );

    let api_routes = Router::new()
        .nest("/users", users)
        .nest("/classes", classes)
        .nest("/subjects", subjects)
        .nest("/assignments", assignments)
        .nest("/submissions", submissions)
        .nest("/attendance", attendance)
        .nest("/announcements", announcements)
        .nest("/student-classes", enrollments)
        .route("/dashboard", get(dashboard_handlers::dashboard_handler));

    // --- Pages ---
    let page_routes = Router::new().route("/students/{id}/qr-code", get(page_handlers::student_qr_page_handler));

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api_routes)
        .merge(page_routes)
        .with_state(app_state)
}
