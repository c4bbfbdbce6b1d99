// src/web/mod.rs
pub mod announcement_handlers;
pub mod assignment_handlers;
pub mod attendance_handlers;
pub mod class_handlers;
pub mod dashboard_handlers;
pub mod enrollment_handlers;
pub mod extract;
pub mod page_handlers;
pub mod routes;
pub mod subject_handlers;
pub mod submission_handlers;
pub mod user_handlers;
