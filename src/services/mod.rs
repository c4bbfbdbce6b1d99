// src/services/mod.rs
pub mod announcement_service;
pub mod assignment_service;
pub mod attendance_service;
pub mod class_service;
pub mod code_service;
pub mod dashboard_service;
pub mod enrollment_service;
pub mod qr_service;
pub mod subject_service;
pub mod submission_service;
pub mod user_service;
