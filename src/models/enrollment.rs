// src/models/enrollment.rs
use serde::Serialize;
use sqlx::FromRow;

// A row from 'student_classes'
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub id: i64,
    pub student_id: Option<i64>,
    pub class_id: Option<i64>,
    pub enrolled_at: String,
}

/// Enrollment joined with student and class names, as listed by the API.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentDetails {
    pub id: i64,
    pub student_id: Option<i64>,
    pub class_id: Option<i64>,
    pub enrolled_at: String,
    pub student_name: Option<String>,
    pub student_email: Option<String>,
    pub class_name: Option<String>,
    pub grade_level: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct EnrollmentChanges {
    pub student_id: Option<i64>,
    pub class_id: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct EnrollmentFilter {
    pub student_id: Option<i64>,
    pub class_id: Option<i64>,
}
