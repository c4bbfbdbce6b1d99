// src/models/submission.rs
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: i64,
    pub assignment_id: Option<i64>,
    pub student_id: Option<i64>,
    pub content: Option<String>,
    pub file_url: Option<String>,
    pub grade: Option<i64>,
    pub feedback: Option<String>,
    pub submitted_at: String,
    pub graded_at: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub assignment_id: i64,
    pub student_id: i64,
    pub content: Option<String>,
    pub file_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SubmissionChanges {
    pub content: Option<Option<String>>,
    pub file_url: Option<Option<String>>,
    pub grade: Option<Option<i64>>,
    pub feedback: Option<Option<String>>,
    pub graded_at: Option<Option<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct SubmissionFilter {
    pub assignment_id: Option<i64>,
    pub student_id: Option<i64>,
}
