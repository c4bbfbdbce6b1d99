// src/models/assignment.rs
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub subject_id: Option<i64>,
    pub teacher_id: Option<i64>,
    pub due_date: String, // RFC 3339
    pub total_points: i64,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub title: String,
    pub description: Option<String>,
    pub subject_id: Option<i64>,
    pub teacher_id: Option<i64>,
    pub due_date: String,
    pub total_points: i64,
}

#[derive(Debug, Clone, Default)]
pub struct AssignmentChanges {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub subject_id: Option<Option<i64>>,
    pub teacher_id: Option<Option<i64>>,
    pub due_date: Option<String>,
    pub total_points: Option<i64>,
}

impl AssignmentChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.subject_id.is_none()
            && self.teacher_id.is_none()
            && self.due_date.is_none()
            && self.total_points.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AssignmentFilter {
    pub search: Option<String>,
    pub subject_id: Option<i64>,
    pub teacher_id: Option<i64>,
}
