// src/models/subject.rs
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub class_id: Option<i64>,
    pub teacher_id: Option<i64>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewSubject {
    pub name: String,
    pub description: Option<String>,
    pub class_id: Option<i64>,
    pub teacher_id: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct SubjectChanges {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub class_id: Option<Option<i64>>,
    pub teacher_id: Option<Option<i64>>,
}

#[derive(Debug, Clone, Default)]
pub struct SubjectFilter {
    pub search: Option<String>,
    pub class_id: Option<i64>,
    pub teacher_id: Option<i64>,
}
