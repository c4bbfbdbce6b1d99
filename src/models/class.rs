// src/models/class.rs
use serde::Serialize;
use sqlx::FromRow;

pub const MIN_GRADE_LEVEL: i64 = 1;
pub const MAX_GRADE_LEVEL: i64 = 12;

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    pub id: i64,
    pub name: String,
    pub grade_level: i64,
    pub teacher_id: Option<i64>,
    pub created_at: String,
}

/// Summary of the class teacher, embedded in class reads.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherSummary {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub role: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassWithTeacher {
    #[serde(flatten)]
    pub class: Class,
    pub teacher: Option<TeacherSummary>,
}

// Flat LEFT JOIN row, folded into ClassWithTeacher
#[derive(Debug, FromRow)]
pub struct ClassTeacherRow {
    pub id: i64,
    pub name: String,
    pub grade_level: i64,
    pub teacher_id: Option<i64>,
    pub created_at: String,
    pub teacher_name: Option<String>,
    pub teacher_email: Option<String>,
    pub teacher_role: Option<String>,
}

impl From<ClassTeacherRow> for ClassWithTeacher {
    fn from(row: ClassTeacherRow) -> Self {
        let teacher = match (row.teacher_id, row.teacher_name, row.teacher_email, row.teacher_role) {
            (Some(id), Some(full_name), Some(email), Some(role)) => Some(TeacherSummary { id, full_name, email, role }),
            _ => None,
        };
        ClassWithTeacher {
            class: Class {
                id: row.id,
                name: row.name,
                grade_level: row.grade_level,
                teacher_id: row.teacher_id,
                created_at: row.created_at,
            },
            teacher,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewClass {
    pub name: String,
    pub grade_level: i64,
    pub teacher_id: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct ClassChanges {
    pub name: Option<String>,
    pub grade_level: Option<i64>,
    pub teacher_id: Option<Option<i64>>,
}

impl ClassChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.grade_level.is_none() && self.teacher_id.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClassFilter {
    pub search: Option<String>,
    pub grade_level: Option<i64>,
    pub teacher_id: Option<i64>,
}
