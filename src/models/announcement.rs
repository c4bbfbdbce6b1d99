// src/models/announcement.rs
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author_id: Option<i64>,
    pub target_audience: String, // "all", "teachers", "students" or a class id
    pub class_id: Option<i64>,
    pub created_at: String,
}

/// Who an announcement is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    All,
    Teachers,
    Students,
    Class(i64),
}

impl Audience {
    pub fn parse(raw: &str) -> Option<Audience> {
        match raw.trim() {
            "all" => Some(Audience::All),
            "teachers" => Some(Audience::Teachers),
            "students" => Some(Audience::Students),
            other => other.parse::<i64>().ok().map(Audience::Class),
        }
    }

    pub fn class_id(&self) -> Option<i64> {
        match self {
            Audience::Class(id) => Some(*id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewAnnouncement {
    pub title: String,
    pub content: String,
    pub author_id: Option<i64>,
    pub target_audience: String,
    pub class_id: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct AnnouncementChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub target_audience: Option<String>,
    pub class_id: Option<Option<i64>>,
}

#[derive(Debug, Clone, Default)]
pub struct AnnouncementFilter {
    pub search: Option<String>,
    pub target_audience: Option<String>,
    pub author_id: Option<i64>,
    pub class_id: Option<i64>,
}
