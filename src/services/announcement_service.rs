// src/services/announcement_service.rs
use crate::{
    db,
    error::{AppError, AppResult},
    models::{
        announcement::{Announcement, AnnouncementChanges, AnnouncementFilter, NewAnnouncement},
        pagination::Pagination,
    },
    services::{class_service, user_service},
};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

const ANNOUNCEMENT_COLUMNS: &str = "id, title, content, author_id, target_audience, class_id, created_at";

fn announcement_not_found() -> AppError {
    AppError::not_found("NOT_FOUND", "Announcement not found")
}

async fn require_audience_class(db_pool: &SqlitePool, class_id: i64) -> AppResult {
    if class_service::class_exists(db_pool, class_id).await? {
        Ok(())
    } else {
        Err(AppError::reference("CLASS_NOT_FOUND", "Class ID does not exist"))
    }
}

pub async fn find_announcement_by_id(db_pool: &SqlitePool, announcement_id: i64) -> AppResult<Option<Announcement>> {
    let announcement = sqlx::query_as::<_, Announcement>(&format!(
        "SELECT {} FROM announcements WHERE id = ?1",
        ANNOUNCEMENT_COLUMNS
    ))
    .bind(announcement_id)
    .fetch_optional(db_pool)
    .await?;
    Ok(announcement)
}

/// Newest announcements first.
pub async fn list_announcements(
    db_pool: &SqlitePool,
    filter: &AnnouncementFilter,
    page: Pagination,
) -> AppResult<Vec<Announcement>> {
    tracing::debug!("Listing announcements: {:?} {:?}", filter, page);

    let mut qb = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {} FROM announcements WHERE 1 = 1",
        ANNOUNCEMENT_COLUMNS
    ));
    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", search);
        qb.push(" AND (title LIKE ")
            .push_bind(pattern.clone())
            .push(" OR content LIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(audience) = &filter.target_audience {
        qb.push(" AND target_audience = ").push_bind(audience.clone());
    }
    if let Some(author_id) = filter.author_id {
        qb.push(" AND author_id = ").push_bind(author_id);
    }
    if let Some(class_id) = filter.class_id {
        qb.push(" AND class_id = ").push_bind(class_id);
    }
    qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset);

    Ok(qb.build_query_as::<Announcement>().fetch_all(db_pool).await?)
}

pub async fn create_announcement(db_pool: &SqlitePool, new_announcement: &NewAnnouncement) -> AppResult<Announcement> {
    tracing::info!(
        "Creating announcement '{}' for '{}'",
        new_announcement.title,
        new_announcement.target_audience
    );

    if let Some(author_id) = new_announcement.author_id {
        if user_service::find_user_by_id(db_pool, author_id).await?.is_none() {
            return Err(AppError::reference("AUTHOR_NOT_FOUND", "Author ID does not exist"));
        }
    }
    if let Some(class_id) = new_announcement.class_id {
        require_audience_class(db_pool, class_id).await?;
    }

    let announcement = sqlx::query_as::<_, Announcement>(&format!(
        "INSERT INTO announcements (title, content, author_id, target_audience, class_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6) RETURNING {}",
        ANNOUNCEMENT_COLUMNS
    ))
    .bind(&new_announcement.title)
    .bind(&new_announcement.content)
    .bind(new_announcement.author_id)
    .bind(&new_announcement.target_audience)
    .bind(new_announcement.class_id)
    .bind(db::now_timestamp())
    .fetch_one(db_pool)
    .await?;

    tracing::info!("📣 Announcement {} published.", announcement.id);
    Ok(announcement)
}

pub async fn update_announcement(
    db_pool: &SqlitePool,
    announcement_id: i64,
    changes: &AnnouncementChanges,
) -> AppResult<Announcement> {
    let existing = find_announcement_by_id(db_pool, announcement_id)
        .await?
        .ok_or_else(announcement_not_found)?;

    if let Some(Some(class_id)) = changes.class_id {
        require_audience_class(db_pool, class_id).await?;
    }

    let mut qb = QueryBuilder::<Sqlite>::new("UPDATE announcements SET ");
    let mut any = false;
    {
        let mut set = qb.separated(", ");
        if let Some(title) = &changes.title {
            set.push("title = ").push_bind_unseparated(title.clone());
            any = true;
        }
        if let Some(content) = &changes.content {
            set.push("content = ").push_bind_unseparated(content.clone());
            any = true;
        }
        if let Some(audience) = &changes.target_audience {
            set.push("target_audience = ").push_bind_unseparated(audience.clone());
            any = true;
        }
        if let Some(class_id) = changes.class_id {
            set.push("class_id = ").push_bind_unseparated(class_id);
            any = true;
        }
    }
    if !any {
        return Ok(existing);
    }
    qb.push(" WHERE id = ")
        .push_bind(announcement_id)
        .push(format!(" RETURNING {}", ANNOUNCEMENT_COLUMNS));

    let announcement = qb.build_query_as::<Announcement>().fetch_one(db_pool).await?;
    tracing::info!("Announcement {} updated.", announcement_id);
    Ok(announcement)
}

pub async fn delete_announcement(db_pool: &SqlitePool, announcement_id: i64) -> AppResult<Announcement> {
    let announcement = sqlx::query_as::<_, Announcement>(&format!(
        "DELETE FROM announcements WHERE id = ?1 RETURNING {}",
        ANNOUNCEMENT_COLUMNS
    ))
    .bind(announcement_id)
    .fetch_optional(db_pool)
    .await?
    .ok_or_else(announcement_not_found)?;
    tracing::info!("🗑️ Announcement {} deleted.", announcement_id);
    Ok(announcement)
}
