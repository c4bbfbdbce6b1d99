// src/services/subject_service.rs
use crate::{
    db,
    error::{AppError, AppResult},
    models::{
        pagination::Pagination,
        subject::{NewSubject, Subject, SubjectChanges, SubjectFilter},
    },
    services::{class_service, user_service},
};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

const SUBJECT_COLUMNS: &str = "id, name, description, class_id, teacher_id, created_at";

fn subject_not_found() -> AppError {
    AppError::not_found("SUBJECT_NOT_FOUND", "Subject not found")
}

pub async fn find_subject_by_id(db_pool: &SqlitePool, subject_id: i64) -> AppResult<Option<Subject>> {
    let subject = sqlx::query_as::<_, Subject>(&format!("SELECT {} FROM subjects WHERE id = ?1", SUBJECT_COLUMNS))
        .bind(subject_id)
        .fetch_optional(db_pool)
        .await?;
    Ok(subject)
}

pub async fn list_subjects(db_pool: &SqlitePool, filter: &SubjectFilter, page: Pagination) -> AppResult<Vec<Subject>> {
    tracing::debug!("Listing subjects: {:?} {:?}", filter, page);

    let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM subjects WHERE 1 = 1", SUBJECT_COLUMNS));
    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", search);
        qb.push(" AND (name LIKE ")
            .push_bind(pattern.clone())
            .push(" OR description LIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(class_id) = filter.class_id {
        qb.push(" AND class_id = ").push_bind(class_id);
    }
    if let Some(teacher_id) = filter.teacher_id {
        qb.push(" AND teacher_id = ").push_bind(teacher_id);
    }
    qb.push(" ORDER BY id ASC LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset);

    Ok(qb.build_query_as::<Subject>().fetch_all(db_pool).await?)
}

pub async fn create_subject(db_pool: &SqlitePool, new_subject: &NewSubject) -> AppResult<Subject> {
    tracing::info!("Creating subject '{}'", new_subject.name);

    if let Some(class_id) = new_subject.class_id {
        class_service::require_class(db_pool, class_id).await?;
    }
    if let Some(teacher_id) = new_subject.teacher_id {
        user_service::require_teacher_combined(db_pool, teacher_id).await?;
    }

    let subject = sqlx::query_as::<_, Subject>(&format!(
        "INSERT INTO subjects (name, description, class_id, teacher_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5) RETURNING {}",
        SUBJECT_COLUMNS
    ))
    .bind(&new_subject.name)
    .bind(&new_subject.description)
    .bind(new_subject.class_id)
    .bind(new_subject.teacher_id)
    .bind(db::now_timestamp())
    .fetch_one(db_pool)
    .await?;

    tracing::info!("✅ Subject {} created.", subject.id);
    Ok(subject)
}

pub async fn update_subject(db_pool: &SqlitePool, subject_id: i64, changes: &SubjectChanges) -> AppResult<Subject> {
    let existing = find_subject_by_id(db_pool, subject_id).await?.ok_or_else(subject_not_found)?;

    if let Some(Some(class_id)) = changes.class_id {
        class_service::require_class(db_pool, class_id).await?;
    }
    if let Some(Some(teacher_id)) = changes.teacher_id {
        user_service::require_teacher_combined(db_pool, teacher_id).await?;
    }

    let mut qb = QueryBuilder::<Sqlite>::new("UPDATE subjects SET ");
    let mut any = false;
    {
        let mut set = qb.separated(", ");
        if let Some(name) = &changes.name {
            set.push("name = ").push_bind_unseparated(name.clone());
            any = true;
        }
        if let Some(description) = &changes.description {
            set.push("description = ").push_bind_unseparated(description.clone());
            any = true;
        }
        if let Some(class_id) = changes.class_id {
            set.push("class_id = ").push_bind_unseparated(class_id);
            any = true;
        }
        if let Some(teacher_id) = changes.teacher_id {
            set.push("teacher_id = ").push_bind_unseparated(teacher_id);
            any = true;
        }
    }
    if !any {
        return Ok(existing);
    }
    qb.push(" WHERE id = ")
        .push_bind(subject_id)
        .push(format!(" RETURNING {}", SUBJECT_COLUMNS));

    let subject = qb.build_query_as::<Subject>().fetch_one(db_pool).await?;
    tracing::info!("Subject {} updated.", subject_id);
    Ok(subject)
}

pub async fn delete_subject(db_pool: &SqlitePool, subject_id: i64) -> AppResult<Subject> {
    let subject = sqlx::query_as::<_, Subject>(&format!(
        "DELETE FROM subjects WHERE id = ?1 RETURNING {}",
        SUBJECT_COLUMNS
    ))
    .bind(subject_id)
    .fetch_optional(db_pool)
    .await?
    .ok_or_else(subject_not_found)?;
    tracing::info!("🗑️ Subject {} deleted.", subject_id);
    Ok(subject)
}
