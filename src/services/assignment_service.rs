// src/services/assignment_service.rs
use crate::{
    db,
    error::{AppError, AppResult},
    models::{
        assignment::{Assignment, AssignmentChanges, AssignmentFilter, NewAssignment},
        pagination::Pagination,
    },
    services::{subject_service, user_service},
};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

const ASSIGNMENT_COLUMNS: &str = "id, title, description, subject_id, teacher_id, due_date, total_points, created_at";

fn assignment_not_found() -> AppError {
    AppError::not_found("NOT_FOUND", "Assignment not found")
}

async fn require_subject(db_pool: &SqlitePool, subject_id: i64) -> AppResult {
    match subject_service::find_subject_by_id(db_pool, subject_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::reference("SUBJECT_NOT_FOUND", "Subject not found")),
    }
}

pub async fn find_assignment_by_id(db_pool: &SqlitePool, assignment_id: i64) -> AppResult<Option<Assignment>> {
    let assignment = sqlx::query_as::<_, Assignment>(&format!(
        "SELECT {} FROM assignments WHERE id = ?1",
        ASSIGNMENT_COLUMNS
    ))
    .bind(assignment_id)
    .fetch_optional(db_pool)
    .await?;
    Ok(assignment)
}

/// Newest assignments first.
pub async fn list_assignments(
    db_pool: &SqlitePool,
    filter: &AssignmentFilter,
    page: Pagination,
) -> AppResult<Vec<Assignment>> {
    tracing::debug!("Listing assignments: {:?} {:?}", filter, page);

    let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM assignments WHERE 1 = 1", ASSIGNMENT_COLUMNS));
    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", search);
        qb.push(" AND (title LIKE ")
            .push_bind(pattern.clone())
            .push(" OR description LIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(subject_id) = filter.subject_id {
        qb.push(" AND subject_id = ").push_bind(subject_id);
    }
    if let Some(teacher_id) = filter.teacher_id {
        qb.push(" AND teacher_id = ").push_bind(teacher_id);
    }
    qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset);

    Ok(qb.build_query_as::<Assignment>().fetch_all(db_pool).await?)
}

pub async fn create_assignment(db_pool: &SqlitePool, new_assignment: &NewAssignment) -> AppResult<Assignment> {
    tracing::info!("Creating assignment '{}'", new_assignment.title);

    if let Some(subject_id) = new_assignment.subject_id {
        require_subject(db_pool, subject_id).await?;
    }
    if let Some(teacher_id) = new_assignment.teacher_id {
        user_service::require_teacher(db_pool, teacher_id).await?;
    }

    let assignment = sqlx::query_as::<_, Assignment>(&format!(
        "INSERT INTO assignments (title, description, subject_id, teacher_id, due_date, total_points, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) RETURNING {}",
        ASSIGNMENT_COLUMNS
    ))
    .bind(&new_assignment.title)
    .bind(&new_assignment.description)
    .bind(new_assignment.subject_id)
    .bind(new_assignment.teacher_id)
    .bind(&new_assignment.due_date)
    .bind(new_assignment.total_points)
    .bind(db::now_timestamp())
    .fetch_one(db_pool)
    .await?;

    tracing::info!("✅ Assignment {} created.", assignment.id);
    Ok(assignment)
}

pub async fn update_assignment(
    db_pool: &SqlitePool,
    assignment_id: i64,
    changes: &AssignmentChanges,
) -> AppResult<Assignment> {
    if find_assignment_by_id(db_pool, assignment_id).await?.is_none() {
        return Err(assignment_not_found());
    }
    if let Some(Some(subject_id)) = changes.subject_id {
        require_subject(db_pool, subject_id).await?;
    }
    if let Some(Some(teacher_id)) = changes.teacher_id {
        user_service::require_teacher(db_pool, teacher_id).await?;
    }
    if changes.is_empty() {
        return Err(AppError::validation("NO_UPDATES", "No fields to update"));
    }

    let mut qb = QueryBuilder::<Sqlite>::new("UPDATE assignments SET ");
    {
        let mut set = qb.separated(", ");
        if let Some(title) = &changes.title {
            set.push("title = ").push_bind_unseparated(title.clone());
        }
        if let Some(description) = &changes.description {
            set.push("description = ").push_bind_unseparated(description.clone());
        }
        if let Some(subject_id) = changes.subject_id {
            set.push("subject_id = ").push_bind_unseparated(subject_id);
        }
        if let Some(teacher_id) = changes.teacher_id {
            set.push("teacher_id = ").push_bind_unseparated(teacher_id);
        }
        if let Some(due_date) = &changes.due_date {
            set.push("due_date = ").push_bind_unseparated(due_date.clone());
        }
        if let Some(total_points) = changes.total_points {
            set.push("total_points = ").push_bind_unseparated(total_points);
        }
    }
    qb.push(" WHERE id = ")
        .push_bind(assignment_id)
        .push(format!(" RETURNING {}", ASSIGNMENT_COLUMNS));

    let assignment = qb.build_query_as::<Assignment>().fetch_one(db_pool).await?;
    tracing::info!("Assignment {} updated.", assignment_id);
    Ok(assignment)
}

/// Deletes an assignment together with its submissions.
pub async fn delete_assignment(db_pool: &SqlitePool, assignment_id: i64) -> AppResult<Assignment> {
    let assignment = sqlx::query_as::<_, Assignment>(&format!(
        "DELETE FROM assignments WHERE id = ?1 RETURNING {}",
        ASSIGNMENT_COLUMNS
    ))
    .bind(assignment_id)
    .fetch_optional(db_pool)
    .await?
    .ok_or_else(assignment_not_found)?;
    tracing::info!("🗑️ Assignment {} deleted.", assignment_id);
    Ok(assignment)
}
