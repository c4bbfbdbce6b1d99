// src/services/submission_service.rs
use crate::{
    db,
    error::{AppError, AppResult},
    models::{
        pagination::Pagination,
        submission::{NewSubmission, Submission, SubmissionChanges, SubmissionFilter},
    },
    services::{assignment_service, user_service},
};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

const SUBMISSION_COLUMNS: &str =
    "id, assignment_id, student_id, content, file_url, grade, feedback, submitted_at, graded_at";

fn submission_not_found() -> AppError {
    AppError::not_found("NOT_FOUND", "Submission not found")
}

pub async fn find_submission_by_id(db_pool: &SqlitePool, submission_id: i64) -> AppResult<Option<Submission>> {
    let submission = sqlx::query_as::<_, Submission>(&format!(
        "SELECT {} FROM submissions WHERE id = ?1",
        SUBMISSION_COLUMNS
    ))
    .bind(submission_id)
    .fetch_optional(db_pool)
    .await?;
    Ok(submission)
}

pub async fn list_submissions(
    db_pool: &SqlitePool,
    filter: &SubmissionFilter,
    page: Pagination,
) -> AppResult<Vec<Submission>> {
    tracing::debug!("Listing submissions: {:?} {:?}", filter, page);

    let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM submissions WHERE 1 = 1", SUBMISSION_COLUMNS));
    if let Some(assignment_id) = filter.assignment_id {
        qb.push(" AND assignment_id = ").push_bind(assignment_id);
    }
    if let Some(student_id) = filter.student_id {
        qb.push(" AND student_id = ").push_bind(student_id);
    }
    qb.push(" ORDER BY id ASC LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset);

    Ok(qb.build_query_as::<Submission>().fetch_all(db_pool).await?)
}

pub async fn create_submission(db_pool: &SqlitePool, new_submission: &NewSubmission) -> AppResult<Submission> {
    tracing::info!(
        "Student {} submitting assignment {}",
        new_submission.student_id,
        new_submission.assignment_id
    );

    if assignment_service::find_assignment_by_id(db_pool, new_submission.assignment_id)
        .await?
        .is_none()
    {
        return Err(AppError::reference("ASSIGNMENT_NOT_FOUND", "Assignment not found"));
    }
    user_service::require_student(db_pool, new_submission.student_id).await?;

    let submission = sqlx::query_as::<_, Submission>(&format!(
        "INSERT INTO submissions (assignment_id, student_id, content, file_url, submitted_at)
         VALUES (?1, ?2, ?3, ?4, ?5) RETURNING {}",
        SUBMISSION_COLUMNS
    ))
    .bind(new_submission.assignment_id)
    .bind(new_submission.student_id)
    .bind(&new_submission.content)
    .bind(&new_submission.file_url)
    .bind(db::now_timestamp())
    .fetch_one(db_pool)
    .await?;

    tracing::info!("✅ Submission {} created.", submission.id);
    Ok(submission)
}

/// Partial update. Setting a grade without an explicit `graded_at` stamps the
/// current time.
pub async fn update_submission(
    db_pool: &SqlitePool,
    submission_id: i64,
    changes: &SubmissionChanges,
) -> AppResult<Submission> {
    let existing = find_submission_by_id(db_pool, submission_id)
        .await?
        .ok_or_else(submission_not_found)?;

    let graded_at = match (&changes.grade, &changes.graded_at) {
        (Some(Some(_)), None) => Some(Some(db::now_timestamp())),
        (_, explicit) => explicit.clone(),
    };

    let mut qb = QueryBuilder::<Sqlite>::new("UPDATE submissions SET ");
    let mut any = false;
    {
        let mut set = qb.separated(", ");
        if let Some(content) = &changes.content {
            set.push("content = ").push_bind_unseparated(content.clone());
            any = true;
        }
        if let Some(file_url) = &changes.file_url {
            set.push("file_url = ").push_bind_unseparated(file_url.clone());
            any = true;
        }
        if let Some(grade) = changes.grade {
            set.push("grade = ").push_bind_unseparated(grade);
            any = true;
        }
        if let Some(feedback) = &changes.feedback {
            set.push("feedback = ").push_bind_unseparated(feedback.clone());
            any = true;
        }
        if let Some(graded_at) = graded_at {
            set.push("graded_at = ").push_bind_unseparated(graded_at);
            any = true;
        }
    }
    if !any {
        return Ok(existing);
    }
    qb.push(" WHERE id = ")
        .push_bind(submission_id)
        .push(format!(" RETURNING {}", SUBMISSION_COLUMNS));

    let submission = qb.build_query_as::<Submission>().fetch_one(db_pool).await?;
    tracing::info!("Submission {} updated.", submission_id);
    Ok(submission)
}

pub async fn delete_submission(db_pool: &SqlitePool, submission_id: i64) -> AppResult<Submission> {
    let submission = sqlx::query_as::<_, Submission>(&format!(
        "DELETE FROM submissions WHERE id = ?1 RETURNING {}",
        SUBMISSION_COLUMNS
    ))
    .bind(submission_id)
    .fetch_optional(db_pool)
    .await?
    .ok_or_else(submission_not_found)?;
    tracing::info!("🗑️ Submission {} deleted.", submission_id);
    Ok(submission)
}
