// src/services/enrollment_service.rs
use crate::{
    db,
    error::{AppError, AppResult},
    models::{
        enrollment::{Enrollment, EnrollmentChanges, EnrollmentDetails, EnrollmentFilter},
        pagination::Pagination,
    },
    services::{class_service, user_service},
};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

const ENROLLMENT_COLUMNS: &str = "id, student_id, class_id, enrolled_at";

const DETAILS_SELECT: &str = "SELECT sc.id, sc.student_id, sc.class_id, sc.enrolled_at,
        u.full_name AS student_name, u.email AS student_email,
        c.name AS class_name, c.grade_level AS grade_level
     FROM student_classes sc
     LEFT JOIN users u ON u.id = sc.student_id
     LEFT JOIN classes c ON c.id = sc.class_id";

fn enrollment_not_found() -> AppError {
    AppError::not_found("NOT_FOUND", "Enrollment not found")
}

fn duplicate_enrollment() -> AppError {
    AppError::duplicate("DUPLICATE_ENROLLMENT", "Student is already enrolled in this class")
}

async fn find_enrollment(db_pool: &SqlitePool, enrollment_id: i64) -> AppResult<Option<Enrollment>> {
    let enrollment = sqlx::query_as::<_, Enrollment>(&format!(
        "SELECT {} FROM student_classes WHERE id = ?1",
        ENROLLMENT_COLUMNS
    ))
    .bind(enrollment_id)
    .fetch_optional(db_pool)
    .await?;
    Ok(enrollment)
}

async fn enrollment_taken(
    db_pool: &SqlitePool,
    student_id: Option<i64>,
    class_id: Option<i64>,
    except_id: Option<i64>,
) -> AppResult<bool> {
    let found: Option<i64> = sqlx::query_scalar(
        "SELECT id FROM student_classes WHERE student_id IS ?1 AND class_id IS ?2 AND id != ?3 LIMIT 1",
    )
    .bind(student_id)
    .bind(class_id)
    .bind(except_id.unwrap_or(-1))
    .fetch_optional(db_pool)
    .await?;
    Ok(found.is_some())
}

fn map_enrollment_violation(e: sqlx::Error) -> AppError {
    if db::is_unique_violation(&e) {
        duplicate_enrollment()
    } else {
        AppError::SqlxError(e)
    }
}

pub async fn find_enrollment_details(db_pool: &SqlitePool, enrollment_id: i64) -> AppResult<Option<EnrollmentDetails>> {
    let details = sqlx::query_as::<_, EnrollmentDetails>(&format!("{} WHERE sc.id = ?1", DETAILS_SELECT))
        .bind(enrollment_id)
        .fetch_optional(db_pool)
        .await?;
    Ok(details)
}

pub async fn list_enrollments(
    db_pool: &SqlitePool,
    filter: &EnrollmentFilter,
    page: Pagination,
) -> AppResult<Vec<EnrollmentDetails>> {
    tracing::debug!("Listing enrollments: {:?} {:?}", filter, page);

    let mut qb = QueryBuilder::<Sqlite>::new(DETAILS_SELECT);
    qb.push(" WHERE 1 = 1");
    if let Some(student_id) = filter.student_id {
        qb.push(" AND sc.student_id = ").push_bind(student_id);
    }
    if let Some(class_id) = filter.class_id {
        qb.push(" AND sc.class_id = ").push_bind(class_id);
    }
    qb.push(" ORDER BY sc.id ASC LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset);

    Ok(qb.build_query_as::<EnrollmentDetails>().fetch_all(db_pool).await?)
}

/// Enrolls a student in a class, at most once per pair.
pub async fn enroll_student(db_pool: &SqlitePool, student_id: i64, class_id: i64) -> AppResult<Enrollment> {
    tracing::info!("Enrolling student {} in class {}", student_id, class_id);

    user_service::require_student(db_pool, student_id).await?;
    class_service::require_class(db_pool, class_id).await?;
    if enrollment_taken(db_pool, Some(student_id), Some(class_id), None).await? {
        return Err(duplicate_enrollment());
    }

    let enrollment = sqlx::query_as::<_, Enrollment>(&format!(
        "INSERT INTO student_classes (student_id, class_id, enrolled_at) VALUES (?1, ?2, ?3) RETURNING {}",
        ENROLLMENT_COLUMNS
    ))
    .bind(student_id)
    .bind(class_id)
    .bind(db::now_timestamp())
    .fetch_one(db_pool)
    .await
    .map_err(map_enrollment_violation)?;

    tracing::info!("✅ Enrollment {} created.", enrollment.id);
    Ok(enrollment)
}

pub async fn update_enrollment(
    db_pool: &SqlitePool,
    enrollment_id: i64,
    changes: &EnrollmentChanges,
) -> AppResult<Enrollment> {
    let existing = find_enrollment(db_pool, enrollment_id)
        .await?
        .ok_or_else(enrollment_not_found)?;

    if let Some(student_id) = changes.student_id {
        user_service::require_student(db_pool, student_id).await?;
    }
    if let Some(class_id) = changes.class_id {
        class_service::require_class(db_pool, class_id).await?;
    }
    if changes.student_id.is_none() && changes.class_id.is_none() {
        return Err(AppError::validation("NO_UPDATES", "No fields to update"));
    }

    let student_id = changes.student_id.or(existing.student_id);
    let class_id = changes.class_id.or(existing.class_id);
    if enrollment_taken(db_pool, student_id, class_id, Some(enrollment_id)).await? {
        return Err(duplicate_enrollment());
    }

    let enrollment = sqlx::query_as::<_, Enrollment>(&format!(
        "UPDATE student_classes SET student_id = ?1, class_id = ?2 WHERE id = ?3 RETURNING {}",
        ENROLLMENT_COLUMNS
    ))
    .bind(student_id)
    .bind(class_id)
    .bind(enrollment_id)
    .fetch_one(db_pool)
    .await
    .map_err(map_enrollment_violation)?;

    tracing::info!("Enrollment {} updated.", enrollment_id);
    Ok(enrollment)
}

pub async fn delete_enrollment(db_pool: &SqlitePool, enrollment_id: i64) -> AppResult<Enrollment> {
    let enrollment = sqlx::query_as::<_, Enrollment>(&format!(
        "DELETE FROM student_classes WHERE id = ?1 RETURNING {}",
        ENROLLMENT_COLUMNS
    ))
    .bind(enrollment_id)
    .fetch_optional(db_pool)
    .await?
    .ok_or_else(enrollment_not_found)?;
    tracing::info!("🗑️ Enrollment {} deleted.", enrollment_id);
    Ok(enrollment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn a_student_is_enrolled_once_per_class() {
        let pool = db::create_memory_pool().await.unwrap();
        let student: i64 = sqlx::query_scalar(
            "INSERT INTO users (email, full_name, role, created_at)
             VALUES ('s@s.com', 'Sam', 'student', '2024-01-01T00:00:00.000Z') RETURNING id",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        let class: i64 = sqlx::query_scalar(
            "INSERT INTO classes (name, grade_level, created_at) VALUES ('3C', 3, '2024-01-01T00:00:00.000Z') RETURNING id",
        )
        .fetch_one(&pool)
        .await
        .unwrap();

        let enrollment = enroll_student(&pool, student, class).await.unwrap();
        let err = enroll_student(&pool, student, class).await.unwrap_err();
        assert_eq!(err.code(), "DUPLICATE_ENROLLMENT");

        let details = find_enrollment_details(&pool, enrollment.id).await.unwrap().unwrap();
        assert_eq!(details.student_name.as_deref(), Some("Sam"));
        assert_eq!(details.class_name.as_deref(), Some("3C"));
    }
}
