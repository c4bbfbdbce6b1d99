// src/services/attendance_service.rs
use crate::{
    db,
    error::{AppError, AppResult},
    models::{
        attendance::{
            format_date, AttendanceChanges, AttendanceEvent, AttendanceFilter, AttendanceRecord, MarkAttendance,
            StudentRef,
        },
        pagination::Pagination,
        user::{Role, User},
    },
    services::user_service,
};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use thiserror::Error;

const ATTENDANCE_COLUMNS: &str = "id, student_id, class_id, date, status, marked_by, created_at";

/// Why the recorder refused to mark attendance. Checked in declaration order.
#[derive(Error, Debug)]
pub enum AttendanceError {
    #[error("Student not found")]
    StudentNotFound,

    #[error("User must have role student")]
    NotAStudent,

    #[error("Class not found")]
    ClassNotFound,

    #[error("Teacher not found")]
    MarkerNotFound,

    #[error("User marking attendance must have role teacher")]
    MarkerNotATeacher,

    #[error("Attendance already recorded for this student, class and date")]
    Duplicate,

    #[error(transparent)]
    Storage(#[from] sqlx::Error),
}

impl From<AttendanceError> for AppError {
    fn from(err: AttendanceError) -> Self {
        let message = err.to_string();
        match err {
            AttendanceError::StudentNotFound => AppError::reference("STUDENT_NOT_FOUND", message),
            AttendanceError::NotAStudent => AppError::reference("INVALID_STUDENT_ROLE", message),
            AttendanceError::ClassNotFound => AppError::reference("CLASS_NOT_FOUND", message),
            AttendanceError::MarkerNotFound => AppError::reference("TEACHER_NOT_FOUND", message),
            AttendanceError::MarkerNotATeacher => AppError::reference("INVALID_TEACHER_ROLE", message),
            AttendanceError::Duplicate => AppError::duplicate("DUPLICATE_ATTENDANCE", message),
            AttendanceError::Storage(e) => AppError::SqlxError(e),
        }
    }
}

async fn resolve_student(db_pool: &SqlitePool, student: &StudentRef) -> Result<Option<User>, sqlx::Error> {
    match student {
        StudentRef::Id(id) => user_service::fetch_user_by_id(db_pool, *id).await,
        StudentRef::ScanCode(code) => user_service::fetch_user_by_scan_code(db_pool, code).await,
    }
}

/// Records one attendance entry.
///
/// Checks, in order: the student reference resolves to a student, the class
/// exists, the marker (if any) is a teacher, and nothing is recorded yet for
/// the same student, class and date. The unique index on those three columns
/// turns a racing second insert into `Duplicate` as well.
pub async fn mark_attendance(db_pool: &SqlitePool, mark: &MarkAttendance) -> Result<AttendanceRecord, AttendanceError> {
    tracing::debug!("Marking attendance for {} in class {} on {}", mark.student, mark.class_id, mark.date);

    let student = resolve_student(db_pool, &mark.student)
        .await?
        .ok_or(AttendanceError::StudentNotFound)?;
    if !student.has_role(Role::Student) {
        return Err(AttendanceError::NotAStudent);
    }

    let class_exists: Option<i64> = sqlx::query_scalar("SELECT id FROM classes WHERE id = ?1")
        .bind(mark.class_id)
        .fetch_optional(db_pool)
        .await?;
    if class_exists.is_none() {
        return Err(AttendanceError::ClassNotFound);
    }

    if let Some(marker_id) = mark.marked_by {
        let marker = user_service::fetch_user_by_id(db_pool, marker_id)
            .await?
            .ok_or(AttendanceError::MarkerNotFound)?;
        if !marker.has_role(Role::Teacher) {
            return Err(AttendanceError::MarkerNotATeacher);
        }
    }

    let date = format_date(mark.date);
    let existing: Option<i64> =
        sqlx::query_scalar("SELECT id FROM attendance WHERE student_id = ?1 AND class_id = ?2 AND date = ?3")
            .bind(student.id)
            .bind(mark.class_id)
            .bind(&date)
            .fetch_optional(db_pool)
            .await?;
    if existing.is_some() {
        tracing::debug!("Attendance for student {} already recorded on {}.", student.id, date);
        return Err(AttendanceError::Duplicate);
    }

    let record = sqlx::query_as::<_, AttendanceRecord>(&format!(
        "INSERT INTO attendance (student_id, class_id, date, status, marked_by, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         RETURNING {}",
        ATTENDANCE_COLUMNS
    ))
    .bind(student.id)
    .bind(mark.class_id)
    .bind(&date)
    .bind(mark.status.as_str())
    .bind(mark.marked_by)
    .bind(db::now_timestamp())
    .fetch_one(db_pool)
    .await
    .map_err(|e| {
        if db::is_unique_violation(&e) {
            AttendanceError::Duplicate
        } else {
            AttendanceError::Storage(e)
        }
    })?;

    tracing::info!(
        "✅ Attendance {} recorded: student {} class {} on {} ({}).",
        record.id,
        student.id,
        mark.class_id,
        date,
        record.status
    );
    Ok(record)
}

/// Builds the live-feed event for a freshly recorded entry.
pub async fn attendance_event(db_pool: &SqlitePool, record: AttendanceRecord) -> AppResult<AttendanceEvent> {
    let student_name = match record.student_id {
        Some(id) => user_service::find_user_by_id(db_pool, id).await?.map(|u| u.full_name),
        None => None,
    }
    .unwrap_or_else(|| "Unknown student".to_string());

    let message = format!("{} marked {} on {}", student_name, record.status, record.date);
    Ok(AttendanceEvent {
        record,
        student_name,
        message,
    })
}

pub async fn find_attendance_by_id(db_pool: &SqlitePool, attendance_id: i64) -> AppResult<Option<AttendanceRecord>> {
    let record = sqlx::query_as::<_, AttendanceRecord>(&format!(
        "SELECT {} FROM attendance WHERE id = ?1",
        ATTENDANCE_COLUMNS
    ))
    .bind(attendance_id)
    .fetch_optional(db_pool)
    .await?;
    Ok(record)
}

/// Lists records matching every filter that is set, most recent day first.
pub async fn list_attendance(
    db_pool: &SqlitePool,
    filter: &AttendanceFilter,
    page: Pagination,
) -> AppResult<Vec<AttendanceRecord>> {
    tracing::debug!("Listing attendance: {:?} {:?}", filter, page);

    let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM attendance WHERE 1 = 1", ATTENDANCE_COLUMNS));
    if let Some(student_id) = filter.student_id {
        qb.push(" AND student_id = ").push_bind(student_id);
    }
    if let Some(class_id) = filter.class_id {
        qb.push(" AND class_id = ").push_bind(class_id);
    }
    if let Some(date) = filter.date {
        qb.push(" AND date = ").push_bind(format_date(date));
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    // Zero-padded ISO dates compare correctly as text
    if let Some(start) = filter.start_date {
        qb.push(" AND date >= ").push_bind(format_date(start));
    }
    if let Some(end) = filter.end_date {
        qb.push(" AND date <= ").push_bind(format_date(end));
    }
    qb.push(" ORDER BY date DESC, id DESC LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset);

    let records = qb.build_query_as::<AttendanceRecord>().fetch_all(db_pool).await?;
    Ok(records)
}

/// Changes status and/or marker of an existing record.
pub async fn update_attendance(
    db_pool: &SqlitePool,
    attendance_id: i64,
    changes: &AttendanceChanges,
) -> AppResult<AttendanceRecord> {
    let existing = find_attendance_by_id(db_pool, attendance_id)
        .await?
        .ok_or_else(|| AppError::not_found("NOT_FOUND", "Attendance record not found"))?;

    if let Some(Some(marker_id)) = changes.marked_by {
        user_service::require_teacher(db_pool, marker_id).await?;
    }

    if changes.status.is_none() && changes.marked_by.is_none() {
        return Ok(existing);
    }

    let status = changes.status.map_or(existing.status.clone(), |s| s.as_str().to_string());
    let marked_by = changes.marked_by.unwrap_or(existing.marked_by);

    let updated = sqlx::query_as::<_, AttendanceRecord>(&format!(
        "UPDATE attendance SET status = ?1, marked_by = ?2 WHERE id = ?3 RETURNING {}",
        ATTENDANCE_COLUMNS
    ))
    .bind(status)
    .bind(marked_by)
    .bind(attendance_id)
    .fetch_one(db_pool)
    .await?;

    tracing::info!("Attendance {} updated to '{}'.", attendance_id, updated.status);
    Ok(updated)
}

pub async fn delete_attendance(db_pool: &SqlitePool, attendance_id: i64) -> AppResult<AttendanceRecord> {
    let deleted = sqlx::query_as::<_, AttendanceRecord>(&format!(
        "DELETE FROM attendance WHERE id = ?1 RETURNING {}",
        ATTENDANCE_COLUMNS
    ))
    .bind(attendance_id)
    .fetch_optional(db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("NOT_FOUND", "Attendance record not found"))?;

    tracing::info!("🗑️ Attendance {} deleted.", attendance_id);
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::attendance::{parse_date, AttendanceStatus};

    async fn seed(pool: &SqlitePool) -> (i64, i64, i64) {
        let student: i64 = sqlx::query_scalar(
            "INSERT INTO users (email, full_name, role, qr_code, created_at)
             VALUES ('ana@school.com', 'Ana', 'student', 'QR-1-ANA000', '2024-01-01T00:00:00.000Z') RETURNING id",
        )
        .fetch_one(pool)
        .await
        .unwrap();
        let teacher: i64 = sqlx::query_scalar(
            "INSERT INTO users (email, full_name, role, created_at)
             VALUES ('tom@school.com', 'Tom', 'teacher', '2024-01-01T00:00:00.000Z') RETURNING id",
        )
        .fetch_one(pool)
        .await
        .unwrap();
        let class: i64 = sqlx::query_scalar(
            "INSERT INTO classes (name, grade_level, teacher_id, created_at)
             VALUES ('5A', 5, ?1, '2024-01-01T00:00:00.000Z') RETURNING id",
        )
        .bind(teacher)
        .fetch_one(pool)
        .await
        .unwrap();
        (student, teacher, class)
    }

    fn mark(student: StudentRef, class_id: i64, marked_by: Option<i64>) -> MarkAttendance {
        MarkAttendance {
            student,
            class_id,
            date: parse_date("2024-03-05").unwrap(),
            status: AttendanceStatus::Present,
            marked_by,
        }
    }

    #[tokio::test]
    async fn second_mark_is_a_duplicate_and_keeps_the_first() {
        let pool = db::create_memory_pool().await.unwrap();
        let (student, teacher, class) = seed(&pool).await;

        let first = mark_attendance(&pool, &mark(StudentRef::Id(student), class, Some(teacher)))
            .await
            .unwrap();

        let mut again = mark(StudentRef::ScanCode("QR-1-ANA000".into()), class, None);
        again.status = AttendanceStatus::Late;
        let err = mark_attendance(&pool, &again).await.unwrap_err();
        assert!(matches!(err, AttendanceError::Duplicate));

        let stored = find_attendance_by_id(&pool, first.id).await.unwrap().unwrap();
        assert_eq!(stored, first);
    }

    #[tokio::test]
    async fn non_student_is_a_role_mismatch_not_a_missing_student() {
        let pool = db::create_memory_pool().await.unwrap();
        let (_, teacher, class) = seed(&pool).await;

        let err = mark_attendance(&pool, &mark(StudentRef::Id(teacher), class, None)).await.unwrap_err();
        assert!(matches!(err, AttendanceError::NotAStudent));

        let err = mark_attendance(&pool, &mark(StudentRef::Id(9999), class, None)).await.unwrap_err();
        assert!(matches!(err, AttendanceError::StudentNotFound));
    }

    #[tokio::test]
    async fn checks_run_in_order() {
        let pool = db::create_memory_pool().await.unwrap();
        let (student, _, class) = seed(&pool).await;

        // Unknown class is reported before the bad marker
        let err = mark_attendance(&pool, &mark(StudentRef::Id(student), 777, Some(student))).await.unwrap_err();
        assert!(matches!(err, AttendanceError::ClassNotFound));

        let err = mark_attendance(&pool, &mark(StudentRef::Id(student), class, Some(student))).await.unwrap_err();
        assert!(matches!(err, AttendanceError::MarkerNotATeacher));

        let err = mark_attendance(&pool, &mark(StudentRef::Id(student), class, Some(4242))).await.unwrap_err();
        assert!(matches!(err, AttendanceError::MarkerNotFound));
    }

    #[tokio::test]
    async fn unknown_scan_code_is_a_missing_student() {
        let pool = db::create_memory_pool().await.unwrap();
        let (_, _, class) = seed(&pool).await;

        let err = mark_attendance(&pool, &mark(StudentRef::ScanCode("QR-0-NOPE00".into()), class, None))
            .await
            .unwrap_err();
        assert_eq!(AppError::from(err).code(), "STUDENT_NOT_FOUND");
    }

    #[tokio::test]
    async fn scan_code_is_matched_after_trimming() {
        let pool = db::create_memory_pool().await.unwrap();
        let (student, teacher, class) = seed(&pool).await;

        let record = mark_attendance(&pool, &mark(StudentRef::ScanCode(" QR-1-ANA000\n".into()), class, Some(teacher)))
            .await
            .unwrap();
        assert_eq!(record.student_id, Some(student));
        assert_eq!(record.marked_by, Some(teacher));
    }
}
