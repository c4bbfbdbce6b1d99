// src/services/dashboard_service.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        attendance::format_date,
        dashboard::{percentage, DashboardStats, PrincipalStats, StudentStats, TeacherStats},
        user::{Role, User},
    },
    services::user_service,
};
use chrono::NaiveDate;
use sqlx::SqlitePool;

async fn count(db_pool: &SqlitePool, sql: &str, id: i64) -> AppResult<i64> {
    let n: i64 = sqlx::query_scalar(sql).bind(id).fetch_one(db_pool).await?;
    Ok(n)
}

async fn principal_stats(db_pool: &SqlitePool, today: NaiveDate) -> AppResult<PrincipalStats> {
    let total_students = user_service::count_users_with_role(db_pool, Role::Student).await?;
    let total_teachers = user_service::count_users_with_role(db_pool, Role::Teacher).await?;
    let total_classes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM classes")
        .fetch_one(db_pool)
        .await?;

    let (marked_today, present_today): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COALESCE(SUM(CASE WHEN status = 'present' THEN 1 ELSE 0 END), 0)
         FROM attendance WHERE date = ?1",
    )
    .bind(format_date(today))
    .fetch_one(db_pool)
    .await?;

    Ok(PrincipalStats {
        total_students,
        total_teachers,
        total_classes,
        present_today,
        marked_today,
        attendance_rate: percentage(present_today, marked_today),
    })
}

async fn teacher_stats(db_pool: &SqlitePool, teacher_id: i64) -> AppResult<TeacherStats> {
    Ok(TeacherStats {
        teacher_id,
        my_classes: count(db_pool, "SELECT COUNT(*) FROM classes WHERE teacher_id = ?1", teacher_id).await?,
        my_assignments: count(db_pool, "SELECT COUNT(*) FROM assignments WHERE teacher_id = ?1", teacher_id).await?,
        total_students: count(
            db_pool,
            "SELECT COUNT(*) FROM student_classes sc JOIN classes c ON c.id = sc.class_id WHERE c.teacher_id = ?1",
            teacher_id,
        )
        .await?,
        pending_grading: count(
            db_pool,
            "SELECT COUNT(*) FROM submissions s JOIN assignments a ON a.id = s.assignment_id
             WHERE a.teacher_id = ?1 AND s.grade IS NULL",
            teacher_id,
        )
        .await?,
    })
}

async fn student_stats(db_pool: &SqlitePool, student_id: i64) -> AppResult<StudentStats> {
    let (total_records, present_records): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COALESCE(SUM(CASE WHEN status = 'present' THEN 1 ELSE 0 END), 0)
         FROM attendance WHERE student_id = ?1",
    )
    .bind(student_id)
    .fetch_one(db_pool)
    .await?;

    Ok(StudentStats {
        student_id,
        my_classes: count(db_pool, "SELECT COUNT(*) FROM student_classes WHERE student_id = ?1", student_id).await?,
        total_assignments: count(
            db_pool,
            "SELECT COUNT(*) FROM assignments a JOIN subjects s ON s.id = a.subject_id
             WHERE s.class_id IN (SELECT class_id FROM student_classes WHERE student_id = ?1)",
            student_id,
        )
        .await?,
        submitted_count: count(db_pool, "SELECT COUNT(*) FROM submissions WHERE student_id = ?1", student_id).await?,
        attendance_rate: percentage(present_records, total_records),
    })
}

/// Statistics for the dashboard of `user`, chosen by role.
pub async fn stats_for(db_pool: &SqlitePool, user: &User, today: NaiveDate) -> AppResult<DashboardStats> {
    tracing::debug!("Building dashboard for user {} ({})", user.id, user.role);
    match user.role() {
        Some(Role::Principal) => Ok(DashboardStats::Principal(principal_stats(db_pool, today).await?)),
        Some(Role::Teacher) => Ok(DashboardStats::Teacher(teacher_stats(db_pool, user.id).await?)),
        Some(Role::Student) => Ok(DashboardStats::Student(student_stats(db_pool, user.id).await?)),
        None => Err(AppError::validation("INVALID_ROLE", format!("Unknown role '{}'", user.role))),
    }
}
