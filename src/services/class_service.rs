// src/services/class_service.rs
use crate::{
    db,
    error::{AppError, AppResult},
    models::{
        class::{Class, ClassChanges, ClassFilter, ClassTeacherRow, ClassWithTeacher, NewClass},
        pagination::Pagination,
    },
    services::user_service,
};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

const CLASS_COLUMNS: &str = "id, name, grade_level, teacher_id, created_at";

const CLASS_WITH_TEACHER_SELECT: &str = "SELECT c.id, c.name, c.grade_level, c.teacher_id, c.created_at,
        u.full_name AS teacher_name, u.email AS teacher_email, u.role AS teacher_role
     FROM classes c
     LEFT JOIN users u ON u.id = c.teacher_id";

fn class_not_found() -> AppError {
    AppError::not_found("CLASS_NOT_FOUND", "Class not found")
}

pub async fn class_exists(db_pool: &SqlitePool, class_id: i64) -> AppResult<bool> {
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM classes WHERE id = ?1")
        .bind(class_id)
        .fetch_optional(db_pool)
        .await?;
    Ok(found.is_some())
}

/// Referential check for endpoints that take a class id.
pub async fn require_class(db_pool: &SqlitePool, class_id: i64) -> AppResult {
    if class_exists(db_pool, class_id).await? {
        Ok(())
    } else {
        Err(AppError::reference("CLASS_NOT_FOUND", "Class not found"))
    }
}

pub async fn find_class_by_id(db_pool: &SqlitePool, class_id: i64) -> AppResult<Option<ClassWithTeacher>> {
    let row = sqlx::query_as::<_, ClassTeacherRow>(&format!("{} WHERE c.id = ?1", CLASS_WITH_TEACHER_SELECT))
        .bind(class_id)
        .fetch_optional(db_pool)
        .await?;
    Ok(row.map(ClassWithTeacher::from))
}

/// Newest classes first, each with its teacher summary.
pub async fn list_classes(
    db_pool: &SqlitePool,
    filter: &ClassFilter,
    page: Pagination,
) -> AppResult<Vec<ClassWithTeacher>> {
    tracing::debug!("Listing classes: {:?} {:?}", filter, page);

    let mut qb = QueryBuilder::<Sqlite>::new(CLASS_WITH_TEACHER_SELECT);
    qb.push(" WHERE 1 = 1");
    if let Some(search) = &filter.search {
        qb.push(" AND c.name LIKE ").push_bind(format!("%{}%", search));
    }
    if let Some(grade_level) = filter.grade_level {
        qb.push(" AND c.grade_level = ").push_bind(grade_level);
    }
    if let Some(teacher_id) = filter.teacher_id {
        qb.push(" AND c.teacher_id = ").push_bind(teacher_id);
    }
    qb.push(" ORDER BY c.created_at DESC, c.id DESC LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset);

    let rows = qb.build_query_as::<ClassTeacherRow>().fetch_all(db_pool).await?;
    Ok(rows.into_iter().map(ClassWithTeacher::from).collect())
}

pub async fn create_class(db_pool: &SqlitePool, new_class: &NewClass) -> AppResult<Class> {
    tracing::info!("Creating class '{}' (grade {})", new_class.name, new_class.grade_level);

    if let Some(teacher_id) = new_class.teacher_id {
        user_service::require_teacher_combined(db_pool, teacher_id).await?;
    }

    let class = sqlx::query_as::<_, Class>(&format!(
        "INSERT INTO classes (name, grade_level, teacher_id, created_at) VALUES (?1, ?2, ?3, ?4) RETURNING {}",
        CLASS_COLUMNS
    ))
    .bind(&new_class.name)
    .bind(new_class.grade_level)
    .bind(new_class.teacher_id)
    .bind(db::now_timestamp())
    .fetch_one(db_pool)
    .await?;

    tracing::info!("✅ Class {} created.", class.id);
    Ok(class)
}

pub async fn update_class(db_pool: &SqlitePool, class_id: i64, changes: &ClassChanges) -> AppResult<Class> {
    if !class_exists(db_pool, class_id).await? {
        return Err(class_not_found());
    }
    if let Some(Some(teacher_id)) = changes.teacher_id {
        user_service::require_teacher_combined(db_pool, teacher_id).await?;
    }
    if changes.is_empty() {
        return Err(AppError::validation("NO_UPDATES", "No valid fields to update"));
    }

    let mut qb = QueryBuilder::<Sqlite>::new("UPDATE classes SET ");
    {
        let mut set = qb.separated(", ");
        if let Some(name) = &changes.name {
            set.push("name = ").push_bind_unseparated(name.clone());
        }
        if let Some(grade_level) = changes.grade_level {
            set.push("grade_level = ").push_bind_unseparated(grade_level);
        }
        if let Some(teacher_id) = changes.teacher_id {
            set.push("teacher_id = ").push_bind_unseparated(teacher_id);
        }
    }
    qb.push(" WHERE id = ")
        .push_bind(class_id)
        .push(format!(" RETURNING {}", CLASS_COLUMNS));

    let class = qb.build_query_as::<Class>().fetch_one(db_pool).await?;
    tracing::info!("Class {} updated.", class_id);
    Ok(class)
}

/// Deletes a class. Its attendance and enrollments go with it; subjects and
/// announcements keep existing without a class.
pub async fn delete_class(db_pool: &SqlitePool, class_id: i64) -> AppResult<Class> {
    let class = sqlx::query_as::<_, Class>(&format!("DELETE FROM classes WHERE id = ?1 RETURNING {}", CLASS_COLUMNS))
        .bind(class_id)
        .fetch_optional(db_pool)
        .await?
        .ok_or_else(class_not_found)?;
    tracing::info!("🗑️ Class {} deleted.", class_id);
    Ok(class)
}
