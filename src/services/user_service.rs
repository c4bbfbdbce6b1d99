// src/services/user_service.rs
use crate::{
    db,
    error::{AppError, AppResult},
    models::{
        pagination::Pagination,
        user::{NewUser, Role, User, UserChanges, UserFilter},
    },
    services::code_service,
};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

pub(crate) const USER_COLUMNS: &str = "id, clerk_id, email, full_name, role, qr_code, created_at";

/// Result of checking that a user id refers to a user with a given role.
#[derive(Debug)]
pub enum RoleCheck {
    Matches(User),
    NotFound,
    WrongRole(User),
}

/// Finds a user by primary key.
pub async fn find_user_by_id(db_pool: &SqlitePool, user_id: i64) -> AppResult<Option<User>> {
    tracing::debug!("Looking up user by id: {}", user_id);
    let user = fetch_user_by_id(db_pool, user_id).await?;

    if user.is_none() {
        tracing::debug!("User {} not found.", user_id);
    }
    Ok(user)
}

/// Finds a user by the id issued by the external identity provider.
pub async fn find_user_by_clerk_id(db_pool: &SqlitePool, clerk_id: &str) -> AppResult<Option<User>> {
    tracing::debug!("Looking up user by clerk id: {}", clerk_id);
    let user = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE clerk_id = ?1", USER_COLUMNS))
        .bind(clerk_id)
        .fetch_optional(db_pool)
        .await?;
    Ok(user)
}

/// Finds the owner of a scan code.
pub async fn find_user_by_scan_code(db_pool: &SqlitePool, code: &str) -> AppResult<Option<User>> {
    Ok(fetch_user_by_scan_code(db_pool, code).await?)
}

// Raw lookups, for services that classify storage errors themselves

pub(crate) async fn fetch_user_by_id(db_pool: &SqlitePool, user_id: i64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS))
        .bind(user_id)
        .fetch_optional(db_pool)
        .await
}

pub(crate) async fn fetch_user_by_scan_code(db_pool: &SqlitePool, code: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE qr_code = ?1", USER_COLUMNS))
        .bind(code.trim())
        .fetch_optional(db_pool)
        .await
}

/// Checks that `user_id` exists and has `role`.
pub async fn check_user_role(db_pool: &SqlitePool, user_id: i64, role: Role) -> AppResult<RoleCheck> {
    tracing::debug!("Checking role '{}' for user {}", role, user_id);
    Ok(match find_user_by_id(db_pool, user_id).await? {
        None => RoleCheck::NotFound,
        Some(user) if user.has_role(role) => RoleCheck::Matches(user),
        Some(user) => RoleCheck::WrongRole(user),
    })
}

/// Referential check used by endpoints that take a teacher id.
/// Unknown and non-teacher users are reported with separate codes.
pub async fn require_teacher(db_pool: &SqlitePool, teacher_id: i64) -> AppResult<User> {
    match check_user_role(db_pool, teacher_id, Role::Teacher).await? {
        RoleCheck::Matches(user) => Ok(user),
        RoleCheck::NotFound => Err(AppError::reference("TEACHER_NOT_FOUND", "Teacher not found")),
        RoleCheck::WrongRole(_) => Err(AppError::reference("INVALID_TEACHER_ROLE", "User must have teacher role")),
    }
}

/// Like `require_teacher`, but with the single combined code the class and
/// subject endpoints use.
pub async fn require_teacher_combined(db_pool: &SqlitePool, teacher_id: i64) -> AppResult<User> {
    match check_user_role(db_pool, teacher_id, Role::Teacher).await? {
        RoleCheck::Matches(user) => Ok(user),
        _ => Err(AppError::reference("INVALID_TEACHER", "Teacher not found or user is not a teacher")),
    }
}

/// Referential check for endpoints that take a student id.
pub async fn require_student(db_pool: &SqlitePool, student_id: i64) -> AppResult<User> {
    match check_user_role(db_pool, student_id, Role::Student).await? {
        RoleCheck::Matches(user) => Ok(user),
        RoleCheck::NotFound => Err(AppError::reference("STUDENT_NOT_FOUND", "Student not found")),
        RoleCheck::WrongRole(_) => Err(AppError::reference("INVALID_STUDENT_ROLE", "User must have role student")),
    }
}

fn push_user_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &UserFilter) {
    qb.push(" WHERE 1 = 1");
    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", search);
        qb.push(" AND (email LIKE ")
            .push_bind(pattern.clone())
            .push(" OR full_name LIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(role) = filter.role {
        qb.push(" AND role = ").push_bind(role.as_str());
    }
}

/// One page of users plus the total number of matching rows.
pub async fn list_users(
    db_pool: &SqlitePool,
    filter: &UserFilter,
    page: Pagination,
) -> AppResult<(Vec<User>, i64)> {
    tracing::debug!("Listing users: {:?} {:?}", filter, page);

    let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM users", USER_COLUMNS));
    push_user_filters(&mut qb, filter);
    qb.push(" ORDER BY id ASC LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset);
    let users = qb.build_query_as::<User>().fetch_all(db_pool).await?;

    let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM users");
    push_user_filters(&mut count_qb, filter);
    let total: i64 = count_qb.build_query_scalar().fetch_one(db_pool).await?;

    tracing::debug!("Found {} users ({} total).", users.len(), total);
    Ok((users, total))
}

async fn email_taken(db_pool: &SqlitePool, email: &str, except_id: Option<i64>) -> AppResult<bool> {
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE email = ?1 AND id != ?2 LIMIT 1")
        .bind(email)
        .bind(except_id.unwrap_or(-1))
        .fetch_optional(db_pool)
        .await?;
    Ok(found.is_some())
}

async fn clerk_id_taken(db_pool: &SqlitePool, clerk_id: &str, except_id: Option<i64>) -> AppResult<bool> {
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE clerk_id = ?1 AND id != ?2 LIMIT 1")
        .bind(clerk_id)
        .bind(except_id.unwrap_or(-1))
        .fetch_optional(db_pool)
        .await?;
    Ok(found.is_some())
}

async fn scan_code_taken(db_pool: &SqlitePool, code: &str, except_id: Option<i64>) -> AppResult<bool> {
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE qr_code = ?1 AND id != ?2 LIMIT 1")
        .bind(code)
        .bind(except_id.unwrap_or(-1))
        .fetch_optional(db_pool)
        .await?;
    Ok(found.is_some())
}

/// Registers a user. Students without an explicit scan code get a generated one.
pub async fn create_user(db_pool: &SqlitePool, new_user: &NewUser) -> AppResult<User> {
    tracing::info!("Creating user: {} ({})", new_user.email, new_user.role);

    if email_taken(db_pool, &new_user.email, None).await? {
        tracing::warn!("Email '{}' already registered.", new_user.email);
        return Err(AppError::duplicate("EMAIL_EXISTS", "Email already exists"));
    }
    if let Some(clerk_id) = &new_user.clerk_id {
        if clerk_id_taken(db_pool, clerk_id, None).await? {
            return Err(AppError::duplicate("CLERK_ID_EXISTS", "Clerk ID already exists"));
        }
    }
    if let Some(code) = &new_user.qr_code {
        if scan_code_taken(db_pool, code, None).await? {
            return Err(AppError::duplicate("QR_CODE_EXISTS", "QR code already exists"));
        }
    }

    let generate_code = new_user.role == Role::Student && new_user.qr_code.is_none();

    loop {
        let qr_code = if generate_code {
            Some(code_service::generate_unique_code(db_pool).await?)
        } else {
            new_user.qr_code.clone()
        };

        let inserted = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (clerk_id, email, full_name, role, qr_code, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&new_user.clerk_id)
        .bind(&new_user.email)
        .bind(&new_user.full_name)
        .bind(new_user.role.as_str())
        .bind(&qr_code)
        .bind(db::now_timestamp())
        .fetch_one(db_pool)
        .await;

        match inserted {
            Ok(user) => {
                tracing::info!("✅ User {} created (id {}).", user.email, user.id);
                return Ok(user);
            }
            // Another writer took the generated code between the check and the insert
            Err(e) if generate_code && db::is_unique_violation_on(&e, "users.qr_code") => {
                tracing::warn!("Generated scan code collided on insert, retrying.");
                continue;
            }
            Err(e) => return Err(map_user_unique_violation(e)),
        }
    }
}

// Constraint violations that slipped past the pre-checks (concurrent writers)
fn map_user_unique_violation(e: sqlx::Error) -> AppError {
    if db::is_unique_violation_on(&e, "users.email") {
        AppError::duplicate("EMAIL_EXISTS", "Email already exists")
    } else if db::is_unique_violation_on(&e, "users.clerk_id") {
        AppError::duplicate("CLERK_ID_EXISTS", "Clerk ID already exists")
    } else if db::is_unique_violation_on(&e, "users.qr_code") {
        AppError::duplicate("QR_CODE_EXISTS", "QR code already exists")
    } else {
        AppError::SqlxError(e)
    }
}

/// Applies a partial update and returns the updated row.
pub async fn update_user(db_pool: &SqlitePool, user_id: i64, changes: &UserChanges) -> AppResult<User> {
    tracing::info!("Updating user {}", user_id);

    let existing = find_user_by_id(db_pool, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("USER_NOT_FOUND", "User not found"))?;

    if let Some(email) = &changes.email {
        if email_taken(db_pool, email, Some(user_id)).await? {
            return Err(AppError::duplicate("EMAIL_EXISTS", "Email already exists"));
        }
    }
    if let Some(Some(clerk_id)) = &changes.clerk_id {
        if clerk_id_taken(db_pool, clerk_id, Some(user_id)).await? {
            return Err(AppError::duplicate("CLERK_ID_EXISTS", "Clerk ID already exists"));
        }
    }
    if let Some(Some(code)) = &changes.qr_code {
        if scan_code_taken(db_pool, code, Some(user_id)).await? {
            return Err(AppError::duplicate("QR_CODE_EXISTS", "QR code already exists"));
        }
    }

    let mut qb = QueryBuilder::<Sqlite>::new("UPDATE users SET ");
    let mut any = false;
    {
        let mut set = qb.separated(", ");
        if let Some(email) = &changes.email {
            set.push("email = ").push_bind_unseparated(email.clone());
            any = true;
        }
        if let Some(full_name) = &changes.full_name {
            set.push("full_name = ").push_bind_unseparated(full_name.clone());
            any = true;
        }
        if let Some(role) = changes.role {
            set.push("role = ").push_bind_unseparated(role.as_str());
            any = true;
        }
        if let Some(clerk_id) = &changes.clerk_id {
            set.push("clerk_id = ").push_bind_unseparated(clerk_id.clone());
            any = true;
        }
        if let Some(qr_code) = &changes.qr_code {
            set.push("qr_code = ").push_bind_unseparated(qr_code.clone());
            any = true;
        }
    }
    if !any {
        tracing::debug!("Nothing to update for user {}", user_id);
        return Ok(existing);
    }
    qb.push(" WHERE id = ")
        .push_bind(user_id)
        .push(format!(" RETURNING {}", USER_COLUMNS));

    let updated = qb
        .build_query_as::<User>()
        .fetch_one(db_pool)
        .await
        .map_err(map_user_unique_violation)?;

    tracing::info!("✅ User {} updated.", user_id);
    Ok(updated)
}

/// Deletes a user and returns the deleted row.
pub async fn delete_user(db_pool: &SqlitePool, user_id: i64) -> AppResult<User> {
    tracing::info!("Deleting user {}", user_id);
    let deleted = sqlx::query_as::<_, User>(&format!("DELETE FROM users WHERE id = ?1 RETURNING {}", USER_COLUMNS))
        .bind(user_id)
        .fetch_optional(db_pool)
        .await?
        .ok_or_else(|| AppError::not_found("USER_NOT_FOUND", "User not found"))?;
    tracing::info!("🗑️ User {} deleted.", user_id);
    Ok(deleted)
}

/// Counts users holding a role.
pub async fn count_users_with_role(db_pool: &SqlitePool, role: Role) -> AppResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = ?1")
        .bind(role.as_str())
        .fetch_one(db_pool)
        .await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str, role: Role) -> NewUser {
        NewUser {
            email: email.to_string(),
            full_name: "Test Person".to_string(),
            role,
            clerk_id: None,
            qr_code: None,
        }
    }

    #[tokio::test]
    async fn students_get_a_scan_code_and_teachers_do_not() {
        let pool = db::create_memory_pool().await.unwrap();

        let student = create_user(&pool, &new_user("kid@school.com", Role::Student)).await.unwrap();
        let teacher = create_user(&pool, &new_user("prof@school.com", Role::Teacher)).await.unwrap();

        assert!(student.qr_code.as_deref().is_some_and(|c| c.starts_with("QR-")));
        assert_eq!(teacher.qr_code, None);

        let code = student.qr_code.as_deref().unwrap();
        let owner = find_user_by_scan_code(&pool, code).await.unwrap().unwrap();
        assert_eq!(owner.id, student.id);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let pool = db::create_memory_pool().await.unwrap();
        create_user(&pool, &new_user("same@school.com", Role::Teacher)).await.unwrap();

        let err = create_user(&pool, &new_user("same@school.com", Role::Student)).await.unwrap_err();
        assert_eq!(err.code(), "EMAIL_EXISTS");
    }

    #[tokio::test]
    async fn role_check_distinguishes_missing_from_wrong_role() {
        let pool = db::create_memory_pool().await.unwrap();
        let teacher = create_user(&pool, &new_user("t@school.com", Role::Teacher)).await.unwrap();

        assert!(matches!(
            check_user_role(&pool, teacher.id, Role::Teacher).await.unwrap(),
            RoleCheck::Matches(_)
        ));
        assert!(matches!(
            check_user_role(&pool, teacher.id, Role::Student).await.unwrap(),
            RoleCheck::WrongRole(_)
        ));
        assert!(matches!(
            check_user_role(&pool, 999, Role::Student).await.unwrap(),
            RoleCheck::NotFound
        ));
    }
}
