// src/services/code_service.rs
use crate::{
    error::{AppError, AppResult},
    models::user::{Role, User},
    services::user_service::{self, USER_COLUMNS},
};
use rand::Rng;
use sqlx::SqlitePool;

const CODE_PREFIX: &str = "QR";
const SUFFIX_LEN: usize = 6;
const SUFFIX_CHARSET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Builds a candidate scan code: `QR-<unix millis>-<6 base36 chars>`.
/// Not guaranteed unique on its own, see `generate_unique_code`.
pub fn generate_scan_code() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let mut rng = rand::rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| SUFFIX_CHARSET[rng.random_range(0..SUFFIX_CHARSET.len())] as char)
        .collect();
    format!("{}-{}-{}", CODE_PREFIX, millis, suffix)
}

/// True when no user holds `code` yet.
pub async fn is_unique(db_pool: &SqlitePool, code: &str) -> AppResult<bool> {
    let taken: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE qr_code = ?1")
        .bind(code)
        .fetch_one(db_pool)
        .await?;
    Ok(taken == 0)
}

/// Generates candidates until one is not held by any user.
pub async fn generate_unique_code(db_pool: &SqlitePool) -> AppResult<String> {
    loop {
        let candidate = generate_scan_code();
        if is_unique(db_pool, &candidate).await? {
            return Ok(candidate);
        }
        tracing::debug!("Scan code {} already taken, generating another.", candidate);
    }
}

/// Returns the student with a scan code, assigning one if it has none.
pub async fn ensure_scan_code(db_pool: &SqlitePool, user: User) -> AppResult<User> {
    if !user.has_role(Role::Student) {
        return Err(AppError::reference("INVALID_STUDENT_ROLE", "User must have role student"));
    }
    if user.qr_code.is_some() {
        return Ok(user);
    }

    loop {
        let code = generate_unique_code(db_pool).await?;
        // Only fills an empty slot, so a concurrent assignment wins and is returned below
        let updated = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET qr_code = ?1 WHERE id = ?2 AND qr_code IS NULL RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&code)
        .bind(user.id)
        .fetch_optional(db_pool)
        .await;

        match updated {
            Ok(Some(user)) => {
                tracing::info!("🏷️ Scan code assigned to student {}.", user.id);
                return Ok(user);
            }
            Ok(None) => {
                return user_service::find_user_by_id(db_pool, user.id)
                    .await?
                    .ok_or_else(|| AppError::not_found("USER_NOT_FOUND", "User not found"));
            }
            Err(e) if crate::db::is_unique_violation_on(&e, "users.qr_code") => {
                tracing::warn!("Scan code {} collided on write, retrying.", code);
                continue;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use std::collections::HashSet;

    #[test]
    fn generated_codes_have_the_expected_shape() {
        let code = generate_scan_code();
        let parts: Vec<&str> = code.split('-').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "QR");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 6);
        assert!(parts[2].bytes().all(|b| b.is_ascii_digit() || b.is_ascii_uppercase()));
    }

    #[tokio::test]
    async fn concurrent_generation_yields_distinct_codes() {
        let pool = db::create_memory_pool().await.unwrap();

        let handles: Vec<_> = (0..200)
            .map(|_| {
                let pool = pool.clone();
                tokio::spawn(async move { generate_unique_code(&pool).await.unwrap() })
            })
            .collect();

        let mut codes = HashSet::new();
        for handle in handles {
            codes.insert(handle.await.unwrap());
        }
        assert_eq!(codes.len(), 200);
    }

    #[tokio::test]
    async fn taken_codes_are_not_unique() {
        let pool = db::create_memory_pool().await.unwrap();
        sqlx::query("INSERT INTO users (email, full_name, role, qr_code, created_at) VALUES ('a@b.c', 'A', 'student', 'QR-1-AAAAAA', '2024-01-01T00:00:00.000Z')")
            .execute(&pool)
            .await
            .unwrap();

        assert!(!is_unique(&pool, "QR-1-AAAAAA").await.unwrap());
        assert!(is_unique(&pool, "QR-1-BBBBBB").await.unwrap());
    }

    #[tokio::test]
    async fn ensure_scan_code_assigns_once() {
        let pool = db::create_memory_pool().await.unwrap();
        let id: i64 = sqlx::query_scalar("INSERT INTO users (email, full_name, role, created_at) VALUES ('s@b.c', 'S', 'student', '2024-01-01T00:00:00.000Z') RETURNING id")
            .fetch_one(&pool)
            .await
            .unwrap();
        let student = crate::services::user_service::find_user_by_id(&pool, id).await.unwrap().unwrap();
        assert!(student.qr_code.is_none());

        let first = ensure_scan_code(&pool, student).await.unwrap();
        let code = first.qr_code.clone().unwrap();
        let second = ensure_scan_code(&pool, first).await.unwrap();

        assert_eq!(second.qr_code.as_deref(), Some(code.as_str()));
    }
}
