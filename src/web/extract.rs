// src/web/extract.rs
//! Request parsing shared by the JSON handlers.
use crate::error::{AppError, AppResult};
use axum::extract::FromRequest;
use serde::{Deserialize, Deserializer};

/// `axum::Json` with malformed bodies reported as `INVALID_JSON`.
#[derive(FromRequest, Debug)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// An id that may arrive as a JSON number or a numeric string.
#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum IdField {
    Int(i64),
    Text(String),
}

impl IdField {
    pub fn as_id(&self) -> Option<i64> {
        match self {
            IdField::Int(n) => Some(*n),
            IdField::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// Keeps "absent" (`None`) apart from "explicit null" (`Some(None)`).
/// Use with `#[serde(default, deserialize_with = "double_option")]`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Path or query id. Anything but an integer is `INVALID_ID`.
pub fn parse_id(raw: &str) -> AppResult<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| AppError::validation("INVALID_ID", "Valid ID is required"))
}

/// Required id in a JSON body: missing is `missing_code`, malformed is `invalid_code`.
pub fn required_id(
    field: Option<&IdField>,
    missing_code: &'static str,
    invalid_code: &'static str,
    name: &str,
) -> AppResult<i64> {
    let field = field.ok_or_else(|| AppError::validation(missing_code, format!("{} is required", name)))?;
    field
        .as_id()
        .ok_or_else(|| AppError::validation(invalid_code, format!("{} must be a valid number", name)))
}

/// Optional id in a JSON body.
pub fn optional_id(field: Option<&IdField>, invalid_code: &'static str, name: &str) -> AppResult<Option<i64>> {
    match field {
        None => Ok(None),
        Some(field) => field
            .as_id()
            .map(Some)
            .ok_or_else(|| AppError::validation(invalid_code, format!("{} must be a valid number", name))),
    }
}

/// Optional id in a PUT body where `null` clears the column.
pub fn nullable_id(
    field: &Option<Option<IdField>>,
    invalid_code: &'static str,
    name: &str,
) -> AppResult<Option<Option<i64>>> {
    match field {
        None => Ok(None),
        Some(None) => Ok(Some(None)),
        Some(Some(id)) => id
            .as_id()
            .map(|id| Some(Some(id)))
            .ok_or_else(|| AppError::validation(invalid_code, format!("{} must be a valid number", name))),
    }
}

/// Query filter that must be an integer when present.
pub fn strict_filter_id(raw: Option<&str>, code: &'static str, name: &str) -> AppResult<Option<i64>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<i64>()
            .map(Some)
            .map_err(|_| AppError::validation(code, format!("Valid {} is required", name))),
    }
}

/// Query filter that is ignored when it is not an integer.
pub fn lenient_filter_id(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.trim().parse().ok())
}

/// Trimmed, non-empty text or `missing_code`.
pub fn required_text(value: Option<&str>, code: &'static str, message: &str) -> AppResult<String> {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text.to_string()),
        _ => Err(AppError::validation(code, message)),
    }
}

/// For updates: absent stays absent, present must not be blank.
pub fn non_blank(value: Option<&str>, code: &'static str, message: &str) -> AppResult<Option<String>> {
    match value {
        None => Ok(None),
        Some(text) => required_text(Some(text), code, message).map(Some),
    }
}

/// Trimmed text, with blank treated as absent.
pub fn optional_text(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

/// Like `optional_text` for nullable PUT fields.
pub fn nullable_text(value: &Option<Option<String>>) -> Option<Option<String>> {
    value.as_ref().map(|inner| optional_text(inner.as_deref()))
}

/// Search term; empty strings mean no search.
pub fn search_term(value: Option<&str>) -> Option<String> {
    optional_text(value)
}

/// `local@domain.tld` with no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}
