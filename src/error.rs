// src/error.rs
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or malformed field (400).
    #[error("{message}")]
    Validation { code: &'static str, message: String },

    /// A referenced entity is absent or has the wrong role (400).
    #[error("{message}")]
    Reference { code: &'static str, message: String },

    /// Unique constraint would be violated (400, `DUPLICATE_*` / `*_EXISTS`).
    #[error("{message}")]
    Duplicate { code: &'static str, message: String },

    #[error("{message}")]
    NotFound { code: &'static str, message: String },

    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    SqlxMigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Environment variable error: {0}")]
    EnvVarError(#[from] std::env::VarError),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Failed to render QR code: {0}")]
    QrRenderError(String),

    #[error("Failed to render template: {0}")]
    TemplateError(#[from] askama::Error),

    #[error("Unexpected internal error")]
    InternalServerError,
}

impl AppError {
    pub fn validation(code: &'static str, message: impl Into<String>) -> Self {
        AppError::Validation { code, message: message.into() }
    }

    pub fn reference(code: &'static str, message: impl Into<String>) -> Self {
        AppError::Reference { code, message: message.into() }
    }

    pub fn duplicate(code: &'static str, message: impl Into<String>) -> Self {
        AppError::Duplicate { code, message: message.into() }
    }

    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        AppError::NotFound { code, message: message.into() }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::Reference { .. } | AppError::Duplicate { .. } => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code sent in the `code` field of the error body.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation { code, .. }
            | AppError::Reference { code, .. }
            | AppError::Duplicate { code, .. }
            | AppError::NotFound { code, .. } => code,
            _ => "INTERNAL_ERROR",
        }
    }
}

// Converts AppError into the HTTP error body: `{ "error": ..., "code": ... }`
impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();

        // Client mistakes are routine; only server-side failures are errors in the log
        if status.is_server_error() {
            tracing::error!("Request failed: {:?}", self);
        } else {
            tracing::debug!("Request rejected ({}): {}", self.code(), self);
        }

        // Unclassified failures surface the raw error text
        let message = if status.is_server_error() {
            format!("Internal server error: {}", self)
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message, "code": self.code() }))).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::validation("INVALID_JSON", format!("Invalid JSON body: {}", rejection.body_text()))
    }
}

// Default Result type for the application
pub type AppResult<T = ()> = Result<T, AppError>;
