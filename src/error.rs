use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;
use validator::ValidationErrors;

use crate::auth::AuthError;

/// AppError
///
/// The single failure type flowing out of services, repositories and extractors.
/// Every variant maps onto one HTTP status in `status_code`, and `IntoResponse` is the
/// only place where failures become wire responses.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Validation error")]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Email already registered")]
    EmailAlreadyRegistered,

    #[error("Email already in use")]
    EmailInUse,

    #[error("Current password is required to update password")]
    CurrentPasswordRequired,

    #[error("Current password is incorrect")]
    CurrentPasswordIncorrect,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error")]
    Database(#[source] sqlx::Error),

    #[error("{0}")]
    Internal(String),
}

/// Result alias used across services, repositories and handlers.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_)
            | Self::Validation(_)
            | Self::CurrentPasswordRequired
            | Self::CurrentPasswordIncorrect => StatusCode::BAD_REQUEST,
            Self::Auth(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) | Self::EmailAlreadyRegistered | Self::EmailInUse => {
                StatusCode::CONFLICT
            }
            Self::Config(_) | Self::Database(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn not_found(what: &str) -> Self {
        Self::NotFound(format!("{what} not found"))
    }
}

/// sqlx translation
///
/// Constraint violations become client-facing conflicts or bad requests; the storage
/// engine's own codes never reach the response body.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                let subject = db.constraint().map(constraint_subject).unwrap_or("Field");
                return Self::Conflict(format!("{subject} already exists"));
            }
            if db.is_foreign_key_violation() {
                return Self::BadRequest("Referenced record does not exist".to_string());
            }
        }
        if matches!(err, sqlx::Error::RowNotFound) {
            return Self::NotFound("Record not found".to_string());
        }
        Self::Database(err)
    }
}

fn constraint_subject(constraint: &str) -> &'static str {
    match constraint {
        "users_email_active_key" => "Email",
        "articles_slug_active_key" => "Slug",
        _ => "Field",
    }
}

/// FieldError
///
/// One entry of the per-field list attached to validation failures.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS, PartialEq)]
#[ts(export)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// ErrorBody
///
/// Stable JSON shape of every error response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub errors: Option<Vec<FieldError>>,
    /// Debug rendering of the failure; only present in debug builds for 5xx errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub detail: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let (message, detail) = if status.is_server_error() {
            // Logged inside the request span, so method, uri and req_id come along.
            tracing::error!(error = ?self, "request failed with server error");
            let detail = cfg!(debug_assertions).then(|| format!("{self:?}"));
            ("Internal Server Error".to_string(), detail)
        } else {
            (self.to_string(), None)
        };

        let errors = match &self {
            Self::Validation(errors) => Some(field_errors(errors)),
            _ => None,
        };

        let body = ErrorBody {
            success: false,
            message,
            errors,
            detail,
        };

        (status, Json(body)).into_response()
    }
}

/// field_errors
///
/// Flattens `ValidationErrors` into `[{ field, message }]`, using the camelCase field
/// names clients send, sorted by field for a deterministic response.
pub fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut out: Vec<FieldError> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            let name = camel_case(field);
            errs.iter().map(move |e| FieldError {
                field: name.clone(),
                message: e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{name} is invalid")),
            })
        })
        .collect();
    out.sort_by(|a, b| a.field.cmp(&b.field));
    out
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}
