//! Defines the app level error type and its conversion to JSON error responses.
//!
//! Every failure that leaves a module is an [Error] carrying one of the
//! [ErrorKind]s. Storage errors are classified once, in the store function
//! that ran the statement, and callers above that point only look at the kind.

use std::fmt::Display;

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// A boxed error used as the wrapped cause of an [Error].
pub type BoxedCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The closed set of failure categories shared by every layer of the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The requested resource does not exist, or is not visible to the caller.
    NotFound,
    /// A resource with the same unique key already exists.
    AlreadyExists,
    /// The input broke a business rule or referenced a missing resource.
    Validation,
    /// An unexpected failure, e.g., an unhandled SQL error.
    Internal,
    /// The caller could not be authenticated.
    Unauthorized,
    /// The caller is authenticated but may not perform the action.
    Forbidden,
    /// The write clashed with existing state.
    Conflict,
}

impl ErrorKind {
    /// The label used for this kind in error responses.
    pub fn label(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::AlreadyExists => "ALREADY_EXISTS",
            ErrorKind::Validation => "VALIDATION_ERROR",
            ErrorKind::Internal => "INTERNAL_ERROR",
            ErrorKind::Unauthorized => "UNAUTHORIZED",
            ErrorKind::Forbidden => "FORBIDDEN",
            ErrorKind::Conflict => "CONFLICT",
        }
    }

    /// The HTTP status code that corresponds to this kind.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::AlreadyExists | ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct Error {
    kind: ErrorKind,
    message: String,
    #[source]
    source: Option<BoxedCause>,
}

impl Error {
    /// Create an error of `kind` with a human readable `message`.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Attach the underlying cause to the error.
    pub fn with_source(mut self, source: impl Into<BoxedCause>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Shortcut for an [ErrorKind::NotFound] error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Shortcut for an [ErrorKind::AlreadyExists] error.
    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AlreadyExists, message)
    }

    /// Shortcut for an [ErrorKind::Validation] error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Shortcut for an [ErrorKind::Internal] error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Shortcut for an [ErrorKind::Unauthorized] error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    /// Shortcut for an [ErrorKind::Forbidden] error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    /// Shortcut for an [ErrorKind::Conflict] error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// The category of the failure.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The human readable description of the failure.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        let was_interrupted =
            value.sqlite_error_code() == Some(rusqlite::ErrorCode::OperationInterrupted);

        match value {
            rusqlite::Error::QueryReturnedNoRows => {
                Error::not_found("the requested resource could not be found").with_source(value)
            }
            error if was_interrupted => {
                tracing::warn!("a database call was interrupted before it finished");
                Error::internal("the database call was cancelled").with_source(error)
            }
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::internal("an unexpected SQL error occurred").with_source(error)
            }
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::validation(rejection.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Error::validation(rejection.body_text())
    }
}

/// The constraint that a failed SQLite statement violated, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Constraint {
    Unique,
    ForeignKey,
    Check,
}

/// Inspect a SQLite error for a constraint violation.
///
/// This is the only place that looks at driver specific error codes.
pub(crate) fn violated_constraint(error: &rusqlite::Error) -> Option<Constraint> {
    match error {
        rusqlite::Error::SqliteFailure(sql_error, _) => match sql_error.extended_code {
            rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                Some(Constraint::Unique)
            }
            rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Some(Constraint::ForeignKey),
            rusqlite::ffi::SQLITE_CONSTRAINT_CHECK => Some(Constraint::Check),
            _ => None,
        },
        _ => None,
    }
}

#[derive(Serialize)]
struct ErrorResponse<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a str>,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.kind.status_code();

        let details = match self.kind {
            // Internal details are for the server logs only.
            ErrorKind::Internal => {
                match &self.source {
                    Some(source) => tracing::error!("{}: {}", self.message, source),
                    None => tracing::error!("{}", self.message),
                }
                "An unexpected error occurred, check the server logs for more details."
            }
            _ => self.message.as_str(),
        };

        let body = Json(ErrorResponse {
            error: self.kind.label(),
            details: Some(details),
        });

        (status, body).into_response()
    }
}
