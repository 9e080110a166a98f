use axum::extract::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    InvalidArgument,
    NotFound,
    Unauthorized,
    Conflict,
    RateLimited,
    Upstream,
    ServiceUnavailable,
    Internal,
}

impl ErrorKind {
    /// Codes below 100 are server-side failures whose message is never shown
    /// to API consumers in production.
    pub fn code(self) -> i32 {
        match self {
            Self::Internal => 1,
            Self::ServiceUnavailable => 2,
            Self::Upstream => 4,
            Self::Validation => 101,
            Self::InvalidArgument => 102,
            Self::Unauthorized => 103,
            Self::NotFound => 104,
            Self::Conflict => 105,
            Self::RateLimited => 106,
        }
    }

    pub fn status(self) -> StatusCode {
        match self {
            Self::Validation | Self::InvalidArgument => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Conflict => StatusCode::CONFLICT,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Upstream => StatusCode::BAD_GATEWAY,
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
    pub details: Vec<String>,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: Vec::new(),
        }
    }

    pub fn code(&self) -> i32 {
        self.kind.code()
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }

    fn public_message(&self) -> &str {
        match self.kind {
            ErrorKind::Internal => "internal server error",
            ErrorKind::ServiceUnavailable => "service unavailable",
            _ => self.message.as_str(),
        }
    }
}

/// Attached to error responses whose message was hidden, so that a
/// development-mode layer can put it back.
#[derive(Clone, Debug)]
pub struct HiddenDetail(pub String);

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        database_error(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        reqwest_error(err)
    }
}

impl From<lettre::transport::smtp::Error> for Error {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        upstream_error(format!("smtp error: {}", err))
    }
}

impl From<lettre::error::Error> for Error {
    fn from(err: lettre::error::Error) -> Self {
        internal_error(format!("mail build error: {}", err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        internal_error(format!("json error: {}", err))
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.kind.status();

        let mut body = json!({
            "ok": false,
            "code": self.code(),
            "error": self.public_message(),
        });

        if !self.details.is_empty() {
            body["errors"] = json!(self.details);
        }

        let mut response = (status, Json(body)).into_response();

        if self.public_message() != self.message {
            response
                .extensions_mut()
                .insert(HiddenDetail(self.message));
        }

        response
    }
}

pub fn validation_error(details: Vec<String>) -> Error {
    Error {
        kind: ErrorKind::Validation,
        message: "validation error".into(),
        details,
    }
}

pub fn invalid_argument_error(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::InvalidArgument, message)
}

pub fn not_found_error() -> Error {
    Error::new(ErrorKind::NotFound, "not found")
}

pub fn unauthorized_error() -> Error {
    Error::new(ErrorKind::Unauthorized, "unauthorized")
}

pub fn conflict_error(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::Conflict, message)
}

pub fn rate_limited_error(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::RateLimited, message)
}

pub fn upstream_error(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::Upstream, message)
}

pub fn service_unavailable_error(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::ServiceUnavailable, message)
}

pub fn internal_error(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::Internal, message)
}

pub fn database_error(err: sqlx::Error) -> Error {
    match &err {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
            conflict_error("duplicate resource")
        }
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => service_unavailable_error(format!("store unavailable: {}", err)),
        _ => internal_error(format!("database error: {}", err)),
    }
}

pub fn reqwest_error(err: reqwest::Error) -> Error {
    upstream_error(format!("request error: {}", err))
}
