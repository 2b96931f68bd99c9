use core::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use scorched::{logf, LogData, LogImportance};
use serde_json::json;
use thiserror::Error;

/// Which side of the taxonomy a failure falls on. The HTTP layer maps this to a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Fetch,
    Parse,
}

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("URL is required")]
    MissingUrl,
    #[error("Failed to fetch content: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Failed to fetch content: unsupported scheme `{0}`")]
    UnsupportedScheme(String),
    #[error("Failed to fetch content: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("Failed to parse content: {0}")]
    Parse(#[from] lol_html::errors::RewritingError),
    #[error("Failed to parse content: rewritten document is not valid UTF-8")]
    Encoding(#[from] std::string::FromUtf8Error),
}

impl ProxyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProxyError::MissingUrl => ErrorKind::Validation,
            ProxyError::InvalidUrl(_) | ProxyError::UnsupportedScheme(_) | ProxyError::Fetch(_) => {
                ErrorKind::Fetch
            }
            ProxyError::Parse(_) | ProxyError::Encoding(_) => ErrorKind::Parse,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Fetch | ErrorKind::Parse => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Make our own error that wraps `anyhow::Error`.
#[derive(Debug)]
pub struct AppError(anyhow::Error);

pub type Result<T> = std::result::Result<T, AppError>;

// Tell axum how to convert `AppError` into a response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self
            .0
            .downcast_ref::<ProxyError>()
            .map(ProxyError::status)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            logf!(Error, "Request failed: {:?}", self.0);
        }

        (
            status,
            Json(json!({
                "error": self.0.to_string(),
            })),
        )
            .into_response()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// This enables using `?` on functions that return `Result<_, anyhow::Error>` to turn them into
// `Result<_, AppError>`. That way you don't need to do that manually.
impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
