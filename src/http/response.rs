//! Error responses.
//!
//! Every rejected request ends in exactly one of these; the body is the plain
//! reason phrase of the status.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RedirectError {
    #[error("Forbidden")]
    Forbidden,
    #[error("Not Found")]
    NotFound,
    #[error("Method Not Allowed")]
    MethodNotAllowed,
    #[error("Internal Server Error")]
    Internal,
}

impl RedirectError {
    pub fn status(&self) -> StatusCode {
        match self {
            RedirectError::Forbidden => StatusCode::FORBIDDEN,
            RedirectError::NotFound => StatusCode::NOT_FOUND,
            RedirectError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            RedirectError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RedirectError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}
