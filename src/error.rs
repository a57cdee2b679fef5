use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::fmt;

use crate::models::ErrorResponse;
use crate::scraper::{ErrorKind, ScraperError};

/// Highest term expressible in the 5-digit page naming
pub const MAX_TERM: u32 = 99_999;

/// Application error types
#[derive(Debug)]
pub enum AppError {
    /// Invalid request data
    ValidationError(String),
    /// Upstream page does not exist
    NotFound(String),
    /// Upstream site unreachable or returned an error
    UpstreamError(String),
    /// Upstream bytes could not be decoded
    DecodeError(String),
    /// Upstream page structure did not match expectations
    ScrapeError(String),
    /// Internal server error
    InternalError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::UpstreamError(msg) => write!(f, "Upstream error: {}", msg),
            AppError::DecodeError(msg) => write!(f, "Decode error: {}", msg),
            AppError::ScrapeError(msg) => write!(f, "Scrape error: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<ScraperError> for AppError {
    fn from(err: ScraperError) -> Self {
        let message = err.to_string();
        match (&err, err.kind()) {
            (ScraperError::HttpStatus { status: 404, .. }, _) => AppError::NotFound(message),
            (_, ErrorKind::Transport) => AppError::UpstreamError(message),
            (_, ErrorKind::Decode) => AppError::DecodeError(message),
            (_, ErrorKind::Scrape) => AppError::ScrapeError(message),
            (_, ErrorKind::Config) => AppError::InternalError(message),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::UpstreamError(_) | AppError::DecodeError(_) | AppError::ScrapeError(_) => {
                StatusCode::BAD_GATEWAY
            }
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let (error_code, message) = match self {
            AppError::ValidationError(msg) => ("validation_error", msg.clone()),
            AppError::NotFound(msg) => ("not_found", msg.clone()),
            AppError::UpstreamError(msg) => ("upstream_error", msg.clone()),
            AppError::DecodeError(msg) => ("decode_error", msg.clone()),
            AppError::ScrapeError(msg) => ("scrape_error", msg.clone()),
            AppError::InternalError(msg) => ("internal_error", msg.clone()),
        };

        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: error_code.to_string(),
            message,
        })
    }
}

/// Validation functions
pub fn validate_term(term: u32) -> Result<(), AppError> {
    if !(1..=MAX_TERM).contains(&term) {
        return Err(AppError::ValidationError(format!(
            "Term must be between 1 and {}, got {}",
            MAX_TERM, term
        )));
    }
    Ok(())
}
