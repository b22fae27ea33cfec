//! Error types for Paperboard services
//!
//! Provides a comprehensive error handling system with:
//! - Distinct error types for different failure modes
//! - HTTP status code mapping
//! - Structured error responses
//! - Error codes for client handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use paperboard_ranking::RankingError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (1xxx)
    ValidationError,
    InvalidSort,
    InvalidVote,

    // Authentication errors (2xxx)
    Unauthorized,
    InvalidToken,
    ExpiredToken,

    // Resource errors (4xxx)
    PaperNotFound,
    DuplicatePaper,

    // Rate limiting (6xxx)
    RateLimited,

    // Database errors (7xxx)
    DatabaseError,
    ConnectionError,

    // Internal errors (9xxx)
    InternalError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            ErrorCode::ValidationError => 1001,
            ErrorCode::InvalidSort => 1002,
            ErrorCode::InvalidVote => 1003,

            ErrorCode::Unauthorized => 2001,
            ErrorCode::InvalidToken => 2002,
            ErrorCode::ExpiredToken => 2003,

            ErrorCode::PaperNotFound => 4002,
            ErrorCode::DuplicatePaper => 4091,

            ErrorCode::RateLimited => 6001,

            ErrorCode::DatabaseError => 7001,
            ErrorCode::ConnectionError => 7002,

            ErrorCode::InternalError => 9001,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error(transparent)]
    Ranking(#[from] RankingError),

    // Authentication errors
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    ExpiredToken,

    // Resource errors
    #[error("Paper not found: {id}")]
    PaperNotFound { id: String },

    #[error("Paper already submitted: {id}")]
    DuplicatePaper { id: String },

    // Rate limiting
    #[error("Rate limit exceeded: {limit} requests per second")]
    RateLimited { limit: u32 },

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Database connection error: {message}")]
    DatabaseConnection { message: String },

    // Internal errors
    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl AppError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::Ranking(
                RankingError::UnknownStrategy(_) | RankingError::UnknownSearchOrder(_),
            ) => ErrorCode::InvalidSort,
            AppError::Ranking(RankingError::InvalidVote(_)) => ErrorCode::InvalidVote,
            AppError::Unauthorized { .. } => ErrorCode::Unauthorized,
            AppError::InvalidToken => ErrorCode::InvalidToken,
            AppError::ExpiredToken => ErrorCode::ExpiredToken,
            AppError::PaperNotFound { .. } => ErrorCode::PaperNotFound,
            AppError::DuplicatePaper { .. } => ErrorCode::DuplicatePaper,
            AppError::RateLimited { .. } => ErrorCode::RateLimited,
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::DatabaseConnection { .. } => ErrorCode::ConnectionError,
            AppError::Internal { .. } => ErrorCode::InternalError,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::Validation { .. } | AppError::Ranking(_) => StatusCode::BAD_REQUEST,

            // 401 Unauthorized
            AppError::Unauthorized { .. } | AppError::InvalidToken | AppError::ExpiredToken => {
                StatusCode::UNAUTHORIZED
            }

            // 404 Not Found
            AppError::PaperNotFound { .. } => StatusCode::NOT_FOUND,

            // 409 Conflict
            AppError::DuplicatePaper { .. } => StatusCode::CONFLICT,

            // 429 Too Many Requests
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,

            // 500 Internal Server Error
            AppError::Database(_)
            | AppError::DatabaseConnection { .. }
            | AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Check if this error is a client error
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

/// Structured error response for API
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let message = self.to_string();

        if self.is_server_error() {
            tracing::error!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Server error"
            );
        } else if self.is_client_error() {
            tracing::warn!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Client error"
            );
        }

        let field = match &self {
            AppError::Validation { field, .. } => field.clone(),
            AppError::Ranking(
                RankingError::UnknownStrategy(_) | RankingError::UnknownSearchOrder(_),
            ) => Some("sort".to_string()),
            AppError::Ranking(RankingError::InvalidVote(_)) => Some("vote".to_string()),
            _ => None,
        };

        let body = ErrorResponse {
            error: ErrorDetails {
                code,
                message,
                field,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        let err = AppError::PaperNotFound { id: "test".into() };
        assert_eq!(err.code(), ErrorCode::PaperNotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_validation_error() {
        let err = AppError::Validation {
            message: "limit must be between 1 and 100".into(),
            field: Some("limit".into()),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(!err.is_server_error());
        assert!(err.is_client_error());
    }

    #[test]
    fn test_ranking_errors_are_client_errors() {
        let err: AppError = RankingError::UnknownStrategy("best".into()).into();
        assert_eq!(err.code(), ErrorCode::InvalidSort);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err: AppError = RankingError::InvalidVote(2).into();
        assert_eq!(err.code().as_code(), 1003);

        let err: AppError = RankingError::UnknownSearchOrder("hot".into()).into();
        assert_eq!(err.code(), ErrorCode::InvalidSort);
    }

    #[test]
    fn test_duplicate_paper_conflict() {
        let err = AppError::DuplicatePaper { id: "abc".into() };
        assert_eq!(err.code(), ErrorCode::DuplicatePaper);
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert!(err.is_client_error());
    }

    #[test]
    fn test_server_error() {
        let err = AppError::Internal {
            message: "Something went wrong".into(),
        };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.is_server_error());
    }
}
