use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::time::Duration;

use crate::models::Step;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Text generation was unavailable or returned unusable content
    #[error("Generation error: {0}")]
    Generation(String),

    /// Generated content did not have the expected structured shape
    #[error("Parse error: {0}")]
    Parse(String),

    /// Metadata lookup was unavailable
    #[error("Lookup error: {0}")]
    Lookup(String),

    /// An external call ran past its deadline
    #[error("External call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Cannot {action} while the session is at step '{step}'")]
    InvalidTransition { step: Step, action: &'static str },

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidTransition { .. } => StatusCode::CONFLICT,
            AppError::Generation(_)
            | AppError::Parse(_)
            | AppError::Lookup(_)
            | AppError::HttpClient(_) => StatusCode::BAD_GATEWAY,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (
                AppError::InvalidTransition {
                    step: Step::Welcome,
                    action: "submit an answer",
                },
                StatusCode::CONFLICT,
            ),
            (AppError::Generation("x".into()), StatusCode::BAD_GATEWAY),
            (AppError::Timeout(Duration::from_secs(10)), StatusCode::GATEWAY_TIMEOUT),
            (AppError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn test_invalid_transition_message() {
        let error = AppError::InvalidTransition {
            step: Step::AskingQuestions,
            action: "select a persona",
        };
        assert_eq!(
            error.to_string(),
            "Cannot select a persona while the session is at step 'asking_questions'"
        );
    }
}
