use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::config::CORS_ALLOW_HEADERS;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid action")]
    InvalidAction,

    #[error("{0} is required")]
    MissingParam(&'static str),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// GraphQL `errors` array or an unusable upstream payload.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// `{error}` body returned by the normalizer to a client feed.
    #[error("{0}")]
    Remote(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Histogram error: {0}")]
    Histogram(#[from] hdrhistogram::CreationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidAction | AppError::MissingParam(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = serde_json::json!({ "error": self.to_string() });
        let mut response = (status, Json(body)).into_response();
        let headers = response.headers_mut();
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(CORS_ALLOW_HEADERS),
        );
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_action_message_is_fixed() {
        assert_eq!(AppError::InvalidAction.to_string(), "Invalid action");
        assert_eq!(AppError::InvalidAction.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn upstream_errors_are_server_errors() {
        let err = AppError::Upstream("listings: field not found".to_string());
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("listings: field not found"));
    }

    #[test]
    fn missing_param_names_the_field() {
        assert_eq!(AppError::MissingParam("address").to_string(), "address is required");
    }
}
