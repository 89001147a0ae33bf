//! API response types
//!
//! Every failure body carries at least `error` and `status`. `details` is
//! field-level information for validation failures, or internal context in
//! development mode; production responses omit it for server-side errors.
//! `retryable` hints whether the same request could succeed if repeated.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,
}

/// Error response builder
#[derive(Debug)]
pub struct ErrorResponse {
    status: StatusCode,
    body: ErrorBody,
}

impl ErrorResponse {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                error: message.into(),
                status: status.as_u16(),
                details: None,
                retryable: None,
            },
        }
    }

    /// Attach detail text
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.body.details = Some(details.into());
        self
    }

    /// Attach detail text only when `include` is set (development mode)
    pub fn with_details_if(self, include: bool, details: impl Into<String>) -> Self {
        if include {
            self.with_details(details)
        } else {
            self
        }
    }

    /// Mark whether retrying the same request could succeed
    pub fn retryable(mut self, retryable: bool) -> Self {
        self.body.retryable = Some(retryable);
        self
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_shape() {
        let response = ErrorResponse::new(StatusCode::BAD_REQUEST, "Validation error")
            .with_details("No image file uploaded");
        let json = serde_json::to_value(&response.body).unwrap();
        assert_eq!(json["error"], "Validation error");
        assert_eq!(json["status"], 400);
        assert_eq!(json["details"], "No image file uploaded");
        assert!(json.get("retryable").is_none());
    }

    #[test]
    fn test_details_suppressed_in_production() {
        let response = ErrorResponse::new(StatusCode::INTERNAL_SERVER_ERROR, "Error processing image")
            .with_details_if(false, "secret internals")
            .retryable(true);
        let json = serde_json::to_value(&response.body).unwrap();
        assert!(json.get("details").is_none());
        assert_eq!(json["retryable"], true);
    }
}
