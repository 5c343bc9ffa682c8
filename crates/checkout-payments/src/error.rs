//! Payment Error Types

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Payment-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    /// Customer or payment method does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request rejected before or by the processor
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Processor call failed
    #[error("Processor error: {0}")]
    Upstream(String),

    /// Processor call did not complete in time
    #[error("Processor call timed out after {0:?}")]
    Timeout(Duration),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse error classification exposed to callers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    InvalidRequest,
    UpstreamFailure,
}

impl PaymentError {
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Self::Upstream(_) | Self::Timeout(_) | Self::Config(_) => ErrorKind::UpstreamFailure,
        }
    }

    /// Check if this error is retryable.
    ///
    /// Nothing in this crate retries; this only informs callers.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Upstream(_) | Self::Timeout(_))
    }

    /// Stable machine-readable code
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::Upstream(_) => "UPSTREAM_ERROR",
            Self::Timeout(_) => "UPSTREAM_TIMEOUT",
            Self::Config(_) => "PAYMENTS_DISABLED",
        }
    }

    /// Get user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound(msg) | Self::InvalidRequest(msg) => msg.clone(),
            Self::Upstream(_) => "Payment processing failed. Please try again.".into(),
            Self::Timeout(_) => "The payment processor did not respond in time.".into(),
            Self::Config(_) => "Payments not configured".into(),
        }
    }
}

/// JSON error body
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl From<&PaymentError> for ErrorResponse {
    fn from(err: &PaymentError) -> Self {
        Self {
            error: err.user_message(),
            code: err.code().into(),
        }
    }
}

#[cfg(feature = "axum-handlers")]
mod http {
    use axum::{
        Json,
        http::StatusCode,
        response::{IntoResponse, Response},
    };

    use super::{ErrorResponse, PaymentError};

    impl PaymentError {
        pub const fn status_code(&self) -> StatusCode {
            match self {
                Self::NotFound(_) => StatusCode::NOT_FOUND,
                Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
                Self::Upstream(_) => StatusCode::BAD_GATEWAY,
                Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                Self::Config(_) => StatusCode::SERVICE_UNAVAILABLE,
            }
        }
    }

    impl IntoResponse for PaymentError {
        fn into_response(self) -> Response {
            match &self {
                Self::InvalidRequest(_) | Self::NotFound(_) => {
                    tracing::warn!(error = %self, "Request rejected");
                }
                _ => tracing::error!(error = %self, "Request failed"),
            }
            (self.status_code(), Json(ErrorResponse::from(&self))).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(PaymentError::NotFound("cus_1".into()).kind(), ErrorKind::NotFound);
        assert_eq!(
            PaymentError::Timeout(Duration::from_secs(1)).kind(),
            ErrorKind::UpstreamFailure
        );
        assert!(PaymentError::Upstream("boom".into()).is_retryable());
        assert!(!PaymentError::InvalidRequest("bad".into()).is_retryable());
    }

    #[test]
    fn test_error_response_hides_upstream_detail() {
        let body = ErrorResponse::from(&PaymentError::Upstream("api key sk_live_x rejected".into()));
        assert_eq!(body.code, "UPSTREAM_ERROR");
        assert!(!body.error.contains("sk_live"));

        let body = ErrorResponse::from(&PaymentError::InvalidRequest("Payment method unchanged".into()));
        assert_eq!(body.error, "Payment method unchanged");
    }
}
