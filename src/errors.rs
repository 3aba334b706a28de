/// Error types for the Bitkub SDK.
///
/// Protocol failures (a non-zero `error` in the response envelope) surface as
/// [`ApiError`], whose message comes from the static catalog in
/// [`crate::error_codes`]. Transport failures are passed through untouched.
use std::fmt;

use thiserror::Error;

use crate::error_codes::error_message;

/// A non-zero `error` code returned inside the response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub code: i64,
    /// Optional extra context appended after the catalog message.
    pub detail: Option<String>,
}

impl ApiError {
    pub fn new(code: i64) -> Self {
        Self { code, detail: None }
    }

    pub fn with_detail(code: i64, detail: impl Into<String>) -> Self {
        Self {
            code,
            detail: Some(detail.into()),
        }
    }

    /// The catalog message for this code, or `Unknown error N`.
    pub fn message(&self) -> String {
        error_message(self.code)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.detail.as_deref() {
            Some(detail) if !detail.is_empty() => write!(f, "{}: {}", self.message(), detail),
            _ => f.write_str(&self.message()),
        }
    }
}

impl std::error::Error for ApiError {}

/// The primary error type for the Bitkub SDK.
#[derive(Error, Debug)]
pub enum BitkubError {
    // Protocol
    #[error(transparent)]
    Api(#[from] ApiError),

    // Authentication preconditions
    #[error("No credentials available for a signed request")]
    Unauthenticated,

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Environment variable not set: {0}")]
    EnvVarNotSet(String),

    // Decoding
    #[error("Failed to decode {context}: {message}")]
    Decode { context: String, message: String },

    // Transport
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Request cancelled")]
    Cancelled,

    #[error("Request timed out")]
    Timeout,

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    // Request construction
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl BitkubError {
    /// Build a decode error naming the field or endpoint that failed.
    pub fn decode(context: impl Into<String>, message: impl fmt::Display) -> Self {
        BitkubError::Decode {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Returns the envelope error code if this is a protocol error.
    pub fn error_code(&self) -> Option<i64> {
        match self {
            BitkubError::Api(err) => Some(err.code),
            _ => None,
        }
    }

    /// Returns true if the call was aborted by a cancellation token or deadline.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, BitkubError::Cancelled | BitkubError::Timeout)
    }
}

impl From<serde_json::Error> for BitkubError {
    fn from(err: serde_json::Error) -> Self {
        BitkubError::decode("JSON", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_renders_catalog_message() {
        let err = ApiError::new(18);
        assert_eq!(err.to_string(), "Insufficient balance");
        assert_eq!(err.message(), "Insufficient balance");
    }

    #[test]
    fn api_error_appends_detail() {
        let err = ApiError::with_detail(11, "THB_XYZ");
        assert_eq!(err.to_string(), "Invalid symbol: THB_XYZ");
    }

    #[test]
    fn unknown_code_does_not_fail() {
        let err = ApiError::new(9999);
        assert_eq!(err.to_string(), "Unknown error 9999");
    }

    #[test]
    fn wrapped_api_error_is_transparent() {
        let err = BitkubError::from(ApiError::new(6));
        assert_eq!(err.to_string(), "Missing / invalid signature");
        assert_eq!(err.error_code(), Some(6));
        assert!(!err.is_cancellation());
    }

    #[test]
    fn cancellation_kinds() {
        assert!(BitkubError::Cancelled.is_cancellation());
        assert!(BitkubError::Timeout.is_cancellation());
        assert_eq!(BitkubError::Unauthenticated.error_code(), None);
    }
}
