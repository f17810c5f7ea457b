// src/error.rs
use serde_json::Value;
use std::fmt;

use crate::validator::{fields_from_422, FieldError};

// ==================== ERROR DETAIL ====================

/// Server-provided error payload: either a plain message or the structured
/// `detail` object (`{"code": "EMAIL_EXISTS"}`, a 422 `loc` list, ...).
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorDetail {
    Message(String),
    Structured(Value),
}

impl ErrorDetail {
    /// Parses a response body. JSON bodies are unwrapped from `{"detail": ...}`,
    /// anything else is kept as trimmed text.
    pub fn from_body(body: &str) -> Self {
        match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(mut map)) => match map.remove("detail") {
                Some(Value::String(message)) => ErrorDetail::Message(message),
                Some(detail) => ErrorDetail::Structured(detail),
                None => ErrorDetail::Structured(Value::Object(map)),
            },
            Ok(Value::String(message)) => ErrorDetail::Message(message),
            Ok(other) => ErrorDetail::Structured(other),
            Err(_) => ErrorDetail::Message(body.trim().to_string()),
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            ErrorDetail::Structured(value) => value.get("code").and_then(Value::as_str),
            ErrorDetail::Message(_) => None,
        }
    }
}

impl fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorDetail::Message(message) => write!(f, "{}", message),
            ErrorDetail::Structured(value) => match self.code() {
                Some(code) => write!(f, "{}", code),
                None => write!(f, "{}", value),
            },
        }
    }
}

// ==================== API ERROR ====================

#[derive(Debug)]
pub enum ApiError {
    /// The request never produced an HTTP response.
    Transport(String),
    /// Non-2xx response.
    Status { status: u16, detail: ErrorDetail },
    /// 2xx response whose body did not match the expected shape.
    Decode(String),
    Validation(Vec<FieldError>),
    /// 401 that survived a refresh attempt.
    SessionExpired,
    NotFound(String),
    InvalidInput(String),
    Io(std::io::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ApiError::Transport(msg) => write!(f, "Transport Error: {}", msg),
            ApiError::Status { status, detail } => write!(f, "HTTP {}: {}", status, detail),
            ApiError::Decode(msg) => write!(f, "Decode Error: {}", msg),
            ApiError::Validation(errors) => {
                let fields = errors
                    .iter()
                    .map(|e| format!("{}: {}", e.field, e.kind))
                    .collect::<Vec<_>>()
                    .join("; ");
                write!(f, "Validation Error: {}", fields)
            }
            ApiError::SessionExpired => write!(f, "Session expired, please log in again"),
            ApiError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            ApiError::InvalidInput(msg) => write!(f, "Invalid Input: {}", msg),
            ApiError::Io(err) => write!(f, "IO Error: {}", err),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::Io(err)
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::Validation(crate::validator::fields_from_validation_errors(&err))
    }
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::SessionExpired => Some(401),
            _ => None,
        }
    }

    /// Structured `detail.code` of a server error, used by callers to pick a
    /// localized message.
    pub fn code(&self) -> Option<&str> {
        match self {
            ApiError::Status { detail, .. } => detail.code(),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }

    /// Per-field errors: local validation failures, or a 422 response's `loc` list.
    pub fn field_errors(&self) -> Vec<FieldError> {
        match self {
            ApiError::Validation(errors) => errors.clone(),
            ApiError::Status { status: 422, detail } => fields_from_422(detail),
            _ => Vec::new(),
        }
    }

    pub fn reagent_not_found(id: &str) -> Self {
        ApiError::NotFound(format!("Reagent with ID '{}' not found", id))
    }

    pub fn experiment_not_found(id: &str) -> Self {
        ApiError::NotFound(format!("Experiment with ID '{}' not found", id))
    }

    pub fn user_not_found(id: i64) -> Self {
        ApiError::NotFound(format!("User with ID '{}' not found", id))
    }

    pub fn accident_not_found(id: i64) -> Self {
        ApiError::NotFound(format!("Accident with ID '{}' not found", id))
    }

    pub fn no_experiment_selected() -> Self {
        ApiError::InvalidInput("No experiment is selected".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detail_from_json_string() {
        let detail = ErrorDetail::from_body(r#"{"detail": "User not found"}"#);
        assert_eq!(detail, ErrorDetail::Message("User not found".to_string()));
        assert_eq!(detail.code(), None);
    }

    #[test]
    fn test_detail_from_structured_code() {
        let detail = ErrorDetail::from_body(r#"{"detail": {"code": "EMAIL_EXISTS"}}"#);
        assert_eq!(detail.code(), Some("EMAIL_EXISTS"));
        assert_eq!(detail.to_string(), "EMAIL_EXISTS");
    }

    #[test]
    fn test_detail_from_plain_text() {
        let detail = ErrorDetail::from_body("Internal Server Error\n");
        assert_eq!(detail, ErrorDetail::Message("Internal Server Error".to_string()));
    }

    #[test]
    fn test_detail_without_detail_key_keeps_body() {
        let detail = ErrorDetail::from_body(r#"{"error": "boom"}"#);
        assert_eq!(detail, ErrorDetail::Structured(json!({"error": "boom"})));
    }

    #[test]
    fn test_api_error_code_and_status() {
        let err = ApiError::Status {
            status: 403,
            detail: ErrorDetail::Structured(json!({"code": "CSRF_MISSING"})),
        };
        assert_eq!(err.status(), Some(403));
        assert_eq!(err.code(), Some("CSRF_MISSING"));
        assert_eq!(err.to_string(), "HTTP 403: CSRF_MISSING");
        assert_eq!(ApiError::SessionExpired.status(), Some(401));
    }
}
