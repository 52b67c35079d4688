// src/error.rs

use std::fmt;

/// Global Application Error Enum.
/// Centralizes error handling for the API client, the controller and the runner.
#[derive(Debug)]
pub enum AppError {
    // Transport failure (connection refused, DNS, TLS, ...)
    Network(String),

    // Non-2xx response from the backend
    Api { status: u16, message: String },

    // Response body could not be decoded
    Decode(String),

    // Test is not assigned to the user, or the assignment check rejected it
    Assignment(String),

    // Command issued while the exam is in a state that does not accept it
    InvalidState(String),

    // Missing or malformed configuration
    Config(String),

    // Unreadable or expired bearer token
    Auth(String),

    // Camera stream could not be opened
    Camera(String),

    // Local I/O (stdin, log directory)
    Io(String),
}

impl AppError {
    /// Returns true for 4xx responses from the backend.
    pub fn is_client_error(&self) -> bool {
        matches!(self, AppError::Api { status, .. } if (400..500).contains(status))
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Network(msg) => write!(f, "network error: {}", msg),
            AppError::Api { status, message } => write!(f, "api error ({}): {}", status, message),
            AppError::Decode(msg) => write!(f, "decode error: {}", msg),
            AppError::Assignment(msg) => write!(f, "assignment error: {}", msg),
            AppError::InvalidState(msg) => write!(f, "invalid state: {}", msg),
            AppError::Config(msg) => write!(f, "config error: {}", msg),
            AppError::Auth(msg) => write!(f, "auth error: {}", msg),
            AppError::Camera(msg) => write!(f, "camera error: {}", msg),
            AppError::Io(msg) => write!(f, "io error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// Converts `reqwest::Error` into `AppError`.
/// Status errors keep their code so callers can tell 4xx from transport failures.
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return AppError::Decode(err.to_string());
        }
        match err.status() {
            Some(status) => AppError::Api {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None => AppError::Network(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Decode(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        AppError::Auth(err.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classification() {
        let not_found = AppError::Api {
            status: 404,
            message: "Test not found".to_string(),
        };
        let server = AppError::Api {
            status: 500,
            message: "Internal server error".to_string(),
        };

        assert!(not_found.is_client_error());
        assert!(!server.is_client_error());
        assert!(!AppError::Network("refused".to_string()).is_client_error());
    }

    #[test]
    fn test_display_includes_status() {
        let err = AppError::Api {
            status: 403,
            message: "Test not assigned".to_string(),
        };
        assert_eq!(err.to_string(), "api error (403): Test not assigned");
    }
}
