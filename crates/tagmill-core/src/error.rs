//! Error types for tagmill.

use thiserror::Error;

/// Result type alias using tagmill's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for tagmill operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Backend client misconfigured or unreachable; surfaced, no retry.
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The prompt alone consumes the entire token budget; no backend call is made.
    #[error("Token budget exceeded: prompt needs {prompt_tokens} of {max_tokens} tokens with {reserved_tokens} reserved for the response")]
    BudgetExceeded {
        /// Tokens consumed by the assembled prompt.
        prompt_tokens: usize,
        /// Configured token ceiling.
        max_tokens: usize,
        /// Tokens reserved for the model response.
        reserved_tokens: usize,
    },

    /// The backend replied but without the expected message/content field.
    #[error("Invalid response shape: {0}")]
    InvalidResponseShape(String),

    /// Model output was not parseable as the expected JSON shape even after
    /// the salvage and sanitization passes. Callers degrade to an empty result.
    #[error("Malformed model output: {0}")]
    MalformedOutput(String),

    /// Supplied external context could not be sized or truncated; non-fatal,
    /// the context is simply omitted from the prompt.
    #[error("External data error: {0}")]
    ExternalData(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_backend_unavailable() {
        let err = Error::BackendUnavailable("missing API key".to_string());
        assert_eq!(err.to_string(), "Backend unavailable: missing API key");
    }

    #[test]
    fn test_error_display_budget_exceeded() {
        let err = Error::BudgetExceeded {
            prompt_tokens: 9000,
            max_tokens: 8000,
            reserved_tokens: 1000,
        };
        let msg = err.to_string();
        assert!(msg.contains("9000"));
        assert!(msg.contains("8000"));
        assert!(msg.contains("1000"));
    }

    #[test]
    fn test_error_display_invalid_response_shape() {
        let err = Error::InvalidResponseShape("no choices in response".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid response shape: no choices in response"
        );
    }

    #[test]
    fn test_error_display_malformed_output() {
        let err = Error::MalformedOutput("no JSON object found".to_string());
        assert_eq!(err.to_string(), "Malformed model output: no JSON object found");
    }

    #[test]
    fn test_error_display_external_data() {
        let err = Error::ExternalData("unserializable payload".to_string());
        assert_eq!(err.to_string(), "External data error: unserializable payload");
    }

    #[test]
    fn test_error_display_config() {
        let err = Error::Config("missing base URL".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing base URL");
    }

    #[test]
    fn test_error_display_request() {
        let err = Error::Request("network unreachable".to_string());
        assert_eq!(err.to_string(), "Request error: network unreachable");
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number");
        assert!(json_err.is_err());

        let err: Error = json_err.unwrap_err().into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: Error = io_err.into();
        match err {
            Error::Io(_) => {}
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_result_type_ok() {
        fn get_result() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(get_result().unwrap(), 42);
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }

    #[test]
    fn test_error_debug_format() {
        let err = Error::MalformedOutput("test".to_string());
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("MalformedOutput"));
    }
}
