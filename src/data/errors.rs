use thiserror::Error;

/// Error types for collection and persistence of BOK documents
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Parse error: {message}")]
    Parse { message: String },

    #[error("API error: {message} (status: {status_code})")]
    Api { status_code: u16, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Rate limit exceeded, retry after {retry_after} seconds")]
    RateLimit { retry_after: u64 },

    #[error("Timeout error: operation took longer than {timeout_seconds}s")]
    Timeout { timeout_seconds: u64 },

    #[error("Data validation error: {field} - {message}")]
    Validation { field: String, message: String },

    #[error("PDF extraction error: {0}")]
    Extraction(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for data operations
pub type DataResult<T> = Result<T, DataError>;

impl DataError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            DataError::Network(_) => true,
            DataError::RateLimit { .. } => true,
            DataError::Timeout { .. } => true,
            DataError::Api { status_code, .. } => {
                // Server errors (5xx) and rate limiting (429)
                *status_code >= 500 || *status_code == 429
            }
            _ => false,
        }
    }

    /// Error for a non-success HTTP status; 429 becomes `RateLimit`
    pub fn from_status<S: Into<String>>(status_code: u16, retry_after: Option<u64>, message: S) -> Self {
        if status_code == 429 {
            return DataError::RateLimit {
                retry_after: retry_after.unwrap_or(1),
            };
        }
        DataError::api_error(status_code, message)
    }

    /// Classify a transport error, separating client timeouts
    pub fn from_request(err: reqwest::Error, timeout_seconds: u64) -> Self {
        if err.is_timeout() {
            DataError::Timeout { timeout_seconds }
        } else {
            DataError::Network(err)
        }
    }

    /// Create a parse error with context
    pub fn parse_error<S: Into<String>>(message: S) -> Self {
        DataError::Parse {
            message: message.into(),
        }
    }

    /// Create a validation error with field context
    pub fn validation_error<S: Into<String>>(field: S, message: S) -> Self {
        DataError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an API error with status code
    pub fn api_error<S: Into<String>>(status_code: u16, message: S) -> Self {
        DataError::Api {
            status_code,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_errors_retry_on_server_side_only() {
        assert!(DataError::api_error(503, "unavailable").is_retryable());
        assert!(DataError::api_error(429, "slow down").is_retryable());
        assert!(!DataError::api_error(404, "missing").is_retryable());
    }

    #[test]
    fn test_status_429_maps_to_rate_limit() {
        let err = DataError::from_status(429, Some(7), "GET /x failed");
        assert!(matches!(err, DataError::RateLimit { retry_after: 7 }));
        assert!(err.is_retryable());

        let err = DataError::from_status(429, None, "GET /x failed");
        assert!(matches!(err, DataError::RateLimit { retry_after: 1 }));

        let err = DataError::from_status(404, Some(7), "GET /x failed");
        assert!(matches!(err, DataError::Api { status_code: 404, .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_parse_errors_are_not_retryable() {
        let err = DataError::parse_error("no table");
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("no table"));
    }
}
