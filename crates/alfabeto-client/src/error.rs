//! API error types.

use thiserror::Error;

/// Errors that can occur when talking to the game API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The bearer token is missing, expired, or the credentials were wrong.
    #[error("not authorized: {0}")]
    Unauthorized(String),

    /// The requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    Network(String),

    /// The response body could not be decoded.
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// Whether retrying the same request cannot succeed.
    pub fn is_permanent(&self) -> bool {
        match self {
            ApiError::Unauthorized(_) | ApiError::NotFound(_) | ApiError::Decode(_) => true,
            ApiError::Api { status, .. } => (400..500).contains(status) && *status != 429,
            ApiError::Timeout(_) | ApiError::Network(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_permanent_errors() {
        assert!(ApiError::Unauthorized("expired".into()).is_permanent());
        assert!(ApiError::Api {
            status: 422,
            message: String::new()
        }
        .is_permanent());
        assert!(!ApiError::Api {
            status: 429,
            message: String::new()
        }
        .is_permanent());
        assert!(!ApiError::Api {
            status: 503,
            message: String::new()
        }
        .is_permanent());
        assert!(!ApiError::Timeout(30).is_permanent());
        assert!(!ApiError::Network("refused".into()).is_permanent());
    }
}
