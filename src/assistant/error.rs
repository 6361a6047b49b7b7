//! Assistant error types with retry classification.
//!
//! Distinguishes between transient errors (should retry) and permanent errors
//! (should not retry). Either way the caller recovers locally with the
//! documented fallback value; nothing here is fatal.

use std::time::Duration;

/// Error from assistant API calls.
#[derive(Debug)]
pub struct AssistantError {
    /// The kind of error
    pub kind: AssistantErrorKind,
    /// HTTP status code, if applicable
    pub status_code: Option<u16>,
    /// Error message
    pub message: String,
    /// Suggested retry delay (from Retry-After header or calculated)
    pub retry_after: Option<Duration>,
}

impl AssistantError {
    /// Create a rate limit error.
    pub fn rate_limited(message: String, retry_after: Option<Duration>) -> Self {
        Self {
            kind: AssistantErrorKind::RateLimited,
            status_code: Some(429),
            message,
            retry_after,
        }
    }

    /// Create a server error.
    pub fn server_error(status_code: u16, message: String) -> Self {
        Self {
            kind: AssistantErrorKind::ServerError,
            status_code: Some(status_code),
            message,
            retry_after: None,
        }
    }

    /// Create a client error (bad request, auth, etc.).
    pub fn client_error(status_code: u16, message: String) -> Self {
        Self {
            kind: AssistantErrorKind::ClientError,
            status_code: Some(status_code),
            message,
            retry_after: None,
        }
    }

    /// Create a network error.
    pub fn network_error(message: String) -> Self {
        Self {
            kind: AssistantErrorKind::NetworkError,
            status_code: None,
            message,
            retry_after: None,
        }
    }

    /// Create a parse error.
    pub fn parse_error(message: String) -> Self {
        Self {
            kind: AssistantErrorKind::ParseError,
            status_code: None,
            message,
            retry_after: None,
        }
    }

    /// Check if this error is transient and should be retried.
    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }

    /// Get the suggested delay before retry.
    ///
    /// Returns the `retry_after` if set, otherwise an exponential backoff
    /// based on error kind, capped at 30 seconds.
    pub fn suggested_delay(&self, attempt: u32) -> Duration {
        if let Some(retry_after) = self.retry_after {
            return retry_after;
        }

        let base_delay = match self.kind {
            AssistantErrorKind::RateLimited => Duration::from_secs(5),
            AssistantErrorKind::ServerError => Duration::from_secs(2),
            _ => Duration::from_secs(1),
        };

        let multiplier = 2u64.saturating_pow(attempt);
        let delay_secs = base_delay.as_secs().saturating_mul(multiplier).min(30);

        Duration::from_secs(delay_secs)
    }
}

impl std::fmt::Display for AssistantError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "{} (HTTP {}): {}", self.kind, code, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for AssistantError {}

/// Classification of assistant errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssistantErrorKind {
    /// Rate limited (429) - transient, should retry with backoff
    RateLimited,
    /// Server error (500, 502, 503, 504) - transient, should retry
    ServerError,
    /// Client error (400, 401, 403, 404) - permanent, should not retry
    ClientError,
    /// Network error (connection failed, timeout) - transient, should retry
    NetworkError,
    /// Response parsing error - permanent
    ParseError,
}

impl AssistantErrorKind {
    /// Check if this error kind is transient (worth retrying).
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AssistantErrorKind::RateLimited
                | AssistantErrorKind::ServerError
                | AssistantErrorKind::NetworkError
        )
    }
}

impl std::fmt::Display for AssistantErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssistantErrorKind::RateLimited => write!(f, "Rate limited"),
            AssistantErrorKind::ServerError => write!(f, "Server error"),
            AssistantErrorKind::ClientError => write!(f, "Client error"),
            AssistantErrorKind::NetworkError => write!(f, "Network error"),
            AssistantErrorKind::ParseError => write!(f, "Parse error"),
        }
    }
}

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Maximum total time to spend retrying
    pub max_retry_duration: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            max_retry_duration: Duration::from_secs(45),
        }
    }
}

impl RetryConfig {
    /// Check if the given error should be retried based on this config.
    pub fn should_retry(&self, error: &AssistantError) -> bool {
        error.is_transient()
    }
}

/// Parse HTTP status code into error kind.
pub fn classify_http_status(status: u16) -> AssistantErrorKind {
    match status {
        429 => AssistantErrorKind::RateLimited,
        500 | 502 | 503 | 504 => AssistantErrorKind::ServerError,
        400..=499 => AssistantErrorKind::ClientError,
        _ => AssistantErrorKind::ServerError,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(AssistantErrorKind::RateLimited.is_transient());
        assert!(AssistantErrorKind::ServerError.is_transient());
        assert!(AssistantErrorKind::NetworkError.is_transient());
        assert!(!AssistantErrorKind::ClientError.is_transient());
        assert!(!AssistantErrorKind::ParseError.is_transient());
    }

    #[test]
    fn test_http_status_classification() {
        assert_eq!(classify_http_status(429), AssistantErrorKind::RateLimited);
        assert_eq!(classify_http_status(500), AssistantErrorKind::ServerError);
        assert_eq!(classify_http_status(503), AssistantErrorKind::ServerError);
        assert_eq!(classify_http_status(400), AssistantErrorKind::ClientError);
        assert_eq!(classify_http_status(401), AssistantErrorKind::ClientError);
    }

    #[test]
    fn test_exponential_backoff_is_capped() {
        let error = AssistantError::rate_limited("test".to_string(), None);

        let delay_0 = error.suggested_delay(0);
        let delay_1 = error.suggested_delay(1);
        assert!(delay_1 > delay_0);

        let delay_10 = error.suggested_delay(10);
        assert!(delay_10.as_secs() <= 30);
    }

    #[test]
    fn test_retry_after_respected() {
        let error =
            AssistantError::rate_limited("test".to_string(), Some(Duration::from_secs(12)));
        assert_eq!(error.suggested_delay(0), Duration::from_secs(12));
        assert_eq!(error.suggested_delay(5), Duration::from_secs(12));
    }
}
