use thiserror::Error;

/// Application-wide error types.
///
/// This enum represents all errors that can occur while talking to the content
/// API or preparing records for it. It uses the `thiserror` crate for ergonomic
/// error handling and automatic conversion from underlying library errors.
///
/// # Error Conversion
///
/// - `serde_json::Error` → `AppError::SerializationError`
/// - `url::ParseError` → `AppError::InvalidUrl`
///
/// # Examples
///
/// ```
/// use polyshape_core::error::AppError;
///
/// let err = AppError::Http { status: 404, message: "Not found".to_string() };
/// assert_eq!(err.to_string(), "Not found");
/// assert_eq!(err.status(), Some(404));
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// HTTP client request failed before a response was received.
    #[error("API Client error: {0}")]
    ClientError(String),

    /// The server answered with a non-success status.
    ///
    /// `message` is the server-provided `message`/`error` field when the body
    /// carried one, otherwise `HTTP <status>`.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// JSON serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A detail document did not have the expected shape.
    #[error("Invalid detail schema")]
    InvalidDetail,

    /// Network or connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Request timeout.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// The request was aborted through its signal.
    ///
    /// Callers treat this as a silent no-op rather than a failure.
    #[error("Request aborted")]
    Cancelled,

    /// Configuration file could not be read or is inconsistent.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic application error for cases not covered by specific variants.
    #[error("{0}")]
    Generic(String),
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::InvalidUrl(err.to_string())
    }
}

impl AppError {
    /// Builds the error for a non-success response, preferring a server message.
    pub fn from_status(status: u16, message: Option<String>) -> Self {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("HTTP {}", status));
        AppError::Http { status, message }
    }

    /// HTTP status of the failed response, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true if the error only signals an aborted request.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AppError::Cancelled)
    }

    /// Returns a user-friendly error message suitable for CLI output.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Http { status: 401, .. } | AppError::Http { status: 403, .. } => {
                format!(
                    "{}\n   Your session token was rejected. Sign in again and set POLYSHAPE_TOKEN.",
                    self
                )
            }
            AppError::ClientError(msg) => {
                if msg.contains("timeout") || msg.contains("timed out") {
                    "Request timed out. The API may be slow or unreachable.".to_string()
                } else if msg.contains("connect") {
                    format!(
                        "Cannot connect to API: {}\n   Check your connection and the API root.",
                        msg
                    )
                } else {
                    format!("API error: {}", msg)
                }
            }
            AppError::NetworkError(msg) => {
                format!("Network error: {}\n   Check your internet connection.", msg)
            }
            AppError::Timeout(secs) => {
                format!(
                    "Request timed out after {} seconds.\n   The server may be overloaded. Try again later.",
                    secs
                )
            }
            AppError::InvalidUrl(url) => {
                format!("Invalid URL: {}\n   Example: https://example.com/api", url)
            }
            AppError::ConfigError(msg) => {
                format!("Configuration error: {}\n   Check your config.toml.", msg)
            }
            _ => self.to_string(),
        }
    }
}

/// Renders an error for display with its hint, falling back to a fixed
/// message when the error carries no text of its own.
pub fn failure_message(err: &AppError, fallback: &str) -> String {
    let message = err.user_message();
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_display_uses_message() {
        let err = AppError::from_status(500, Some("Disk full".to_string()));
        assert_eq!(err.to_string(), "Disk full");
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn test_http_error_falls_back_to_status() {
        let err = AppError::from_status(404, None);
        assert_eq!(err.to_string(), "HTTP 404");

        let err = AppError::from_status(502, Some("   ".to_string()));
        assert_eq!(err.to_string(), "HTTP 502");
    }

    #[test]
    fn test_invalid_detail_display() {
        assert_eq!(AppError::InvalidDetail.to_string(), "Invalid detail schema");
    }

    #[test]
    fn test_cancelled() {
        assert!(AppError::Cancelled.is_cancelled());
        assert!(!AppError::Timeout(30).is_cancelled());
    }

    #[test]
    fn test_failure_message_fallback() {
        let err = AppError::Generic(String::new());
        assert_eq!(failure_message(&err, "Failed to load"), "Failed to load");

        let err = AppError::Generic("boom".to_string());
        assert_eq!(failure_message(&err, "Failed to load"), "boom");
    }

    #[test]
    fn test_failure_message_keeps_token_hint() {
        let err = AppError::from_status(403, Some("Forbidden".to_string()));
        let message = failure_message(&err, "Failed to load");
        assert!(message.starts_with("Forbidden"));
        assert!(message.contains("POLYSHAPE_TOKEN"));
    }

    #[test]
    fn test_user_message_unauthorized() {
        let err = AppError::from_status(401, Some("Unauthorized".to_string()));
        assert!(err.user_message().contains("POLYSHAPE_TOKEN"));
    }

    #[test]
    fn test_error_from_serde() {
        let result: Result<serde_json::Value, _> = serde_json::from_str("{ invalid json }");
        let app_err: AppError = result.unwrap_err().into();
        assert!(matches!(app_err, AppError::SerializationError(_)));
    }

    #[test]
    fn test_error_from_url_parse() {
        let err: AppError = url::Url::parse("not a url").unwrap_err().into();
        assert!(err.to_string().starts_with("Invalid URL"));
    }

    #[test]
    fn test_timeout_error() {
        let err = AppError::Timeout(30);
        assert_eq!(err.to_string(), "Request timed out after 30 seconds");
    }
}
