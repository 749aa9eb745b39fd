//! Common error type and result alias.
//!
//! Remote failures keep whatever human-readable message the service gave us so
//! the workflow can surface it verbatim; transport failures stay opaque.
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("{0}")]
    Gemini(String),

    /// A remote call failed; `message` is present only when the service said why.
    #[error("remote service failure: {}", .message.as_deref().unwrap_or("<no message>"))]
    Service { message: Option<String> },

    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("content blocked: {0}")]
    ContentBlocked(String),

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("prompt construction error: {0}")]
    PromptConstruction(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Message suitable for showing to the user, if the failure carried one.
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::HttpClient(_) | Self::Io(_) => None,
            Self::Service { message } => message.clone().filter(|m| !m.trim().is_empty()),
            Self::Gemini(msg) | Self::ContentBlocked(msg) | Self::UnexpectedResponse(msg) => {
                Some(msg.clone())
            }
            Self::RateLimited { .. } => Some("Too many requests. Try again in a moment.".to_string()),
            other => Some(other.to_string()),
        }
    }
}

pub type AppResult<T> = std::result::Result<T, AppError>;

/// Trims an API error body down to something fit for a log line or a user.
pub fn sanitize_error_message(text: &str) -> String {
    const MAX: usize = 300;
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Some(msg) = value
            .pointer("/error/message")
            .and_then(|m| m.as_str())
        {
            return msg.to_string();
        }
    }
    if trimmed.chars().count() > MAX {
        let cut: String = trimmed.chars().take(MAX).collect();
        format!("{}...", cut)
    } else {
        trimmed.to_string()
    }
}

/// Parses a `Retry-After` header given in whole seconds.
pub fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_message_passes_through() {
        let err = AppError::Service { message: Some("quota exceeded".into()) };
        assert_eq!(err.user_message().as_deref(), Some("quota exceeded"));
    }

    #[test]
    fn blank_service_message_counts_as_missing() {
        let err = AppError::Service { message: Some("   ".into()) };
        assert_eq!(err.user_message(), None);
        assert_eq!(AppError::Service { message: None }.user_message(), None);
    }

    #[test]
    fn io_errors_are_opaque() {
        let err = AppError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
        assert_eq!(err.user_message(), None);
    }

    #[test]
    fn sanitize_prefers_api_error_message() {
        let body = r#"{"error":{"code":400,"message":"Image too large","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(sanitize_error_message(body), "Image too large");
    }

    #[test]
    fn sanitize_truncates_long_bodies() {
        let body = "x".repeat(1000);
        let out = sanitize_error_message(&body);
        assert_eq!(out.len(), 303);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn retry_after_parses_seconds() {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(reqwest::header::RETRY_AFTER, "17".parse().unwrap());
        assert_eq!(parse_retry_after(&headers), Some(17));
    }
}
