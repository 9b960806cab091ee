use reqwest::StatusCode;

/// App-wide error type. Every fallible function returns `Result<T, AppError>`.
///
/// The synchronizer turns these into the `last_error` banner text via
/// `Display`, so service-reported failures render as the raw response body.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The request never produced a response (DNS, refused connection, reset).
    #[error("Network error: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("{}", service_message(.status, .body))]
    Service { status: StatusCode, body: String },

    /// Success status, but the body did not match the expected shape.
    #[error("Unexpected response from service: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn service_message(status: &StatusCode, body: &str) -> String {
    if body.trim().is_empty() {
        format!("Request failed with status {}", status.as_u16())
    } else {
        body.to_string()
    }
}

impl AppError {
    /// Stable tag for structured log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Transport(_) => "transport",
            AppError::Service { .. } => "service",
            AppError::Decode(_) => "decode",
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_displays_body_verbatim() {
        let err = AppError::Service {
            status: StatusCode::TOO_MANY_REQUESTS,
            body: "rate limited".into(),
        };
        assert_eq!(err.to_string(), "rate limited");
        assert_eq!(err.kind(), "service");
    }

    #[test]
    fn test_service_error_with_empty_body_falls_back_to_status() {
        let err = AppError::Service {
            status: StatusCode::BAD_GATEWAY,
            body: "  ".into(),
        };
        assert_eq!(err.to_string(), "Request failed with status 502");
    }

    #[test]
    fn test_transport_error_is_prefixed() {
        let err = AppError::Transport("connection refused".into());
        assert_eq!(err.to_string(), "Network error: connection refused");
        assert_eq!(err.kind(), "transport");
    }
}
