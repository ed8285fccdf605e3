use thiserror::Error;

/// Errors from the comment mutation service.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Network-level failure (connection, DNS)
    #[error("network error: {0}")]
    Network(String),
    /// HTTP error response (4xx, 5xx)
    #[error("HTTP {0}: {1}")]
    HttpStatus(u16, String),
    /// Failed to parse response
    #[error("failed to parse response: {0}")]
    Parse(String),
    /// The request was rejected before being sent
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// No service is configured for this operation
    #[error("{0} is not available")]
    Unsupported(&'static str),
}

impl ApiError {
    /// Returns a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(details) => {
                if details.contains("dns") || details.contains("resolve") {
                    "Network error: Could not reach server.".into()
                } else {
                    format!("Network error: {details}")
                }
            }
            Self::HttpStatus(401 | 403, _) => "Not allowed. Are you logged in?".into(),
            Self::HttpStatus(404, _) => "Comment not found.".into(),
            Self::HttpStatus(429, _) => "Rate limited. Please wait a moment.".into(),
            Self::HttpStatus(500..=599, _) => "Server error. Please try again later.".into(),
            Self::HttpStatus(code, msg) => format!("HTTP error {code}: {msg}"),
            Self::Parse(details) => format!("Failed to parse response: {details}"),
            Self::InvalidRequest(details) => format!("Invalid request: {details}"),
            Self::Unsupported(operation) => {
                format!("Commenting is not configured ({operation} unavailable).")
            }
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            Self::Network("connection failed".into())
        } else if err.is_decode() {
            Self::Parse(err.to_string())
        } else if let Some(status) = err.status() {
            Self::HttpStatus(
                status.as_u16(),
                status.canonical_reason().unwrap_or("").into(),
            )
        } else {
            Self::Network(err.to_string())
        }
    }
}
