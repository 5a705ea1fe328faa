use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("not authenticated: {0}")]
    Unauthorized(String),
    #[error("backend returned {status}: {detail}")]
    Status { status: StatusCode, detail: String },
    #[error("backend rejected request: {0}")]
    Rejected(String),
    #[error("unexpected payload: {0}")]
    Payload(String),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// The session is gone or was never established; callers should show the login view.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }

    /// Failures a user retry can plausibly fix. Nothing retries automatically.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Transport(_) => true,
            ApiError::Status { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }
}
